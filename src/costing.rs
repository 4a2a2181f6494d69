// ABOUTME: Recipe costing: per-yield cost, scaled ingredient requirements and availability
// ABOUTME: Normalises every recipe line into its ingredient's canonical unit before use
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Recipe Costing Engine
//!
//! Recipe lines may be written in any unit compatible with the referenced
//! ingredient. Everything this module returns is expressed in the ingredient's
//! canonical unit, so downstream comparisons only ever see one unit per
//! ingredient.

use std::collections::HashMap;

use prepline_core::constants::units::QUANTITY_EPSILON;
use prepline_core::errors::{KitchenError, Shortfall};
use prepline_core::units::{normalize_unit, UnitConverter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Ingredient, Product, Recipe, RecipeIngredient};

/// Ingredients keyed by id, as loaded for one recipe
pub type IngredientBook = HashMap<Uuid, Ingredient>;

/// Cost of one recipe batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCost {
    /// Cost of every ingredient line for one batch
    pub total_cost: f64,
    /// `total_cost / yield.quantity`
    pub cost_per_yield_unit: f64,
}

/// Amount of one ingredient needed for a number of recipe batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredIngredient {
    /// Ingredient id
    pub ingredient_id: Uuid,
    /// Ingredient name
    pub name: String,
    /// Amount needed, in `unit`
    pub amount_needed: f64,
    /// The ingredient's canonical unit
    pub unit: String,
    /// Stock on hand, in `unit`
    pub available: f64,
    /// `amount_needed × cost_per_unit`
    pub cost: f64,
}

impl RequiredIngredient {
    /// Missing amount if stock cannot cover the requirement
    #[must_use]
    pub fn shortfall(&self) -> Option<Shortfall> {
        (self.available + QUANTITY_EPSILON < self.amount_needed).then(|| {
            Shortfall::new(
                self.name.clone(),
                self.amount_needed,
                self.available,
                self.unit.clone(),
            )
        })
    }
}

/// An ingredient that cannot cover its requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingIngredient {
    /// Ingredient name
    pub name: String,
    /// Amount needed
    pub needed: f64,
    /// Amount on hand
    pub available: f64,
    /// Canonical unit of both figures
    pub unit: String,
}

/// Outcome of a recipe availability check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeAvailability {
    /// Whether every ingredient is covered
    pub can_prepare: bool,
    /// Every ingredient that falls short
    pub missing_ingredients: Vec<MissingIngredient>,
}

/// Where a cost roll-up came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSource {
    /// Live ingredient costs via the linked recipe
    Recipe,
    /// Price snapshots on child product entries
    ChildProducts,
}

/// Per-serving cost and price figures for a composite product
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRollup {
    /// Cost of the ingredients behind one serving
    pub cost_per_serving: f64,
    /// `cost_per_serving` rounded up to whole cents
    pub suggested_cost_price: f64,
    /// Retail price per serving
    pub retail_price: f64,
    /// `retail_price - cost_per_serving`
    pub margin: f64,
    /// Data path the figures came from
    pub source: CostSource,
    /// Figures rely on legacy child defaults
    pub is_legacy_data: bool,
}

impl PriceRollup {
    fn new(product: &Product, cost_per_serving: f64, source: CostSource, legacy: bool) -> Self {
        Self {
            cost_per_serving,
            suggested_cost_price: (cost_per_serving * 100.0).ceil() / 100.0,
            retail_price: product.retail_price,
            margin: product.retail_price - cost_per_serving,
            source,
            is_legacy_data: legacy,
        }
    }
}

/// Recipe batches needed to produce `capacity × quantity_to_prepare` servings
///
/// # Errors
///
/// Returns `KitchenError::InvalidCompositeStructure` if the yield is not positive.
pub fn recipe_batches_needed(
    product_id: Uuid,
    capacity: f64,
    quantity_to_prepare: u32,
    recipe: &Recipe,
) -> Result<u32, KitchenError> {
    if !recipe.yield_.is_positive() {
        return Err(KitchenError::InvalidCompositeStructure {
            product_id,
            reason: format!("recipe {} has a non-positive yield", recipe.id),
        });
    }
    let exact = capacity * f64::from(quantity_to_prepare) / recipe.yield_.quantity;
    let batches = (exact - QUANTITY_EPSILON).ceil().max(1.0);
    if batches > f64::from(u32::MAX) {
        return Err(KitchenError::InvalidCompositeStructure {
            product_id,
            reason: "recipe batch count overflows".into(),
        });
    }
    Ok(batches as u32)
}

fn lookup<'a>(
    recipe: &Recipe,
    line: &RecipeIngredient,
    ingredients: &'a IngredientBook,
) -> Result<&'a Ingredient, KitchenError> {
    ingredients
        .get(&line.ingredient_id)
        .ok_or(KitchenError::IngredientNotFound {
            recipe_id: recipe.id,
            ingredient_id: line.ingredient_id,
        })
}

/// Express a recipe line amount in the ingredient's canonical unit
///
/// Identical unit strings skip the converter, so an ingredient tracked in a
/// unit outside the allowed vocabulary can still be costed from matching lines.
///
/// # Errors
///
/// Returns `KitchenError::UnitIncompatible` when the line's unit cannot be
/// converted into the ingredient's unit.
pub fn line_amount_in_canonical(
    line: &RecipeIngredient,
    ingredient: &Ingredient,
    converter: &UnitConverter,
) -> Result<f64, KitchenError> {
    if normalize_unit(&line.unit) == normalize_unit(&ingredient.unit) {
        return Ok(line.amount_used);
    }
    converter
        .try_convert(line.amount_used, &line.unit, &ingredient.unit)
        .map_err(|_| KitchenError::UnitIncompatible {
            from: line.unit.clone(),
            to: ingredient.unit.clone(),
            context: format!("ingredient '{}'", ingredient.name),
        })
}

/// Total and per-yield-unit cost of one recipe batch
///
/// # Errors
///
/// Returns `KitchenError::IngredientNotFound` for a dangling line,
/// `KitchenError::UnitIncompatible` for an unconvertible unit, and
/// `KitchenError::InvalidRecipe` for a non-positive yield.
pub fn cost_of(
    recipe: &Recipe,
    ingredients: &IngredientBook,
    converter: &UnitConverter,
) -> Result<RecipeCost, KitchenError> {
    if !recipe.yield_.is_positive() {
        return Err(KitchenError::InvalidRecipe {
            recipe_id: recipe.id,
            reason: format!("yield must be positive, got {}", recipe.yield_.quantity),
        });
    }
    let mut total_cost = 0.0;
    for line in &recipe.ingredients {
        let ingredient = lookup(recipe, line, ingredients)?;
        total_cost += line_amount_in_canonical(line, ingredient, converter)? * ingredient.cost_per_unit;
    }
    Ok(RecipeCost {
        total_cost,
        cost_per_yield_unit: total_cost / recipe.yield_.quantity,
    })
}

/// Ingredient amounts for `recipe_batches` batches, in canonical units
///
/// # Errors
///
/// Returns `KitchenError::IngredientNotFound` or `KitchenError::UnitIncompatible`.
pub fn required_ingredients(
    recipe: &Recipe,
    recipe_batches: u32,
    ingredients: &IngredientBook,
    converter: &UnitConverter,
) -> Result<Vec<RequiredIngredient>, KitchenError> {
    let multiplier = f64::from(recipe_batches);
    recipe
        .ingredients
        .iter()
        .map(|line| {
            let ingredient = lookup(recipe, line, ingredients)?;
            let amount_needed = line_amount_in_canonical(line, ingredient, converter)? * multiplier;
            Ok(RequiredIngredient {
                ingredient_id: ingredient.id,
                name: ingredient.name.clone(),
                amount_needed,
                unit: ingredient.unit.clone(),
                available: ingredient.stock_quantity,
                cost: amount_needed * ingredient.cost_per_unit,
            })
        })
        .collect()
}

/// Compare every requirement against stock without mutating anything
///
/// # Errors
///
/// Same as [`required_ingredients`].
pub fn availability(
    recipe: &Recipe,
    recipe_batches: u32,
    ingredients: &IngredientBook,
    converter: &UnitConverter,
) -> Result<RecipeAvailability, KitchenError> {
    let missing_ingredients: Vec<MissingIngredient> =
        required_ingredients(recipe, recipe_batches, ingredients, converter)?
            .iter()
            .filter_map(RequiredIngredient::shortfall)
            .map(|shortfall| MissingIngredient {
                name: shortfall.name,
                needed: shortfall.needed,
                available: shortfall.available,
                unit: shortfall.unit,
            })
            .collect();
    Ok(RecipeAvailability {
        can_prepare: missing_ingredients.is_empty(),
        missing_ingredients,
    })
}

/// Per-serving roll-up from the linked recipe
///
/// Uses the ingredient cost actually consumed when one batch of `capacity`
/// servings is prepared, including the rounded-up recipe batch count.
///
/// # Errors
///
/// Same as [`cost_of`] and [`recipe_batches_needed`].
pub fn rollup_from_recipe(
    product: &Product,
    capacity: f64,
    recipe: &Recipe,
    ingredients: &IngredientBook,
    converter: &UnitConverter,
) -> Result<PriceRollup, KitchenError> {
    let cost = cost_of(recipe, ingredients, converter)?;
    let batches = recipe_batches_needed(product.id, capacity, 1, recipe)?;
    let cost_per_serving = cost.total_cost * f64::from(batches) / capacity;
    Ok(PriceRollup::new(
        product,
        cost_per_serving,
        CostSource::Recipe,
        false,
    ))
}

/// Per-serving roll-up from child product price snapshots
///
/// Entries without a cost snapshot fall back to the child product's current
/// cost price; legacy entries use the default quantity of one.
#[must_use]
pub fn rollup_from_children(product: &Product, children: &HashMap<Uuid, Product>) -> PriceRollup {
    let Some(info) = product.composite.as_ref() else {
        return PriceRollup::new(product, 0.0, CostSource::ChildProducts, false);
    };
    let mut legacy = false;
    let cost_per_serving = info
        .child_products
        .iter()
        .map(|child| {
            let portion = child.portion();
            legacy |= portion.is_legacy();
            let unit_cost = child
                .cost_price
                .or_else(|| children.get(&child.product_id).map(|p| p.cost_price))
                .unwrap_or(0.0);
            portion.quantity_per_serving() * unit_cost
        })
        .sum();
    PriceRollup::new(product, cost_per_serving, CostSource::ChildProducts, legacy)
}
