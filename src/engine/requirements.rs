// ABOUTME: Requirement planning over the recipe path and the legacy child-product path
// ABOUTME: Tags each requirement with its data source so units are reconciled at read time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Ingredient requirements
//!
//! The recipe path takes its unit of truth from the ingredient's canonical
//! unit. Legacy child entries store their own unit, which may disagree with
//! the referenced product. Stored records are never rewritten; the mismatch
//! is reconciled here when requirements and breakdowns are built.

use std::collections::HashMap;

use prepline_core::constants::units::QUANTITY_EPSILON;
use prepline_core::errors::{KitchenError, Shortfall};
use prepline_core::units::normalize_unit;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{storage, CompositeEngine};
use crate::costing::{self, RequiredIngredient};
use crate::models::{ChildProduct, CompositeInfo, IngredientUsage, Product, UsageSource};
use crate::store::{DeductionTarget, StockDeduction};

/// One thing a preparation consumes
#[derive(Debug, Clone, PartialEq)]
pub enum IngredientRequirement {
    /// Raw ingredient via the linked recipe, in the ingredient's canonical unit
    RecipeSourced {
        /// Scaled requirement
        required: RequiredIngredient,
        /// Recipe batches it was scaled to
        recipe_batches_needed: u32,
    },
    /// Another product's stock via a child entry
    LegacySourced {
        /// Child product id
        product_id: Uuid,
        /// Child product name
        name: String,
        /// Amount needed, in `unit`
        needed: f64,
        /// Entry unit as stored, or the child product's unit when absent
        unit: String,
        /// `needed` converted into the child product's stock unit
        needed_in_stock_unit: f64,
        /// Child product's stock unit
        stock_unit: String,
        /// Child stock on hand, in `stock_unit`
        available: f64,
        /// Cost of `needed`
        cost: f64,
        /// The entry relied on legacy defaults
        is_legacy_data: bool,
    },
}

impl IngredientRequirement {
    /// Ingredient or child product id
    #[must_use]
    pub const fn source_id(&self) -> Uuid {
        match self {
            Self::RecipeSourced { required, .. } => required.ingredient_id,
            Self::LegacySourced { product_id, .. } => *product_id,
        }
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::RecipeSourced { required, .. } => &required.name,
            Self::LegacySourced { name, .. } => name,
        }
    }

    /// Amount needed, in [`IngredientRequirement::unit`]
    #[must_use]
    pub const fn needed(&self) -> f64 {
        match self {
            Self::RecipeSourced { required, .. } => required.amount_needed,
            Self::LegacySourced { needed, .. } => *needed,
        }
    }

    /// Unit shown to callers
    #[must_use]
    pub fn unit(&self) -> &str {
        match self {
            Self::RecipeSourced { required, .. } => &required.unit,
            Self::LegacySourced { unit, .. } => unit,
        }
    }

    /// Unit the stock (and any shortfall) is expressed in
    #[must_use]
    pub fn stock_unit(&self) -> &str {
        match self {
            Self::RecipeSourced { required, .. } => &required.unit,
            Self::LegacySourced { stock_unit, .. } => stock_unit,
        }
    }

    /// Stock on hand at planning time
    #[must_use]
    pub const fn available(&self) -> f64 {
        match self {
            Self::RecipeSourced { required, .. } => required.available,
            Self::LegacySourced { available, .. } => *available,
        }
    }

    /// Cost of the amount consumed
    #[must_use]
    pub const fn cost(&self) -> f64 {
        match self {
            Self::RecipeSourced { required, .. } => required.cost,
            Self::LegacySourced { cost, .. } => *cost,
        }
    }

    /// Whether the figures rely on legacy defaults
    #[must_use]
    pub const fn is_legacy_data(&self) -> bool {
        match self {
            Self::RecipeSourced { .. } => false,
            Self::LegacySourced { is_legacy_data, .. } => *is_legacy_data,
        }
    }

    /// Missing amount, expressed in the stock unit, if stock cannot cover it
    #[must_use]
    pub fn shortfall(&self) -> Option<Shortfall> {
        match self {
            Self::RecipeSourced { required, .. } => required.shortfall(),
            Self::LegacySourced {
                name,
                needed_in_stock_unit,
                stock_unit,
                available,
                ..
            } => (*available + QUANTITY_EPSILON < *needed_in_stock_unit).then(|| {
                Shortfall::new(name.clone(), *needed_in_stock_unit, *available, stock_unit.clone())
            }),
        }
    }

    /// Guarded write this requirement turns into
    #[must_use]
    pub const fn deduction(&self) -> StockDeduction {
        match self {
            Self::RecipeSourced { required, .. } => StockDeduction {
                target: DeductionTarget::Ingredient,
                id: required.ingredient_id,
                amount: required.amount_needed,
            },
            Self::LegacySourced {
                product_id,
                needed_in_stock_unit,
                ..
            } => StockDeduction {
                target: DeductionTarget::Product,
                id: *product_id,
                amount: *needed_in_stock_unit,
            },
        }
    }

    /// History line for this requirement
    #[must_use]
    pub fn usage(&self) -> IngredientUsage {
        IngredientUsage {
            source_id: self.source_id(),
            name: self.name().to_owned(),
            quantity: self.needed(),
            unit: self.unit().to_owned(),
            cost: self.cost(),
            source: match self {
                Self::RecipeSourced { .. } => UsageSource::Recipe,
                Self::LegacySourced { .. } => UsageSource::ChildProduct,
            },
            is_legacy_data: self.is_legacy_data(),
        }
    }
}

/// Everything one preparation consumes
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementPlan {
    /// Recipe batches (recipe path) or prepared batches (legacy path)
    pub recipe_batches: u32,
    /// Requirements in recipe or child order
    pub requirements: Vec<IngredientRequirement>,
}

impl RequirementPlan {
    /// Every requirement stock cannot cover
    #[must_use]
    pub fn shortfalls(&self) -> Vec<Shortfall> {
        self.requirements
            .iter()
            .filter_map(IngredientRequirement::shortfall)
            .collect()
    }

    /// Sum of requirement costs
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.requirements.iter().map(IngredientRequirement::cost).sum()
    }

    /// Whether any requirement relies on legacy defaults
    #[must_use]
    pub fn is_legacy_data(&self) -> bool {
        self.requirements
            .iter()
            .any(IngredientRequirement::is_legacy_data)
    }
}

/// Where a breakdown entry's unit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSource {
    /// Canonical unit of the matching recipe ingredient
    Recipe,
    /// Unit stored on the child entry
    Stored,
    /// Child product's own unit (legacy default)
    ProductDefault,
}

/// One child entry with its effective portion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildBreakdown {
    /// Child product id
    pub product_id: Uuid,
    /// Child product name
    pub name: String,
    /// Effective quantity per serving
    pub quantity_per_serving: f64,
    /// Effective unit
    pub unit: String,
    /// Where `unit` came from
    pub unit_source: UnitSource,
    /// Unit stored on the entry, if any
    pub stored_unit: Option<String>,
    /// Entry predates per-serving fields
    pub is_legacy_data: bool,
}

fn invalid_child(product: &Product, child_id: Uuid, reason: impl Into<String>) -> KitchenError {
    KitchenError::InvalidChildProductStructure {
        product_id: product.id,
        child_id,
        reason: reason.into(),
    }
}

impl CompositeEngine {
    pub(crate) async fn load_children(
        &self,
        info: &CompositeInfo,
    ) -> Result<HashMap<Uuid, Product>, KitchenError> {
        let ids: Vec<Uuid> = info
            .child_products
            .iter()
            .map(|child| child.product_id)
            .collect();
        Ok(self
            .store
            .get_products(&ids)
            .await
            .map_err(storage)?
            .into_iter()
            .map(|product| (product.id, product))
            .collect())
    }

    /// Plan everything `quantity_to_prepare` batches of `product` consume
    ///
    /// The recipe path is used whenever a recipe is linked; child entries are
    /// only consulted when it is not.
    ///
    /// # Errors
    ///
    /// Returns structure, lookup or unit errors; never mutates anything.
    pub async fn plan_requirements(
        &self,
        product: &Product,
        info: &CompositeInfo,
        quantity_to_prepare: u32,
    ) -> Result<RequirementPlan, KitchenError> {
        if let Some(recipe_id) = info.recipe_id {
            let (recipe, book) = self.load_recipe(recipe_id).await?;
            let recipe_batches = costing::recipe_batches_needed(
                product.id,
                info.capacity.quantity,
                quantity_to_prepare,
                &recipe,
            )?;
            let requirements =
                costing::required_ingredients(&recipe, recipe_batches, &book, &self.converter)?
                    .into_iter()
                    .map(|required| IngredientRequirement::RecipeSourced {
                        required,
                        recipe_batches_needed: recipe_batches,
                    })
                    .collect();
            return Ok(RequirementPlan {
                recipe_batches,
                requirements,
            });
        }

        if info.child_products.is_empty() {
            return Err(KitchenError::InvalidCompositeStructure {
                product_id: product.id,
                reason: "no recipe linked and no child products".into(),
            });
        }

        let children = self.load_children(info).await?;
        let servings = info.capacity.quantity * f64::from(quantity_to_prepare);
        let requirements = info
            .child_products
            .iter()
            .map(|entry| self.legacy_requirement(product, entry, &children, servings))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RequirementPlan {
            recipe_batches: quantity_to_prepare,
            requirements,
        })
    }

    fn legacy_requirement(
        &self,
        product: &Product,
        entry: &ChildProduct,
        children: &HashMap<Uuid, Product>,
        servings: f64,
    ) -> Result<IngredientRequirement, KitchenError> {
        let child = children
            .get(&entry.product_id)
            .ok_or(KitchenError::ChildProductNotFound {
                product_id: product.id,
                child_id: entry.product_id,
            })?;
        if child.is_composite() {
            return Err(invalid_child(
                product,
                child.id,
                "child entry references a composite product",
            ));
        }

        let portion = entry.portion();
        let per_serving = portion.quantity_per_serving();
        if !(per_serving.is_finite() && per_serving > 0.0) {
            return Err(invalid_child(
                product,
                child.id,
                format!("quantity per serving must be positive, got {per_serving}"),
            ));
        }

        let unit = portion
            .stored_unit()
            .map_or_else(|| child.unit.clone(), ToOwned::to_owned);
        let needed = per_serving * servings;
        let needed_in_stock_unit = if normalize_unit(&unit) == normalize_unit(&child.unit) {
            needed
        } else {
            self.converter
                .try_convert(needed, &unit, &child.unit)
                .map_err(|_| KitchenError::UnitIncompatible {
                    from: unit.clone(),
                    to: child.unit.clone(),
                    context: format!("child product '{}'", child.name),
                })?
        };
        let unit_cost = entry.cost_price.unwrap_or(child.cost_price);

        Ok(IngredientRequirement::LegacySourced {
            product_id: child.id,
            name: child.name.clone(),
            needed,
            unit,
            needed_in_stock_unit,
            stock_unit: child.unit.clone(),
            available: child.stock_quantity,
            cost: needed * unit_cost,
            is_legacy_data: portion.is_legacy(),
        })
    }

    /// Child entries with effective portions and reconciled units
    ///
    /// A child whose id matches an ingredient of the linked recipe reports that
    /// ingredient's canonical unit, whatever unit the entry stored.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound`, `ChildProductNotFound` or a recipe lookup error.
    pub async fn child_product_breakdown(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ChildBreakdown>, KitchenError> {
        let (product, info) = self.load_composite(product_id).await?;
        let recipe = match info.recipe_id {
            Some(recipe_id) => Some(self.load_recipe(recipe_id).await?),
            None => None,
        };
        let children = self.load_children(&info).await?;

        info.child_products
            .iter()
            .map(|entry| {
                let child =
                    children
                        .get(&entry.product_id)
                        .ok_or(KitchenError::ChildProductNotFound {
                            product_id: product.id,
                            child_id: entry.product_id,
                        })?;
                let portion = entry.portion();
                let recipe_unit = recipe.as_ref().and_then(|(recipe, book)| {
                    recipe.line_for(entry.product_id).map(|line| {
                        book.get(&line.ingredient_id)
                            .map_or_else(|| line.unit.clone(), |ingredient| ingredient.unit.clone())
                    })
                });
                let (unit, unit_source) = match (recipe_unit, portion.stored_unit()) {
                    (Some(unit), _) => (unit, UnitSource::Recipe),
                    (None, Some(stored)) => (stored.to_owned(), UnitSource::Stored),
                    (None, None) => (child.unit.clone(), UnitSource::ProductDefault),
                };
                Ok(ChildBreakdown {
                    product_id: child.id,
                    name: child.name.clone(),
                    quantity_per_serving: portion.quantity_per_serving(),
                    unit,
                    unit_source,
                    stored_unit: portion.stored_unit().map(ToOwned::to_owned),
                    is_legacy_data: portion.is_legacy(),
                })
            })
            .collect()
    }
}
