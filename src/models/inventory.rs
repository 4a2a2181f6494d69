// ABOUTME: Raw-ingredient and recipe models consumed by the costing and preparation engines
// ABOUTME: Defines Ingredient, RecipeIngredient and Recipe with builder-style constructors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Measure;

/// Raw material tracked in a single canonical unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    /// Unique ingredient identifier
    pub id: Uuid,
    /// Owning store (opaque)
    pub store_id: Uuid,
    /// Display name
    pub name: String,
    /// Canonical unit stock is tracked in
    pub unit: String,
    /// Quantity on hand, never negative
    pub stock_quantity: f64,
    /// Cost of one canonical unit
    pub cost_per_unit: f64,
}

impl Ingredient {
    /// Create an ingredient with a fresh identifier
    #[must_use]
    pub fn new(
        store_id: Uuid,
        name: impl Into<String>,
        unit: impl Into<String>,
        stock_quantity: f64,
        cost_per_unit: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id,
            name: name.into(),
            unit: unit.into(),
            stock_quantity,
            cost_per_unit,
        }
    }
}

/// One line of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    /// Referenced ingredient
    pub ingredient_id: Uuid,
    /// Amount consumed by one recipe batch
    pub amount_used: f64,
    /// Unit `amount_used` is expressed in
    pub unit: String,
}

/// A formula producing `yield_` from its ingredient lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Unique recipe identifier
    pub id: Uuid,
    /// Owning store (opaque)
    pub store_id: Uuid,
    /// Dish name
    pub dish_name: String,
    /// Ordered ingredient lines
    pub ingredients: Vec<RecipeIngredient>,
    /// Output of one batch
    #[serde(rename = "yield")]
    pub yield_: Measure,
    /// Shelf life of the prepared dish
    pub expiry_hours: f64,
}

impl Recipe {
    /// Create a recipe with no ingredient lines
    #[must_use]
    pub fn new(
        store_id: Uuid,
        dish_name: impl Into<String>,
        yield_quantity: f64,
        yield_unit: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id,
            dish_name: dish_name.into(),
            ingredients: Vec::new(),
            yield_: Measure::new(yield_quantity, yield_unit),
            expiry_hours: 0.0,
        }
    }

    /// Add an ingredient line
    #[must_use]
    pub fn with_ingredient(
        mut self,
        ingredient_id: Uuid,
        amount_used: f64,
        unit: impl Into<String>,
    ) -> Self {
        self.ingredients.push(RecipeIngredient {
            ingredient_id,
            amount_used,
            unit: unit.into(),
        });
        self
    }

    /// Set the shelf life
    #[must_use]
    pub const fn with_expiry_hours(mut self, hours: f64) -> Self {
        self.expiry_hours = hours;
        self
    }

    /// Find the line for an ingredient, if the recipe uses it
    #[must_use]
    pub fn line_for(&self, ingredient_id: Uuid) -> Option<&RecipeIngredient> {
        self.ingredients
            .iter()
            .find(|line| line.ingredient_id == ingredient_id)
    }
}
