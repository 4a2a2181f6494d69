// ABOUTME: Domain models for ingredients, recipes, composite products and history rows
// ABOUTME: Shared value types (Measure, Operator) live here; entities live in submodules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Domain Models
//!
//! Stores, owners and users are opaque identifiers; only the entities the
//! preparation engine reasons about are modelled in full.

/// Audit trail rows
pub mod history;
/// Ingredients and recipes
pub mod inventory;
/// Products, composite info and legacy child entries
pub mod product;

pub use history::{
    BatchInfo, CostInfo, HistoryAction, HistoryRecord, IngredientUsage, UsageSource,
};
pub use inventory::{Ingredient, Recipe, RecipeIngredient};
pub use product::{ChildPortion, ChildProduct, CompositeInfo, Product};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A quantity together with the unit it is expressed in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    /// Amount
    pub quantity: f64,
    /// Unit symbol
    pub unit: String,
}

impl Measure {
    /// Create a measure
    #[must_use]
    pub fn new(quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            quantity,
            unit: unit.into(),
        }
    }

    /// Whether the amount is a finite, strictly positive number
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.quantity.is_finite() && self.quantity > 0.0
    }
}

/// Role of the person performing a stock action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OperatorRole {
    /// Store owner
    Owner,
    /// Shift or store manager
    Manager,
    /// Kitchen or counter staff
    #[default]
    Staff,
    /// Platform administrator
    Admin,
}

/// Who performed an action, as recorded in history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    /// Opaque user identifier
    pub user_id: Uuid,
    /// Display name at the time of the action
    pub username: String,
    /// Role at the time of the action
    pub role: OperatorRole,
}

impl Operator {
    /// Create an operator record
    #[must_use]
    pub fn new(user_id: Uuid, username: impl Into<String>, role: OperatorRole) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }
}
