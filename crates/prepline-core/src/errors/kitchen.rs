// ABOUTME: Typed errors raised by the preparation, serving and costing engines
// ABOUTME: Carries structured detail (shortfalls, ranges, unit pairs) and converts into AppError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Kitchen Error Types
//!
//! Every business-rule failure is detected before any mutation, so these
//! variants describe rejected requests, never half-applied ones. The two
//! fault variants (`Storage`, `PreparationFailed`) are the only ones that
//! may leave the caller unsure about persisted state.

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use super::{AppError, ErrorCode};

/// One ingredient (or legacy child product) that cannot cover its requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    /// Display name of the ingredient
    pub name: String,
    /// Quantity required, in `unit`
    pub needed: f64,
    /// Quantity in stock, in `unit`
    pub available: f64,
    /// Unit both figures are expressed in
    pub unit: String,
    /// `needed - available`
    pub shortfall: f64,
}

impl Shortfall {
    /// Build a shortfall entry, deriving the missing amount
    #[must_use]
    pub fn new(name: impl Into<String>, needed: f64, available: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            needed,
            available,
            unit: unit.into(),
            shortfall: needed - available,
        }
    }
}

/// Errors produced by the composite-product engines
#[derive(Debug, Clone, Error)]
pub enum KitchenError {
    /// Capacity, recipe linkage or yield is malformed
    #[error("invalid composite structure for {product_id}: {reason}")]
    InvalidCompositeStructure {
        /// Product being operated on
        product_id: Uuid,
        /// What is wrong with it
        reason: String,
    },

    /// A recipe cannot be costed or scaled
    #[error("invalid recipe {recipe_id}: {reason}")]
    InvalidRecipe {
        /// Recipe being read
        recipe_id: Uuid,
        /// What is wrong with it
        reason: String,
    },

    /// Prepare quantity outside the configured range
    #[error("quantity to prepare {requested} is outside [{min}, {max}]")]
    InvalidQuantityToPrepare {
        /// Quantity the caller asked for
        requested: i64,
        /// Lower bound (always 1)
        min: u32,
        /// Configured upper bound
        max: u32,
    },

    /// Serve quantity is not a positive integer
    #[error("quantity to serve must be a positive integer, got {requested}")]
    InvalidQuantityToServe {
        /// Quantity the caller asked for
        requested: i64,
    },

    /// Waste/expire quantity is not a positive integer
    #[error("quantity to discard must be a positive integer, got {requested}")]
    InvalidQuantityToDiscard {
        /// Quantity the caller asked for
        requested: i64,
    },

    /// One or more ingredients cannot cover the requirement
    #[error("insufficient ingredients: {} item(s) short", .shortfalls.len())]
    InsufficientIngredients {
        /// Every ingredient that falls short, not just the first
        shortfalls: Vec<Shortfall>,
    },

    /// Not enough prepared servings
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Servings requested
        requested: u32,
        /// Servings available
        available: f64,
    },

    /// Stock has passed its shelf life
    #[error("product {product_id} expired {hours_elapsed:.2}h after preparation")]
    ProductExpired {
        /// Product being served
        product_id: Uuid,
        /// Hours since the last preparation
        hours_elapsed: f64,
        /// Configured shelf life
        expiry_hours: f64,
    },

    /// Unit symbol outside the allowed vocabulary
    #[error("unit '{unit}' is not allowed")]
    InvalidUnit {
        /// Offending unit
        unit: String,
    },

    /// Units measure different dimensions
    #[error("cannot compare '{from}' with '{to}'")]
    UnitIncompatible {
        /// Unit of the requirement
        from: String,
        /// Unit of the stock
        to: String,
        /// Entity whose data carries the mismatch
        context: String,
    },

    /// Conversion could not be performed
    #[error("cannot convert {quantity} from '{from}' to '{to}'")]
    ConversionFailed {
        /// Quantity being converted
        quantity: f64,
        /// Source unit
        from: String,
        /// Target unit
        to: String,
    },

    /// Composite product does not exist
    #[error("product {0} not found")]
    ProductNotFound(Uuid),

    /// Linked recipe does not exist
    #[error("recipe {0} not found")]
    RecipeNotFound(Uuid),

    /// Recipe line references a missing ingredient
    #[error("ingredient {ingredient_id} referenced by recipe {recipe_id} not found")]
    IngredientNotFound {
        /// Recipe carrying the reference
        recipe_id: Uuid,
        /// Missing ingredient
        ingredient_id: Uuid,
    },

    /// Legacy child product reference is dangling
    #[error("child product {child_id} of {product_id} not found")]
    ChildProductNotFound {
        /// Composite product
        product_id: Uuid,
        /// Missing child
        child_id: Uuid,
    },

    /// Legacy child product entry is malformed
    #[error("child product {child_id} of {product_id} is invalid: {reason}")]
    InvalidChildProductStructure {
        /// Composite product
        product_id: Uuid,
        /// Offending child
        child_id: Uuid,
        /// What is wrong with it
        reason: String,
    },

    /// Persistence layer fault outside a preparation commit
    #[error("storage failure: {0}")]
    Storage(String),

    /// Preparation commit failed unexpectedly
    #[error("failed to prepare composite product {product_id}: {reason}")]
    PreparationFailed {
        /// Product being prepared
        product_id: Uuid,
        /// Underlying fault
        reason: String,
    },
}

impl KitchenError {
    /// Machine-readable code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidCompositeStructure { .. } | Self::InvalidRecipe { .. } => {
                ErrorCode::InvalidCompositeStructure
            }
            Self::InvalidQuantityToPrepare { .. } => ErrorCode::InvalidQuantityToPrepare,
            Self::InvalidQuantityToServe { .. } => ErrorCode::InvalidQuantityToServe,
            Self::InvalidQuantityToDiscard { .. } => ErrorCode::InvalidQuantityToDiscard,
            Self::InsufficientIngredients { .. } => ErrorCode::InsufficientIngredients,
            Self::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            Self::ProductExpired { .. } => ErrorCode::ProductExpired,
            Self::InvalidUnit { .. } => ErrorCode::InvalidUnit,
            Self::UnitIncompatible { .. } => ErrorCode::UnitIncompatible,
            Self::ConversionFailed { .. } => ErrorCode::ConversionFailed,
            Self::ProductNotFound(_) => ErrorCode::ProductNotFound,
            Self::RecipeNotFound(_) => ErrorCode::RecipeNotFound,
            Self::IngredientNotFound { .. } => ErrorCode::IngredientNotFound,
            Self::ChildProductNotFound { .. } => ErrorCode::ChildProductNotFound,
            Self::InvalidChildProductStructure { .. } => ErrorCode::InvalidChildProductStructure,
            Self::Storage(_) => ErrorCode::StorageError,
            Self::PreparationFailed { .. } => ErrorCode::FailedToPrepareCompositeProduct,
        }
    }

    /// Whether this error is a business-rule rejection detected before any write
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::PreparationFailed { .. })
    }

    /// Structured payload rendered into `details` at the boundary
    #[must_use]
    pub fn details(&self) -> serde_json::Value {
        match self {
            Self::InsufficientIngredients { shortfalls } => json!(shortfalls),
            Self::InvalidQuantityToPrepare { requested, min, max } => {
                json!({ "requested": requested, "min": min, "max": max })
            }
            Self::InvalidQuantityToServe { requested }
            | Self::InvalidQuantityToDiscard { requested } => json!({ "requested": requested }),
            Self::InsufficientStock {
                requested,
                available,
            } => json!({ "requested": requested, "available": available }),
            Self::ProductExpired {
                hours_elapsed,
                expiry_hours,
                ..
            } => json!({ "hoursElapsed": hours_elapsed, "expiryHours": expiry_hours }),
            Self::UnitIncompatible { from, to, context } => {
                json!({ "from": from, "to": to, "context": context })
            }
            Self::ConversionFailed { quantity, from, to } => {
                json!({ "quantity": quantity, "from": from, "to": to })
            }
            Self::InvalidUnit { unit } => json!({ "unit": unit }),
            Self::ChildProductNotFound { child_id, .. } => json!({ "childProductId": child_id }),
            Self::InvalidChildProductStructure {
                child_id, reason, ..
            } => json!({ "childProductId": child_id, "reason": reason }),
            Self::IngredientNotFound { ingredient_id, .. } => {
                json!({ "ingredientId": ingredient_id })
            }
            Self::InvalidCompositeStructure { reason, .. } => json!({ "reason": reason }),
            Self::InvalidRecipe { recipe_id, reason } => {
                json!({ "recipeId": recipe_id, "reason": reason })
            }
            Self::ProductNotFound(_)
            | Self::RecipeNotFound(_)
            | Self::Storage(_)
            | Self::PreparationFailed { .. } => serde_json::Value::Null,
        }
    }

    fn resource_id(&self) -> Option<String> {
        match self {
            Self::InvalidCompositeStructure { product_id, .. }
            | Self::ProductExpired { product_id, .. }
            | Self::ChildProductNotFound { product_id, .. }
            | Self::InvalidChildProductStructure { product_id, .. }
            | Self::PreparationFailed { product_id, .. } => Some(product_id.to_string()),
            Self::ProductNotFound(id) | Self::RecipeNotFound(id) => Some(id.to_string()),
            Self::IngredientNotFound { recipe_id, .. } | Self::InvalidRecipe { recipe_id, .. } => {
                Some(recipe_id.to_string())
            }
            _ => None,
        }
    }
}

impl From<KitchenError> for AppError {
    fn from(error: KitchenError) -> Self {
        let mut app = Self::new(error.code(), error.to_string()).with_details(error.details());
        if let Some(resource_id) = error.resource_id() {
            app = app.with_resource_id(resource_id);
        }
        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortfall_derives_missing_amount() {
        let shortfall = Shortfall::new("meat", 4.5, 2.0, "kg");
        assert!((shortfall.shortfall - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_insufficient_ingredients_details_are_the_shortfall_list() {
        let error = KitchenError::InsufficientIngredients {
            shortfalls: vec![Shortfall::new("meat", 4.5, 2.0, "kg")],
        };
        let app = AppError::from(error);
        assert_eq!(app.code, ErrorCode::InsufficientIngredients);
        assert_eq!(app.context.details[0]["name"], "meat");
        assert_eq!(app.context.details[0]["shortfall"], 2.5);
    }

    #[test]
    fn test_fault_variants_are_not_rejections() {
        assert!(!KitchenError::Storage("disk".to_owned()).is_rejection());
        assert!(KitchenError::InvalidQuantityToServe { requested: 0 }.is_rejection());
    }
}
