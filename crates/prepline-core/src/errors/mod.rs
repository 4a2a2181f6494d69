// ABOUTME: Unified error handling with machine-readable codes and boundary response shapes
// ABOUTME: Defines ErrorCode, AppError, ErrorResponse and re-exports the typed KitchenError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Unified Error Handling System
//!
//! Engines return the typed [`KitchenError`]; anything that crosses the library
//! boundary is converted into an [`AppError`] carrying an [`ErrorCode`] and a
//! structured `details` payload, which [`ErrorResponse`] renders as
//! `{error: <code>, message, details?}`.

/// Typed errors raised by the composite-product engines
pub mod kitchen;

pub use kitchen::{KitchenError, Shortfall};

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Machine-readable error codes surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Structural / caller bugs
    /// Capacity or recipe linkage is malformed
    InvalidCompositeStructure,
    /// Legacy child product entry is malformed
    InvalidChildProductStructure,

    // Client input
    /// Prepare quantity outside `[1, max]`
    InvalidQuantityToPrepare,
    /// Serve quantity is not a positive integer
    InvalidQuantityToServe,
    /// Waste/expire quantity is not a positive integer
    InvalidQuantityToDiscard,
    /// Unit symbol outside the allowed vocabulary
    InvalidUnit,
    /// Generic malformed input
    InvalidInput,

    // Business-rule rejections
    /// One or more ingredients cannot cover the requirement
    InsufficientIngredients,
    /// Not enough servings in current stock
    InsufficientStock,
    /// Stock has passed its shelf life
    ProductExpired,

    // Data consistency
    /// Units belong to different measurement dimensions
    UnitIncompatible,
    /// Conversion could not be performed
    ConversionFailed,

    // Referential integrity
    /// Composite product does not exist
    ProductNotFound,
    /// Linked recipe does not exist
    RecipeNotFound,
    /// Recipe references a missing ingredient
    IngredientNotFound,
    /// Legacy child product reference is dangling
    ChildProductNotFound,

    // Configuration
    /// Engine policy failed validation
    ConfigInvalid,

    // System faults
    /// Persistence layer failed
    StorageError,
    /// Preparation commit failed unexpectedly
    FailedToPrepareCompositeProduct,
    /// Any other unexpected fault
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code an HTTP boundary should use for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidCompositeStructure
            | Self::InvalidChildProductStructure
            | Self::InvalidQuantityToPrepare
            | Self::InvalidQuantityToServe
            | Self::InvalidQuantityToDiscard
            | Self::InvalidUnit
            | Self::InvalidInput
            | Self::InsufficientIngredients
            | Self::InsufficientStock
            | Self::ProductExpired
            | Self::UnitIncompatible
            | Self::ConversionFailed => 400,

            Self::ProductNotFound
            | Self::RecipeNotFound
            | Self::IngredientNotFound
            | Self::ChildProductNotFound => 404,

            Self::ConfigInvalid
            | Self::StorageError
            | Self::FailedToPrepareCompositeProduct
            | Self::InternalError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidCompositeStructure => "The composite product structure is invalid",
            Self::InvalidChildProductStructure => "A child product entry is malformed",
            Self::InvalidQuantityToPrepare => "The quantity to prepare is out of range",
            Self::InvalidQuantityToServe => "The quantity to serve must be a positive integer",
            Self::InvalidQuantityToDiscard => "The quantity to discard must be a positive integer",
            Self::InvalidUnit => "The unit is not in the allowed vocabulary",
            Self::InvalidInput => "The provided input is invalid",
            Self::InsufficientIngredients => "Not enough ingredients in stock",
            Self::InsufficientStock => "Not enough prepared servings in stock",
            Self::ProductExpired => "The prepared stock has expired",
            Self::UnitIncompatible => "The units measure different dimensions",
            Self::ConversionFailed => "The quantity could not be converted",
            Self::ProductNotFound => "The product was not found",
            Self::RecipeNotFound => "The recipe was not found",
            Self::IngredientNotFound => "The ingredient was not found",
            Self::ChildProductNotFound => "A child product was not found",
            Self::ConfigInvalid => "Engine configuration is invalid",
            Self::StorageError => "Storage operation failed",
            Self::FailedToPrepareCompositeProduct => "Failed to prepare composite product",
            Self::InternalError => "An internal error occurred",
        }
    }

    /// Whether a caller may retry the same request without changing it
    ///
    /// Only system faults qualify, and even those should be investigated first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StorageError | Self::FailedToPrepareCompositeProduct | Self::InternalError
        )
    }

    /// Snake-case wire representation of this code
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCompositeStructure => "invalid_composite_structure",
            Self::InvalidChildProductStructure => "invalid_child_product_structure",
            Self::InvalidQuantityToPrepare => "invalid_quantity_to_prepare",
            Self::InvalidQuantityToServe => "invalid_quantity_to_serve",
            Self::InvalidQuantityToDiscard => "invalid_quantity_to_discard",
            Self::InvalidUnit => "invalid_unit",
            Self::InvalidInput => "invalid_input",
            Self::InsufficientIngredients => "insufficient_ingredients",
            Self::InsufficientStock => "insufficient_stock",
            Self::ProductExpired => "product_expired",
            Self::UnitIncompatible => "unit_incompatible",
            Self::ConversionFailed => "conversion_failed",
            Self::ProductNotFound => "product_not_found",
            Self::RecipeNotFound => "recipe_not_found",
            Self::IngredientNotFound => "ingredient_not_found",
            Self::ChildProductNotFound => "child_product_not_found",
            Self::ConfigInvalid => "config_invalid",
            Self::StorageError => "storage_error",
            Self::FailedToPrepareCompositeProduct => "failed_to_prepare_composite_product",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Identifier of the entity the error concerns
    pub resource_id: Option<String>,
    /// Structured payload (shortfall lists, offending fields)
    pub details: serde_json::Value,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            resource_id: None,
            details: serde_json::Value::Null,
        }
    }
}

/// Unified error type for the library boundary
#[derive(Debug, thiserror::Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a resource ID to the error context
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.context.resource_id = Some(resource_id.into());
        self
    }

    /// Add details to the error context
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.context.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Invalid input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Storage error
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Failure shape returned across the library boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Structured detail, omitted when there is none
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: error.code,
            message: error.message,
            details: error.context.details,
        }
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: error.code,
            message: error.message.clone(),
            details: error.context.details.clone(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::internal(format!("serialization failed: {error}")).with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::InsufficientIngredients.http_status(), 400);
        assert_eq!(ErrorCode::ProductNotFound.http_status(), 404);
        assert_eq!(ErrorCode::FailedToPrepareCompositeProduct.http_status(), 500);
    }

    #[test]
    fn test_error_code_wire_format_matches_as_str() {
        for code in [
            ErrorCode::InvalidCompositeStructure,
            ErrorCode::InsufficientIngredients,
            ErrorCode::ProductExpired,
            ErrorCode::FailedToPrepareCompositeProduct,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, serde_json::Value::String(code.as_str().to_owned()));
        }
    }

    #[test]
    fn test_error_response_omits_null_details() {
        let response = ErrorResponse::from(AppError::invalid_input("bad"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "invalid_input");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_only_system_faults_are_retryable() {
        assert!(ErrorCode::StorageError.is_retryable());
        assert!(!ErrorCode::InsufficientStock.is_retryable());
        assert!(!ErrorCode::ProductExpired.is_retryable());
    }
}
