// ABOUTME: Storage abstraction for the composite-product engines
// ABOUTME: Read operations, two atomic conditional commit primitives and history queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Kitchen Store
//!
//! Engines never write entities field by field. They run their availability
//! checks against a snapshot, buffer every intended write into a commit value
//! and hand it to the store, which re-checks each guard and applies all writes
//! or none. A guard that no longer holds surfaces as [`StoreError::Conflict`].
//!
//! Commits also carry the composite stock the engine observed. If another
//! commit moved it in the meantime the store answers [`StoreError::Stale`].
//! Preparation re-runs from a fresh snapshot on either error, so history rows
//! always record the stock they actually changed and a shortfall is reported
//! in full by the availability pass.

/// In-memory backend
pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prepline_core::errors::{AppError, ErrorCode};
use thiserror::Error;
use uuid::Uuid;

use crate::history::HistoryFilter;
use crate::models::{HistoryAction, HistoryRecord, Ingredient, Product, Recipe};

/// Storage-layer failures
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A conditional write guard no longer holds
    #[error("conditional write rejected for {entity_id}: requested {requested}, available {available}")]
    Conflict {
        /// Entity whose guard tripped
        entity_id: Uuid,
        /// Amount the write needed
        requested: f64,
        /// Amount actually present at commit time
        available: f64,
    },

    /// Composite stock moved since the engine took its snapshot
    #[error("composite {product_id} changed since it was read: expected {expected}, found {actual}")]
    Stale {
        /// Composite product
        product_id: Uuid,
        /// Stock the commit was built against
        expected: f64,
        /// Stock at commit time
        actual: f64,
    },

    /// Referenced entity does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Missing id
        id: Uuid,
    },

    /// A seeding write would violate an entity invariant
    #[error("invalid entity: {0}")]
    Invalid(String),

    /// Infrastructure failure
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match &error {
            StoreError::NotFound { entity, id } => {
                let code = match *entity {
                    "recipe" => ErrorCode::RecipeNotFound,
                    "ingredient" => ErrorCode::IngredientNotFound,
                    _ => ErrorCode::ProductNotFound,
                };
                Self::new(code, error.to_string()).with_resource_id(id.to_string())
            }
            StoreError::Invalid(_) => Self::invalid_input(error.to_string()),
            StoreError::Conflict { .. } | StoreError::Stale { .. } | StoreError::Backend(_) => {
                Self::storage(error.to_string())
            }
        }
    }
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// What a deduction draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeductionTarget {
    /// Raw ingredient stock
    Ingredient,
    /// A simple product's stock (legacy child path)
    Product,
}

/// One guarded stock decrement: applied only if `stock >= amount`
#[derive(Debug, Clone, PartialEq)]
pub struct StockDeduction {
    /// Entity kind
    pub target: DeductionTarget,
    /// Entity id
    pub id: Uuid,
    /// Amount to remove, in the entity's own unit
    pub amount: f64,
}

/// Buffered writes of one preparation
#[derive(Debug, Clone)]
pub struct PreparationCommit {
    /// Composite product being prepared
    pub product_id: Uuid,
    /// Composite stock the engine observed; the commit fails if it moved
    pub expected_stock: f64,
    /// Servings added
    pub servings: f64,
    /// New `last_prepared_at`
    pub prepared_at: DateTime<Utc>,
    /// Every ingredient or child deduction
    pub deductions: Vec<StockDeduction>,
    /// Row appended with the mutation
    pub history: HistoryRecord,
}

/// Buffered writes of one serve, waste or expire
#[derive(Debug, Clone)]
pub struct StockDecrease {
    /// Composite product
    pub product_id: Uuid,
    /// Composite stock the engine observed
    pub expected_stock: f64,
    /// Servings removed
    pub quantity: f64,
    /// Row appended with the mutation
    pub history: HistoryRecord,
}

/// Persistence contract for the engines
///
/// Implementations must make each commit all-or-nothing: every guard is
/// checked before any write is applied.
#[async_trait]
pub trait KitchenStore: Send + Sync {
    /// Fetch a product
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>>;

    /// Fetch several products, skipping unknown ids
    async fn get_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>>;

    /// Fetch a recipe
    async fn get_recipe(&self, id: Uuid) -> StoreResult<Option<Recipe>>;

    /// Fetch an ingredient
    async fn get_ingredient(&self, id: Uuid) -> StoreResult<Option<Ingredient>>;

    /// Fetch several ingredients, skipping unknown ids
    async fn get_ingredients(&self, ids: &[Uuid]) -> StoreResult<Vec<Ingredient>>;

    /// Apply a preparation atomically and return the updated product
    async fn commit_preparation(&self, commit: PreparationCommit) -> StoreResult<Product>;

    /// Apply a serve/waste/expire atomically and return the updated product
    async fn commit_stock_decrease(&self, decrease: StockDecrease) -> StoreResult<Product>;

    /// Newest-first history of one product
    async fn history_for_product(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<HistoryRecord>>;

    /// Newest history row of one action for a product
    async fn latest_history(
        &self,
        product_id: Uuid,
        action: HistoryAction,
    ) -> StoreResult<Option<HistoryRecord>>;

    /// Newest-first history of a store, filtered
    async fn history_for_store(
        &self,
        store_id: Uuid,
        filter: &HistoryFilter,
    ) -> StoreResult<Vec<HistoryRecord>>;
}
