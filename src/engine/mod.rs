// ABOUTME: Composite-product engine: preparation, serving, discard and read views
// ABOUTME: Holds the store, validated policy, unit converter and clock shared by every operation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Composite Engine
//!
//! Every mutating operation follows the same protocol:
//!
//! 1. load a snapshot from the store,
//! 2. run every business check against it (nothing is written yet),
//! 3. buffer the writes and the history row into one commit,
//! 4. let the store re-check its guards and apply the commit atomically.
//!
//! If the composite's stock moved between steps 1 and 4 the store reports the
//! snapshot as stale and the whole sequence runs again, up to
//! `COMMIT_ATTEMPTS` times. Preparation does the same when an ingredient guard
//! trips at commit time.
//!
//! Caller-correctable errors therefore never leave partial state behind.

/// Preparation engine
pub mod preparation;
/// Requirement planning for the recipe and legacy child paths
pub mod requirements;
/// Serving and discard engines plus status views
pub mod serving;

pub use preparation::{PreparationDetails, PreparationResult, RequiredIngredientEntry};
pub use requirements::{ChildBreakdown, IngredientRequirement, RequirementPlan, UnitSource};
pub use serving::{CompositeStatus, DiscardAction, DiscardResult, ServingResult};

use std::sync::Arc;

use prepline_core::constants::limits::{COMMIT_ATTEMPTS, DEFAULT_HISTORY_LIMIT, MAX_BATCHES_CEILING};
use prepline_core::errors::KitchenError;
use prepline_core::units::UnitConverter;
use tracing::instrument;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::{ConfigError, KitchenConfig};
use crate::costing::{self, IngredientBook, PriceRollup, RecipeAvailability};
use crate::history::{self, HistoryFilter, HistorySummary};
use crate::logging::KitchenLogger;
use crate::models::{CompositeInfo, HistoryRecord, Product, Recipe};
use crate::store::{KitchenStore, StoreError};

/// Entry point for every composite-product operation
#[derive(Clone)]
pub struct CompositeEngine {
    store: Arc<dyn KitchenStore>,
    config: KitchenConfig,
    converter: UnitConverter,
    clock: Arc<dyn Clock>,
}

impl CompositeEngine {
    /// Build an engine under a validated policy
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the policy fails validation.
    pub fn new(
        store: Arc<dyn KitchenStore>,
        config: KitchenConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let converter = config.unit_converter()?;
        Ok(Self {
            store,
            config,
            converter,
            clock,
        })
    }

    /// Policy in force
    #[must_use]
    pub const fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Unit converter for the configured vocabulary
    #[must_use]
    pub const fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    /// Backing store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KitchenStore> {
        &self.store
    }

    /// Injected clock
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) async fn load_product(&self, product_id: Uuid) -> Result<Product, KitchenError> {
        self.store
            .get_product(product_id)
            .await
            .map_err(storage)?
            .ok_or(KitchenError::ProductNotFound(product_id))
    }

    /// Load a composite product and its capacity-checked composite info
    pub(crate) async fn load_composite(
        &self,
        product_id: Uuid,
    ) -> Result<(Product, CompositeInfo), KitchenError> {
        let product = self.load_product(product_id).await?;
        let info = product
            .composite
            .clone()
            .ok_or_else(|| KitchenError::InvalidCompositeStructure {
                product_id,
                reason: "product is not a composite product".into(),
            })?;
        if !info.capacity.is_positive() {
            return Err(KitchenError::InvalidCompositeStructure {
                product_id,
                reason: format!("capacity must be positive, got {}", info.capacity.quantity),
            });
        }
        if !(info.expiry_hours.is_finite() && info.expiry_hours > 0.0) {
            return Err(KitchenError::InvalidCompositeStructure {
                product_id,
                reason: format!("expiry hours must be positive, got {}", info.expiry_hours),
            });
        }
        Ok((product, info))
    }

    pub(crate) async fn load_recipe(&self, recipe_id: Uuid) -> Result<(Recipe, IngredientBook), KitchenError> {
        let recipe = self
            .store
            .get_recipe(recipe_id)
            .await
            .map_err(storage)?
            .ok_or(KitchenError::RecipeNotFound(recipe_id))?;
        let ids: Vec<Uuid> = recipe.ingredients.iter().map(|line| line.ingredient_id).collect();
        let book: IngredientBook = self
            .store
            .get_ingredients(&ids)
            .await
            .map_err(storage)?
            .into_iter()
            .map(|ingredient| (ingredient.id, ingredient))
            .collect();
        Ok((recipe, book))
    }

    /// Availability of a recipe at a number of recipe batches
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantityToPrepare` for a batch count outside
    /// `1..=MAX_BATCHES_CEILING`, otherwise `RecipeNotFound`,
    /// `IngredientNotFound` or `UnitIncompatible`.
    #[instrument(skip(self), fields(recipe_id = %recipe_id))]
    pub async fn recipe_availability(
        &self,
        recipe_id: Uuid,
        recipe_batches: u32,
    ) -> Result<RecipeAvailability, KitchenError> {
        if !(1..=MAX_BATCHES_CEILING).contains(&recipe_batches) {
            return Err(KitchenError::InvalidQuantityToPrepare {
                requested: i64::from(recipe_batches),
                min: 1,
                max: MAX_BATCHES_CEILING,
            });
        }
        let (recipe, book) = self.load_recipe(recipe_id).await?;
        costing::availability(&recipe, recipe_batches, &book, &self.converter)
    }

    /// Cost and price roll-up for a composite product
    ///
    /// # Errors
    ///
    /// Returns lookup, structure or unit errors from the costing path.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn price_rollup(&self, product_id: Uuid) -> Result<PriceRollup, KitchenError> {
        let (product, info) = self.load_composite(product_id).await?;
        if let Some(recipe_id) = info.recipe_id {
            let (recipe, book) = self.load_recipe(recipe_id).await?;
            return costing::rollup_from_recipe(
                &product,
                info.capacity.quantity,
                &recipe,
                &book,
                &self.converter,
            );
        }
        let children = self.load_children(&info).await?;
        Ok(costing::rollup_from_children(&product, &children))
    }

    /// Newest-first history of a product
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::Storage` on backend failure.
    pub async fn history_for_product(
        &self,
        product_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryRecord>, KitchenError> {
        self.store
            .history_for_product(product_id, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .await
            .map_err(storage)
    }

    /// Newest-first history of a store
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::Storage` on backend failure.
    pub async fn history_for_store(
        &self,
        store_id: Uuid,
        filter: &HistoryFilter,
    ) -> Result<Vec<HistoryRecord>, KitchenError> {
        self.store
            .history_for_store(store_id, filter)
            .await
            .map_err(storage)
    }

    /// Totals over a store's filtered history
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::Storage` on backend failure.
    pub async fn summarize_store(
        &self,
        store_id: Uuid,
        filter: &HistoryFilter,
    ) -> Result<HistorySummary, KitchenError> {
        let rows = self.history_for_store(store_id, filter).await?;
        Ok(history::summarize(&rows))
    }
}

pub(crate) fn storage(error: StoreError) -> KitchenError {
    KitchenError::Storage(error.to_string())
}

/// One optimistic attempt at a mutating operation
pub(crate) enum Attempt<T> {
    /// The commit landed
    Committed(T),
    /// Stock moved under the snapshot; start over
    Stale,
}

/// Log and describe a run of stale snapshots
pub(crate) fn retries_exhausted(product_id: Uuid, operation: &str) -> String {
    let reason = format!("stock kept changing over {COMMIT_ATTEMPTS} attempts");
    KitchenLogger::log_commit_fault(product_id, operation, &reason);
    reason
}
