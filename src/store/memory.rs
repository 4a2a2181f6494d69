// ABOUTME: In-memory KitchenStore backed by a single tokio RwLock
// ABOUTME: Each commit re-checks every guard under the write lock, then applies all writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::collections::HashMap;

use async_trait::async_trait;
use prepline_core::constants::units::QUANTITY_EPSILON;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    DeductionTarget, KitchenStore, PreparationCommit, StockDecrease, StoreError, StoreResult,
};
use crate::history::HistoryFilter;
use crate::models::{HistoryAction, HistoryRecord, Ingredient, Product, Recipe};

#[derive(Debug, Default)]
struct KitchenState {
    ingredients: HashMap<Uuid, Ingredient>,
    recipes: HashMap<Uuid, Recipe>,
    products: HashMap<Uuid, Product>,
    history: Vec<HistoryRecord>,
}

impl KitchenState {
    fn stock_of(&self, target: DeductionTarget, id: Uuid) -> StoreResult<f64> {
        match target {
            DeductionTarget::Ingredient => self
                .ingredients
                .get(&id)
                .map(|ingredient| ingredient.stock_quantity)
                .ok_or(StoreError::NotFound {
                    entity: "ingredient",
                    id,
                }),
            DeductionTarget::Product => self
                .products
                .get(&id)
                .map(|product| product.stock_quantity)
                .ok_or(StoreError::NotFound {
                    entity: "product",
                    id,
                }),
        }
    }

    fn deduct(&mut self, target: DeductionTarget, id: Uuid, amount: f64) {
        let stock = match target {
            DeductionTarget::Ingredient => self
                .ingredients
                .get_mut(&id)
                .map(|ingredient| &mut ingredient.stock_quantity),
            DeductionTarget::Product => self
                .products
                .get_mut(&id)
                .map(|product| &mut product.stock_quantity),
        };
        if let Some(stock) = stock {
            *stock = (*stock - amount).max(0.0);
        }
    }

    fn composite_stock(&self, product_id: Uuid, expected: f64) -> StoreResult<f64> {
        let product = self.products.get(&product_id).ok_or(StoreError::NotFound {
            entity: "product",
            id: product_id,
        })?;
        let info = product.composite.as_ref().ok_or_else(|| {
            StoreError::Invalid(format!("product {product_id} is not a composite product"))
        })?;
        let current = info.current_stock();
        if (current - expected).abs() > QUANTITY_EPSILON {
            return Err(StoreError::Stale {
                product_id,
                expected,
                actual: current,
            });
        }
        Ok(current)
    }
}

/// Process-local store; the write lock serialises every commit
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<KitchenState>,
}

impl InMemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an ingredient
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` for negative stock.
    pub async fn insert_ingredient(&self, ingredient: Ingredient) -> StoreResult<()> {
        if ingredient.stock_quantity < 0.0 {
            return Err(StoreError::Invalid(format!(
                "ingredient {} has negative stock",
                ingredient.id
            )));
        }
        self.state
            .write()
            .await
            .ingredients
            .insert(ingredient.id, ingredient);
        Ok(())
    }

    /// Add or replace a recipe
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` if the yield is not positive.
    pub async fn insert_recipe(&self, recipe: Recipe) -> StoreResult<()> {
        if !recipe.yield_.is_positive() {
            return Err(StoreError::Invalid(format!(
                "recipe {} must yield a positive quantity",
                recipe.id
            )));
        }
        self.state.write().await.recipes.insert(recipe.id, recipe);
        Ok(())
    }

    /// Add or replace a product
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Invalid` for a composite product that already carries
    /// stock (composite stock only arrives through preparation), or whose
    /// capacity or shelf life is not a positive finite number.
    pub async fn insert_product(&self, product: Product) -> StoreResult<()> {
        if let Some(info) = &product.composite {
            let problem = if info.current_stock() != 0.0 {
                Some(format!("must start with zero stock, got {}", info.current_stock()))
            } else if !info.capacity.is_positive() {
                Some(format!("capacity must be positive, got {}", info.capacity.quantity))
            } else if !(info.expiry_hours.is_finite() && info.expiry_hours > 0.0) {
                Some(format!("expiry hours must be positive, got {}", info.expiry_hours))
            } else {
                None
            };
            if let Some(problem) = problem {
                return Err(StoreError::Invalid(format!(
                    "composite product {}: {problem}",
                    product.id
                )));
            }
        }
        self.state
            .write()
            .await
            .products
            .insert(product.id, product);
        Ok(())
    }

    /// Number of history rows held
    pub async fn history_len(&self) -> usize {
        self.state.read().await.history.len()
    }
}

#[async_trait]
impl KitchenStore for InMemoryStore {
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }

    async fn get_recipe(&self, id: Uuid) -> StoreResult<Option<Recipe>> {
        Ok(self.state.read().await.recipes.get(&id).cloned())
    }

    async fn get_ingredient(&self, id: Uuid) -> StoreResult<Option<Ingredient>> {
        Ok(self.state.read().await.ingredients.get(&id).cloned())
    }

    async fn get_ingredients(&self, ids: &[Uuid]) -> StoreResult<Vec<Ingredient>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.ingredients.get(id).cloned())
            .collect())
    }

    async fn commit_preparation(&self, commit: PreparationCommit) -> StoreResult<Product> {
        let mut state = self.state.write().await;

        state.composite_stock(commit.product_id, commit.expected_stock)?;

        // Same entity may appear twice; guard on the combined amount
        let mut totals: Vec<(DeductionTarget, Uuid, f64)> = Vec::new();
        for deduction in &commit.deductions {
            match totals
                .iter_mut()
                .find(|(target, id, _)| *target == deduction.target && *id == deduction.id)
            {
                Some((_, _, amount)) => *amount += deduction.amount,
                None => totals.push((deduction.target, deduction.id, deduction.amount)),
            }
        }
        for &(target, id, amount) in &totals {
            let available = state.stock_of(target, id)?;
            if available + QUANTITY_EPSILON < amount {
                return Err(StoreError::Conflict {
                    entity_id: id,
                    requested: amount,
                    available,
                });
            }
        }

        for &(target, id, amount) in &totals {
            state.deduct(target, id, amount);
        }
        let updated = {
            let product = state
                .products
                .get_mut(&commit.product_id)
                .ok_or(StoreError::NotFound {
                    entity: "product",
                    id: commit.product_id,
                })?;
            if let Some(info) = product.composite.as_mut() {
                info.apply_preparation(commit.servings, commit.prepared_at);
            }
            product.clone()
        };
        state.history.push(commit.history);
        drop(state);

        debug!(product_id = %commit.product_id, "preparation committed");
        Ok(updated)
    }

    async fn commit_stock_decrease(&self, decrease: StockDecrease) -> StoreResult<Product> {
        let mut state = self.state.write().await;

        let current = state.composite_stock(decrease.product_id, decrease.expected_stock)?;
        if current + QUANTITY_EPSILON < decrease.quantity {
            return Err(StoreError::Conflict {
                entity_id: decrease.product_id,
                requested: decrease.quantity,
                available: current,
            });
        }

        let updated = {
            let product = state
                .products
                .get_mut(&decrease.product_id)
                .ok_or(StoreError::NotFound {
                    entity: "product",
                    id: decrease.product_id,
                })?;
            if let Some(info) = product.composite.as_mut() {
                info.apply_decrease(decrease.quantity);
            }
            product.clone()
        };
        state.history.push(decrease.history);
        drop(state);

        debug!(product_id = %decrease.product_id, "stock decrease committed");
        Ok(updated)
    }

    async fn history_for_product(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<HistoryRecord>> {
        let state = self.state.read().await;
        Ok(state
            .history
            .iter()
            .rev()
            .filter(|row| row.product_id == product_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn latest_history(
        &self,
        product_id: Uuid,
        action: HistoryAction,
    ) -> StoreResult<Option<HistoryRecord>> {
        let state = self.state.read().await;
        Ok(state
            .history
            .iter()
            .rev()
            .find(|row| row.product_id == product_id && row.action == action)
            .cloned())
    }

    async fn history_for_store(
        &self,
        store_id: Uuid,
        filter: &HistoryFilter,
    ) -> StoreResult<Vec<HistoryRecord>> {
        let state = self.state.read().await;
        Ok(state
            .history
            .iter()
            .rev()
            .filter(|row| row.store_id == store_id && filter.matches(row))
            .cloned()
            .collect())
    }
}
