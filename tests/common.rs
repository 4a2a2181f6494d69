// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides quiet logging plus a seeded rice-and-meat kitchen on a manual clock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `prepline`
//!
//! The default kitchen mirrors a typical batch dish: one recipe yielding 20
//! servings from 2.5 kg rice, 1.5 kg meat and 3 l water, linked to a composite
//! product that holds 50 servings per batch and keeps for 4 hours.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prepline::clock::{Clock, ManualClock};
use prepline::config::KitchenConfig;
use prepline::constants::units::{KILOGRAM, LITER, PIECE};
use prepline::engine::CompositeEngine;
use prepline::history::HistoryFilter;
use prepline::models::{
    ChildProduct, CompositeInfo, HistoryAction, HistoryRecord, Ingredient, Measure, Operator,
    OperatorRole, Product, Recipe,
};
use prepline::store::{
    InMemoryStore, KitchenStore, PreparationCommit, StockDecrease, StoreResult,
};
use prepline::tools::ToolContext;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

pub const RICE_COST: f64 = 1.2;
pub const MEAT_COST: f64 = 8.5;
pub const WATER_COST: f64 = 0.01;
pub const RETAIL_PRICE: f64 = 3.5;
pub const EXPIRY_HOURS: f64 = 4.0;

/// Opening stock of the three ingredients
#[derive(Debug, Clone, Copy)]
pub struct OpeningStock {
    pub rice_kg: f64,
    pub meat_kg: f64,
    pub water_l: f64,
}

impl Default for OpeningStock {
    fn default() -> Self {
        Self {
            rice_kg: 20.0,
            meat_kg: 10.0,
            water_l: 30.0,
        }
    }
}

/// A seeded kitchen with handles to every moving part
pub struct Kitchen {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub engine: Arc<CompositeEngine>,
    pub operator: Operator,
    pub store_id: Uuid,
    pub rice: Uuid,
    pub meat: Uuid,
    pub water: Uuid,
    pub recipe: Uuid,
    pub product: Uuid,
}

impl Kitchen {
    /// Tool context acting as the kitchen's operator
    pub fn tool_context(&self) -> ToolContext {
        ToolContext::new(self.engine.clone(), self.operator.clone())
    }

    /// Current stock of an ingredient
    pub async fn ingredient_stock(&self, id: Uuid) -> f64 {
        self.store
            .get_ingredient(id)
            .await
            .unwrap()
            .expect("ingredient exists")
            .stock_quantity
    }

    /// Current snapshot of a product
    pub async fn product(&self, id: Uuid) -> Product {
        self.store
            .get_product(id)
            .await
            .unwrap()
            .expect("product exists")
    }

    /// Instant the kitchen clock currently reads
    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Servings on the shelf of the seeded composite
    pub async fn shelf(&self) -> f64 {
        self.product(self.product).await.current_stock()
    }
}

pub fn operator() -> Operator {
    Operator::new(Uuid::new_v4(), "line-cook", OperatorRole::Staff)
}

pub fn engine_with(
    store: Arc<InMemoryStore>,
    config: KitchenConfig,
    clock: Arc<ManualClock>,
) -> Arc<CompositeEngine> {
    Arc::new(CompositeEngine::new(store, config, clock).expect("valid config"))
}

/// Kitchen with default stock and default policy
pub async fn kitchen() -> Kitchen {
    kitchen_with(OpeningStock::default(), KitchenConfig::default()).await
}

/// Kitchen with custom stock and policy
pub async fn kitchen_with(stock: OpeningStock, config: KitchenConfig) -> Kitchen {
    init_test_logging();

    let store_id = Uuid::new_v4();
    let rice = Ingredient::new(store_id, "rice", KILOGRAM, stock.rice_kg, RICE_COST);
    let meat = Ingredient::new(store_id, "meat", KILOGRAM, stock.meat_kg, MEAT_COST);
    let water = Ingredient::new(store_id, "water", LITER, stock.water_l, WATER_COST);
    let recipe = Recipe::new(store_id, "Rice with meat", 20.0, PIECE)
        .with_ingredient(rice.id, 2.5, KILOGRAM)
        .with_ingredient(meat.id, 1.5, KILOGRAM)
        .with_ingredient(water.id, 3.0, LITER)
        .with_expiry_hours(EXPIRY_HOURS);
    let product = Product::composite(
        store_id,
        "rice-meat",
        "Rice with meat",
        CompositeInfo::new(Measure::new(50.0, PIECE), EXPIRY_HOURS).with_recipe(recipe.id),
    )
    .with_retail_price(RETAIL_PRICE);

    let kitchen_store = Arc::new(InMemoryStore::new());
    let (rice_id, meat_id, water_id, recipe_id, product_id) =
        (rice.id, meat.id, water.id, recipe.id, product.id);
    for ingredient in [rice, meat, water] {
        kitchen_store.insert_ingredient(ingredient).await.unwrap();
    }
    kitchen_store.insert_recipe(recipe).await.unwrap();
    kitchen_store.insert_product(product).await.unwrap();

    let clock = Arc::new(ManualClock::default());
    let engine = engine_with(kitchen_store.clone(), config, clock.clone());

    Kitchen {
        store: kitchen_store,
        clock,
        engine,
        operator: operator(),
        store_id,
        rice: rice_id,
        meat: meat_id,
        water: water_id,
        recipe: recipe_id,
        product: product_id,
    }
}

/// Add a composite built from legacy child products; returns `(composite, child)`
///
/// The child is a simple product sold by the kilogram with `child_stock` on hand.
pub async fn add_legacy_composite(
    kitchen: &Kitchen,
    child_stock: f64,
    entry: impl FnOnce(Uuid) -> ChildProduct,
) -> (Uuid, Uuid) {
    let child = Product::simple(kitchen.store_id, "sauce", "Tomato sauce", KILOGRAM, child_stock, 4.0);
    let child_id = child.id;
    let composite = Product::composite(
        kitchen.store_id,
        "pasta",
        "Pasta plate",
        CompositeInfo::new(Measure::new(10.0, PIECE), 6.0).with_child(entry(child_id)),
    )
    .with_retail_price(9.0);
    let composite_id = composite.id;

    kitchen.store.insert_product(child).await.unwrap();
    kitchen.store.insert_product(composite).await.unwrap();
    (composite_id, child_id)
}

/// Float comparison with a tolerance suited to money and kilograms
pub fn approx(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-6
}

/// Store wrapper that edits products on read and moves ingredient stock just
/// before a preparation commit, standing in for other writers
pub struct ScriptedStore {
    inner: Arc<InMemoryStore>,
    product_edits: Mutex<HashMap<Uuid, Product>>,
    stock_before_commit: Mutex<Vec<(Uuid, f64)>>,
}

impl ScriptedStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            product_edits: Mutex::new(HashMap::new()),
            stock_before_commit: Mutex::new(Vec::new()),
        }
    }

    /// Serve `product` for reads of its id regardless of what the store holds
    pub fn edit_product(&self, product: Product) {
        self.product_edits.lock().unwrap().insert(product.id, product);
    }

    /// Set ingredient stock once, right before the next preparation commit
    pub fn set_stock_before_commit(&self, ingredient_id: Uuid, stock: f64) {
        self.stock_before_commit
            .lock()
            .unwrap()
            .push((ingredient_id, stock));
    }

    /// Engine on this store sharing the kitchen's clock
    pub fn engine(self: &Arc<Self>, kitchen: &Kitchen) -> Arc<CompositeEngine> {
        Arc::new(
            CompositeEngine::new(self.clone(), KitchenConfig::default(), kitchen.clock.clone())
                .expect("valid config"),
        )
    }
}

#[async_trait]
impl KitchenStore for ScriptedStore {
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let edited = self.product_edits.lock().unwrap().get(&id).cloned();
        match edited {
            Some(product) => Ok(Some(product)),
            None => self.inner.get_product(id).await,
        }
    }

    async fn get_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        self.inner.get_products(ids).await
    }

    async fn get_recipe(&self, id: Uuid) -> StoreResult<Option<Recipe>> {
        self.inner.get_recipe(id).await
    }

    async fn get_ingredient(&self, id: Uuid) -> StoreResult<Option<Ingredient>> {
        self.inner.get_ingredient(id).await
    }

    async fn get_ingredients(&self, ids: &[Uuid]) -> StoreResult<Vec<Ingredient>> {
        self.inner.get_ingredients(ids).await
    }

    async fn commit_preparation(&self, commit: PreparationCommit) -> StoreResult<Product> {
        let pending = std::mem::take(&mut *self.stock_before_commit.lock().unwrap());
        for (id, stock) in pending {
            if let Some(mut ingredient) = self.inner.get_ingredient(id).await? {
                ingredient.stock_quantity = stock;
                self.inner.insert_ingredient(ingredient).await?;
            }
        }
        self.inner.commit_preparation(commit).await
    }

    async fn commit_stock_decrease(&self, decrease: StockDecrease) -> StoreResult<Product> {
        self.inner.commit_stock_decrease(decrease).await
    }

    async fn history_for_product(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<HistoryRecord>> {
        self.inner.history_for_product(product_id, limit).await
    }

    async fn latest_history(
        &self,
        product_id: Uuid,
        action: HistoryAction,
    ) -> StoreResult<Option<HistoryRecord>> {
        self.inner.latest_history(product_id, action).await
    }

    async fn history_for_store(
        &self,
        store_id: Uuid,
        filter: &HistoryFilter,
    ) -> StoreResult<Vec<HistoryRecord>> {
        self.inner.history_for_store(store_id, filter).await
    }
}
