// ABOUTME: Scripted kitchen walkthrough for prepline-cli
// ABOUTME: Seeds a rice dish, then prepares, serves and reports status and history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;

use prepline::constants::units::{KILOGRAM, LITER, PIECE};
use prepline::errors::AppResult;
use prepline::models::{CompositeInfo, Ingredient, Measure, Product, Recipe};
use prepline::store::InMemoryStore;
use prepline::tools::{ToolContext, ToolRegistry};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::print_result;

/// Seed the kitchen and return the composite product id
async fn seed(store: &InMemoryStore) -> AppResult<Uuid> {
    let store_id = Uuid::new_v4();
    let rice = Ingredient::new(store_id, "rice", KILOGRAM, 20.0, 1.2);
    let meat = Ingredient::new(store_id, "meat", KILOGRAM, 10.0, 8.5);
    let water = Ingredient::new(store_id, "water", LITER, 30.0, 0.01);

    let recipe = Recipe::new(store_id, "Rice with meat", 20.0, PIECE)
        .with_ingredient(rice.id, 2.5, KILOGRAM)
        .with_ingredient(meat.id, 1.5, KILOGRAM)
        .with_ingredient(water.id, 3.0, LITER)
        .with_expiry_hours(4.0);
    let product = Product::composite(
        store_id,
        "RICE-MEAT",
        "Rice with meat",
        CompositeInfo::new(Measure::new(50.0, PIECE), recipe.expiry_hours).with_recipe(recipe.id),
    )
    .with_retail_price(3.5);
    let product_id = product.id;

    for ingredient in [rice, meat, water] {
        store.insert_ingredient(ingredient).await?;
    }
    store.insert_recipe(recipe).await?;
    store.insert_product(product).await?;

    info!(%product_id, "Seeded demo kitchen");
    Ok(product_id)
}

/// Run the walkthrough; stops at the first failing step
pub async fn run(
    registry: &ToolRegistry,
    context: &ToolContext,
    store: &Arc<InMemoryStore>,
    batches: i64,
    servings: i64,
) -> AppResult<bool> {
    let product_id = seed(store).await?.to_string();

    let steps = [
        (
            "prepare",
            "prepare_composite_product",
            json!({ "productId": product_id, "quantityToPrepare": batches }),
        ),
        (
            "serve",
            "serve_composite_product",
            json!({ "productId": product_id, "quantityToServe": servings }),
        ),
        (
            "status",
            "get_composite_status",
            json!({ "productId": product_id, "includeCosting": true }),
        ),
        (
            "history",
            "get_composite_history",
            json!({ "productId": product_id }),
        ),
    ];

    for (label, tool, args) in steps {
        let result = registry.call(tool, args, context).await;
        if !print_result(Some(label), &result)? {
            return Ok(false);
        }
    }
    Ok(true)
}
