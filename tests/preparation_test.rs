// ABOUTME: Integration tests for the preparation engine
// ABOUTME: Covers recipe scaling, shortfall reporting, atomic rollback, batch limits and the legacy child path
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

mod common;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{
    add_legacy_composite, approx, kitchen, kitchen_with, Kitchen, OpeningStock, ScriptedStore,
    EXPIRY_HOURS, MEAT_COST, RETAIL_PRICE, RICE_COST, WATER_COST,
};
use prepline::clock::Clock;
use prepline::config::KitchenConfig;
use prepline::constants::units::{KILOGRAM, PIECE};
use prepline::engine::PreparationResult;
use prepline::errors::{AppError, ErrorCode, KitchenError};
use prepline::freshness::FreshnessStatus;
use prepline::models::{ChildProduct, CompositeInfo, HistoryAction, Measure, Product, UsageSource};
use uuid::Uuid;

async fn prepare(kitchen: &Kitchen, quantity: i64) -> Result<PreparationResult, KitchenError> {
    kitchen
        .engine
        .prepare(kitchen.product, quantity, &kitchen.operator)
        .await
}

// ============================================================================
// Recipe path
// ============================================================================

#[tokio::test]
async fn test_prepare_scales_recipe_to_capacity() {
    let kitchen = kitchen().await;

    let result = prepare(&kitchen, 1).await.unwrap();

    // 50 servings from a 20-serving recipe needs 3 recipe batches
    assert_eq!(result.recipe_batches_made, 3);
    assert!(approx(result.total_servings_prepared, 50.0));
    assert!(approx(result.preparation_details.previous_stock, 0.0));
    assert!(approx(result.preparation_details.new_stock, 50.0));

    assert!(approx(kitchen.ingredient_stock(kitchen.rice).await, 20.0 - 7.5));
    assert!(approx(kitchen.ingredient_stock(kitchen.meat).await, 10.0 - 4.5));
    assert!(approx(kitchen.ingredient_stock(kitchen.water).await, 30.0 - 9.0));
    assert!(approx(kitchen.shelf().await, 50.0));

    let rice = &result.required_ingredients[&kitchen.rice];
    assert_eq!(rice.name, "rice");
    assert!(approx(rice.needed, 7.5));
    assert!(approx(rice.available, 20.0));
    assert_eq!(rice.unit, KILOGRAM);
    assert_eq!(rice.recipe_batches_needed, 3);
    assert!(!rice.is_legacy_data);
}

#[tokio::test]
async fn test_prepare_costs_and_revenue() {
    let kitchen = kitchen().await;

    let details = prepare(&kitchen, 1).await.unwrap().preparation_details;

    let per_batch = 2.5 * RICE_COST + 1.5 * MEAT_COST + 3.0 * WATER_COST;
    assert!(approx(details.total_cost, per_batch * 3.0));
    assert!(approx(details.unit_cost, per_batch * 3.0 / 50.0));
    assert!(approx(details.estimated_revenue, 50.0 * RETAIL_PRICE));

    let expected_expiry = kitchen.engine.clock().now() + chrono::Duration::hours(EXPIRY_HOURS as i64);
    assert_eq!(details.expiry_time, expected_expiry);
}

#[tokio::test]
async fn test_prepare_appends_history_in_same_commit() {
    let kitchen = kitchen().await;

    let result = prepare(&kitchen, 2).await.unwrap();

    let rows = kitchen
        .engine
        .history_for_product(kitchen.product, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id, result.history_id);
    assert_eq!(row.action, HistoryAction::Prepare);
    assert!(approx(row.quantity, 100.0));
    assert!(approx(row.stock_before, 0.0));
    assert!(approx(row.stock_after, 100.0));
    assert_eq!(row.unit, PIECE);
    assert_eq!(row.operator, kitchen.operator);

    let batch = row.batch_info.as_ref().expect("prepare rows carry batch info");
    let batch_number = batch.batch_number.as_deref().expect("batch number");
    assert!(batch_number.starts_with("RIC-"));
    assert_eq!(
        result.preparation_details.batch_number.as_deref(),
        Some(batch_number)
    );
    assert_eq!(batch.ingredients_used.len(), 3);
    assert!(batch
        .ingredients_used
        .iter()
        .all(|usage| usage.source == UsageSource::Recipe));
}

#[tokio::test]
async fn test_prepare_restarts_freshness_clock() {
    let kitchen = kitchen().await;
    prepare(&kitchen, 1).await.unwrap();

    // 3h30 of a 4h shelf life is past the 80% mark
    kitchen.clock.advance(chrono::Duration::minutes(210));
    assert_eq!(
        kitchen.engine.status(kitchen.product).await.unwrap().freshness.status,
        FreshnessStatus::ExpiringSoon
    );

    prepare(&kitchen, 1).await.unwrap();
    let status = kitchen.engine.status(kitchen.product).await.unwrap();
    assert_eq!(status.freshness.status, FreshnessStatus::Fresh);
    assert!(approx(status.current_stock, 100.0));
}

// ============================================================================
// Shortfalls and atomicity
// ============================================================================

#[tokio::test]
async fn test_prepare_reports_shortfall_and_changes_nothing() {
    let kitchen = kitchen_with(
        OpeningStock {
            meat_kg: 2.0,
            ..OpeningStock::default()
        },
        KitchenConfig::default(),
    )
    .await;

    let error = prepare(&kitchen, 1).await.unwrap_err();

    let KitchenError::InsufficientIngredients { shortfalls } = &error else {
        panic!("expected insufficient ingredients, got {error:?}");
    };
    assert_eq!(shortfalls.len(), 1);
    let meat = &shortfalls[0];
    assert_eq!(meat.name, "meat");
    assert!(approx(meat.needed, 4.5));
    assert!(approx(meat.available, 2.0));
    assert!(approx(meat.shortfall, 2.5));
    assert_eq!(meat.unit, KILOGRAM);

    assert!(approx(kitchen.ingredient_stock(kitchen.meat).await, 2.0));
    assert!(approx(kitchen.ingredient_stock(kitchen.rice).await, 20.0));
    assert!(approx(kitchen.ingredient_stock(kitchen.water).await, 30.0));
    assert!(approx(kitchen.shelf().await, 0.0));
    assert_eq!(kitchen.store.history_len().await, 0);
}

#[tokio::test]
async fn test_prepare_lists_every_missing_ingredient() {
    let kitchen = kitchen_with(
        OpeningStock {
            rice_kg: 1.0,
            meat_kg: 1.0,
            water_l: 30.0,
        },
        KitchenConfig::default(),
    )
    .await;

    let error = prepare(&kitchen, 1).await.unwrap_err();
    let KitchenError::InsufficientIngredients { shortfalls } = error else {
        panic!("expected insufficient ingredients");
    };
    let mut names: Vec<_> = shortfalls.iter().map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["meat", "rice"]);

    let app_error = AppError::from(KitchenError::InsufficientIngredients { shortfalls });
    assert_eq!(app_error.code, ErrorCode::InsufficientIngredients);
}

#[tokio::test]
async fn test_check_availability_matches_prepare_without_mutation() {
    let kitchen = kitchen_with(
        OpeningStock {
            meat_kg: 2.0,
            ..OpeningStock::default()
        },
        KitchenConfig::default(),
    )
    .await;

    let availability = kitchen
        .engine
        .check_availability(kitchen.product, 1)
        .await
        .unwrap();
    assert!(!availability.can_prepare);
    assert_eq!(availability.missing_ingredients.len(), 1);
    assert_eq!(availability.missing_ingredients[0].name, "meat");
    assert!(approx(kitchen.ingredient_stock(kitchen.meat).await, 2.0));
    assert_eq!(kitchen.store.history_len().await, 0);
}

// ============================================================================
// Quantity validation
// ============================================================================

#[tokio::test]
async fn test_prepare_rejects_out_of_range_quantities() {
    let kitchen = kitchen().await;

    for requested in [0, -1, 11] {
        let error = prepare(&kitchen, requested).await.unwrap_err();
        assert!(
            matches!(
                error,
                KitchenError::InvalidQuantityToPrepare { requested: r, min: 1, max: 10 } if r == requested
            ),
            "unexpected error for {requested}: {error:?}"
        );
    }
    assert_eq!(kitchen.store.history_len().await, 0);
}

#[tokio::test]
async fn test_prepare_honours_configured_batch_limit() {
    let config = KitchenConfig {
        max_batches_per_prepare: 2,
        ..KitchenConfig::default()
    };
    let kitchen = kitchen_with(
        OpeningStock {
            rice_kg: 100.0,
            meat_kg: 100.0,
            water_l: 100.0,
        },
        config,
    )
    .await;

    assert!(matches!(
        prepare(&kitchen, 3).await.unwrap_err(),
        KitchenError::InvalidQuantityToPrepare { max: 2, .. }
    ));
    let result = prepare(&kitchen, 2).await.unwrap();
    assert_eq!(result.recipe_batches_made, 5);
}

// ============================================================================
// Structure errors
// ============================================================================

#[tokio::test]
async fn test_prepare_unknown_and_simple_products() {
    let kitchen = kitchen().await;

    let missing = Uuid::new_v4();
    assert!(matches!(
        kitchen.engine.prepare(missing, 1, &kitchen.operator).await,
        Err(KitchenError::ProductNotFound(id)) if id == missing
    ));

    let simple = Product::simple(kitchen.store_id, "soda", "Soda", PIECE, 24.0, 0.5);
    let simple_id = simple.id;
    kitchen.store.insert_product(simple).await.unwrap();
    assert!(matches!(
        kitchen.engine.prepare(simple_id, 1, &kitchen.operator).await,
        Err(KitchenError::InvalidCompositeStructure { .. })
    ));
}

#[tokio::test]
async fn test_prepare_without_recipe_or_children_is_invalid() {
    let kitchen = kitchen().await;
    let empty = Product::composite(
        kitchen.store_id,
        "empty",
        "Empty pot",
        CompositeInfo::new(Measure::new(10.0, PIECE), 2.0),
    );
    let empty_id = empty.id;
    kitchen.store.insert_product(empty).await.unwrap();

    assert!(matches!(
        kitchen.engine.prepare(empty_id, 1, &kitchen.operator).await,
        Err(KitchenError::InvalidCompositeStructure { .. })
    ));
}

#[tokio::test]
async fn test_unusable_shelf_life_is_invalid_structure() {
    let kitchen = kitchen().await;
    let scripted = Arc::new(ScriptedStore::new(kitchen.store.clone()));
    let engine = scripted.engine(&kitchen);

    for expiry_hours in [f64::NAN, f64::INFINITY, 0.0, -4.0] {
        let mut product = kitchen.product(kitchen.product).await;
        product.composite.as_mut().unwrap().expiry_hours = expiry_hours;
        scripted.edit_product(product);

        assert!(
            matches!(
                engine.prepare(kitchen.product, 1, &kitchen.operator).await,
                Err(KitchenError::InvalidCompositeStructure { product_id, .. })
                    if product_id == kitchen.product
            ),
            "prepare accepted expiry {expiry_hours}"
        );
        assert!(
            matches!(
                engine.status(kitchen.product).await,
                Err(KitchenError::InvalidCompositeStructure { .. })
            ),
            "status accepted expiry {expiry_hours}"
        );
    }
    assert!(approx(kitchen.shelf().await, 0.0));
    assert_eq!(kitchen.store.history_len().await, 0);
}

#[tokio::test]
async fn test_huge_shelf_life_saturates_expiry_time() {
    let kitchen = kitchen().await;
    let scripted = Arc::new(ScriptedStore::new(kitchen.store.clone()));
    let engine = scripted.engine(&kitchen);

    let mut product = kitchen.product(kitchen.product).await;
    product.composite.as_mut().unwrap().expiry_hours = 1e15;
    scripted.edit_product(product);

    let result = engine
        .prepare(kitchen.product, 1, &kitchen.operator)
        .await
        .unwrap();
    assert_eq!(result.preparation_details.expiry_time, DateTime::<Utc>::MAX_UTC);
    assert!(approx(kitchen.shelf().await, 50.0));
}

// ============================================================================
// Stock moving under a preparation
// ============================================================================

#[tokio::test]
async fn test_stock_drained_before_commit_reports_every_shortfall() {
    let kitchen = kitchen().await;
    let scripted = Arc::new(ScriptedStore::new(kitchen.store.clone()));
    scripted.set_stock_before_commit(kitchen.rice, 1.0);
    scripted.set_stock_before_commit(kitchen.meat, 0.5);
    let engine = scripted.engine(&kitchen);

    let shortfalls = match engine.prepare(kitchen.product, 1, &kitchen.operator).await {
        Err(KitchenError::InsufficientIngredients { shortfalls }) => shortfalls,
        other => panic!("expected a shortfall list, got {other:?}"),
    };
    assert_eq!(shortfalls.len(), 2);
    let rice = shortfalls.iter().find(|s| s.name == "rice").unwrap();
    assert!(approx(rice.needed, 7.5));
    assert!(approx(rice.available, 1.0));
    let meat = shortfalls.iter().find(|s| s.name == "meat").unwrap();
    assert!(approx(meat.needed, 4.5));
    assert!(approx(meat.available, 0.5));

    assert!(approx(kitchen.shelf().await, 0.0));
    assert!(approx(kitchen.ingredient_stock(kitchen.rice).await, 1.0));
    assert!(approx(kitchen.ingredient_stock(kitchen.water).await, 30.0));
    assert_eq!(kitchen.store.history_len().await, 0);
}

#[tokio::test]
async fn test_stock_topped_up_before_commit_still_prepares() {
    let kitchen = kitchen().await;
    let scripted = Arc::new(ScriptedStore::new(kitchen.store.clone()));
    scripted.set_stock_before_commit(kitchen.rice, 8.0);
    let engine = scripted.engine(&kitchen);

    engine
        .prepare(kitchen.product, 1, &kitchen.operator)
        .await
        .unwrap();
    assert!(approx(kitchen.ingredient_stock(kitchen.rice).await, 0.5));
    assert!(approx(kitchen.shelf().await, 50.0));
}

// ============================================================================
// Legacy child products
// ============================================================================

#[tokio::test]
async fn test_legacy_children_deduct_child_stock() {
    let kitchen = kitchen().await;
    let (composite, child) =
        add_legacy_composite(&kitchen, 5.0, |id| ChildProduct::new(id, 0.2, KILOGRAM)).await;

    let result = kitchen
        .engine
        .prepare(composite, 1, &kitchen.operator)
        .await
        .unwrap();

    assert_eq!(result.recipe_batches_made, 1);
    assert!(approx(result.total_servings_prepared, 10.0));
    let entry = &result.required_ingredients[&child];
    assert!(approx(entry.needed, 2.0));
    assert!(!entry.is_legacy_data);
    assert!(approx(result.preparation_details.total_cost, 8.0));
    assert!(approx(kitchen.product(child).await.stock_quantity, 3.0));
    assert!(approx(kitchen.product(composite).await.current_stock(), 10.0));
}

#[tokio::test]
async fn test_legacy_entry_defaults_are_flagged() {
    let kitchen = kitchen().await;
    let (composite, child) = add_legacy_composite(&kitchen, 12.0, ChildProduct::legacy).await;

    let result = kitchen
        .engine
        .prepare(composite, 1, &kitchen.operator)
        .await
        .unwrap();

    // One kilogram per serving, in the child's own unit
    let entry = &result.required_ingredients[&child];
    assert!(entry.is_legacy_data);
    assert!(approx(entry.needed, 10.0));
    assert_eq!(entry.unit, KILOGRAM);
    assert!(approx(kitchen.product(child).await.stock_quantity, 2.0));

    let rows = kitchen
        .engine
        .history_for_product(composite, None)
        .await
        .unwrap();
    let usage = &rows[0].batch_info.as_ref().unwrap().ingredients_used[0];
    assert_eq!(usage.source, UsageSource::ChildProduct);
    assert!(usage.is_legacy_data);
}

#[tokio::test]
async fn test_legacy_child_shortfall_is_reported() {
    let kitchen = kitchen().await;
    let (composite, child) =
        add_legacy_composite(&kitchen, 1.0, |id| ChildProduct::new(id, 0.5, KILOGRAM)).await;

    let error = kitchen
        .engine
        .prepare(composite, 1, &kitchen.operator)
        .await
        .unwrap_err();
    let KitchenError::InsufficientIngredients { shortfalls } = error else {
        panic!("expected insufficient ingredients");
    };
    assert_eq!(shortfalls[0].name, "Tomato sauce");
    assert!(approx(shortfalls[0].needed, 5.0));
    assert!(approx(kitchen.product(child).await.stock_quantity, 1.0));
}

#[tokio::test]
async fn test_legacy_child_errors() {
    let kitchen = kitchen().await;

    let dangling = Uuid::new_v4();
    let (composite, _) =
        add_legacy_composite(&kitchen, 5.0, |_| ChildProduct::new(dangling, 1.0, KILOGRAM)).await;
    assert!(matches!(
        kitchen.engine.prepare(composite, 1, &kitchen.operator).await,
        Err(KitchenError::ChildProductNotFound { child_id, .. }) if child_id == dangling
    ));

    let (zero_portion, _) =
        add_legacy_composite(&kitchen, 5.0, |id| ChildProduct::new(id, 0.0, KILOGRAM)).await;
    assert!(matches!(
        kitchen.engine.prepare(zero_portion, 1, &kitchen.operator).await,
        Err(KitchenError::InvalidChildProductStructure { .. })
    ));

    let (wrong_unit, _) =
        add_legacy_composite(&kitchen, 5.0, |id| ChildProduct::new(id, 1.0, "l")).await;
    assert!(matches!(
        kitchen.engine.prepare(wrong_unit, 1, &kitchen.operator).await,
        Err(KitchenError::UnitIncompatible { .. })
    ));
}
