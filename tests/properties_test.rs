// ABOUTME: Invariant tests across operation sequences and concurrent callers
// ABOUTME: Stock conservation, all-or-nothing commits, non-negative stock and unit round trips
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

mod common;

use std::sync::Arc;

use common::{approx, kitchen, kitchen_with, OpeningStock};
use prepline::config::KitchenConfig;
use prepline::constants::units::{KILOGRAM, LITER};
use prepline::engine::DiscardAction;
use prepline::errors::KitchenError;
use prepline::history::{self, HistoryFilter};
use prepline::units::UnitConverter;

// ============================================================================
// Conservation
// ============================================================================

#[tokio::test]
async fn test_shelf_equals_history_net_change() {
    let kitchen = kitchen().await;
    let engine = &kitchen.engine;
    let op = &kitchen.operator;

    engine.prepare(kitchen.product, 1, op).await.unwrap();
    engine.serve(kitchen.product, 12, op).await.unwrap();
    engine.serve(kitchen.product, 60, op).await.unwrap_err();
    engine.prepare(kitchen.product, 1, op).await.unwrap();
    engine
        .discard(kitchen.product, DiscardAction::Waste, Some(7), op, None)
        .await
        .unwrap();
    engine.serve(kitchen.product, 30, op).await.unwrap();
    kitchen.clock.advance_hours(5);
    engine.serve(kitchen.product, 1, op).await.unwrap_err();
    engine
        .discard(kitchen.product, DiscardAction::Expire, None, op, None)
        .await
        .unwrap();

    let rows = engine
        .history_for_store(kitchen.store_id, &HistoryFilter::default())
        .await
        .unwrap();
    let summary = history::summarize(&rows);
    assert_eq!(rows.len(), 6);
    assert!(approx(summary.net_change, kitchen.shelf().await));
    assert!(approx(kitchen.shelf().await, 0.0));

    // Ingredient deductions match recorded usage
    let recorded_rice: f64 = rows
        .iter()
        .filter_map(|row| row.batch_info.as_ref())
        .flat_map(|batch| &batch.ingredients_used)
        .filter(|usage| usage.source_id == kitchen.rice)
        .map(|usage| usage.quantity)
        .sum();
    assert!(approx(recorded_rice, 15.0));
    assert!(approx(
        kitchen.ingredient_stock(kitchen.rice).await,
        20.0 - recorded_rice
    ));
}

// ============================================================================
// Atomicity under concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_prepares_never_overdraw() {
    // Meat covers exactly two preparations of 4.5 kg
    let kitchen = kitchen_with(
        OpeningStock {
            meat_kg: 10.0,
            rice_kg: 100.0,
            water_l: 100.0,
        },
        KitchenConfig::default(),
    )
    .await;

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let engine = Arc::clone(&kitchen.engine);
            let operator = kitchen.operator.clone();
            let product = kitchen.product;
            tokio::spawn(async move { engine.prepare(product, 1, &operator).await })
        })
        .collect();

    let mut committed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(KitchenError::InsufficientIngredients { shortfalls }) => {
                assert_eq!(shortfalls[0].name, "meat");
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(committed, 2);
    assert!(approx(kitchen.ingredient_stock(kitchen.meat).await, 1.0));
    assert!(approx(kitchen.ingredient_stock(kitchen.rice).await, 85.0));
    assert!(approx(kitchen.shelf().await, 100.0));
    assert_eq!(kitchen.store.history_len().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_serves_record_consistent_history() {
    let kitchen = kitchen().await;
    kitchen
        .engine
        .prepare(kitchen.product, 1, &kitchen.operator)
        .await
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&kitchen.engine);
            let operator = kitchen.operator.clone();
            let product = kitchen.product;
            tokio::spawn(async move { engine.serve(product, 10, &operator).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert!(approx(kitchen.shelf().await, 10.0));
    let rows = kitchen
        .engine
        .history_for_product(kitchen.product, None)
        .await
        .unwrap();
    assert_eq!(rows.len(), 5);
    for pair in rows.windows(2) {
        assert!(approx(pair[0].stock_before, pair[1].stock_after));
    }
}

#[tokio::test]
async fn test_failed_operations_leave_no_trace() {
    let kitchen = kitchen_with(
        OpeningStock {
            water_l: 1.0,
            ..OpeningStock::default()
        },
        KitchenConfig::default(),
    )
    .await;
    let op = &kitchen.operator;

    kitchen.engine.prepare(kitchen.product, 1, op).await.unwrap_err();
    kitchen.engine.prepare(kitchen.product, 0, op).await.unwrap_err();
    kitchen.engine.serve(kitchen.product, 1, op).await.unwrap_err();
    kitchen
        .engine
        .discard(kitchen.product, DiscardAction::Waste, None, op, None)
        .await
        .unwrap_err();

    assert_eq!(kitchen.store.history_len().await, 0);
    assert!(approx(kitchen.ingredient_stock(kitchen.rice).await, 20.0));
    assert!(approx(kitchen.ingredient_stock(kitchen.meat).await, 10.0));
    assert!(approx(kitchen.ingredient_stock(kitchen.water).await, 1.0));
    assert!(approx(kitchen.shelf().await, 0.0));
}

// ============================================================================
// Non-negativity
// ============================================================================

#[tokio::test]
async fn test_stock_never_negative() {
    let kitchen = kitchen_with(
        OpeningStock {
            rice_kg: 7.5,
            meat_kg: 4.5,
            water_l: 9.0,
        },
        KitchenConfig::default(),
    )
    .await;
    let op = &kitchen.operator;

    // Exact stock is enough for one preparation, and not a gram more
    kitchen.engine.prepare(kitchen.product, 1, op).await.unwrap();
    kitchen.engine.prepare(kitchen.product, 1, op).await.unwrap_err();
    for id in [kitchen.rice, kitchen.meat, kitchen.water] {
        let stock = kitchen.ingredient_stock(id).await;
        assert!(stock >= 0.0 && approx(stock, 0.0));
    }

    kitchen.engine.serve(kitchen.product, 50, op).await.unwrap();
    kitchen.engine.serve(kitchen.product, 1, op).await.unwrap_err();
    assert!(approx(kitchen.shelf().await, 0.0));
}

// ============================================================================
// Unit round trips
// ============================================================================

#[test]
fn test_unit_round_trip_is_identity() {
    let converter = UnitConverter::new(&["kg", "g", "l", "ml", "piece"]).unwrap();
    for quantity in [0.0, 0.001, 1.0, 2.5, 1234.5678] {
        for (a, b) in [(KILOGRAM, "g"), (LITER, "ml"), ("piece", "piece")] {
            let there = converter.convert(quantity, a, b).unwrap();
            let back = converter.convert(there, b, a).unwrap();
            assert!((back - quantity).abs() <= 1e-9 * quantity.max(1.0));
        }
    }
}
