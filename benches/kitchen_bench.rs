// ABOUTME: Criterion benchmarks for recipe costing, unit conversion and the prepare/serve path
// ABOUTME: Runs the engine against the in-memory store on a manual clock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Criterion benchmarks for the kitchen engine.
//!
//! Pure costing and conversion are measured directly; the prepare/serve cycle
//! goes through the full commit path so lock and history costs are included.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::expect_used,
    missing_docs
)]

use std::collections::HashMap;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use prepline::clock::ManualClock;
use prepline::config::KitchenConfig;
use prepline::costing;
use prepline::engine::CompositeEngine;
use prepline::models::{CompositeInfo, Ingredient, Measure, Operator, OperatorRole, Product, Recipe};
use prepline::store::InMemoryStore;
use prepline::units::UnitConverter;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Recipe with `lines` ingredients, each stocked generously
fn recipe_with_lines(lines: usize) -> (Recipe, HashMap<Uuid, Ingredient>) {
    let store_id = Uuid::new_v4();
    let mut recipe = Recipe::new(store_id, "bench recipe", 20.0, "piece");
    let mut book = HashMap::with_capacity(lines);
    for index in 0..lines {
        let unit = if index % 2 == 0 { "kg" } else { "l" };
        let ingredient = Ingredient::new(store_id, format!("ingredient-{index}"), unit, 1e9, 1.5);
        recipe = recipe.with_ingredient(ingredient.id, 0.25, unit);
        book.insert(ingredient.id, ingredient);
    }
    (recipe, book)
}

fn bench_recipe_cost(c: &mut Criterion) {
    let converter = UnitConverter::default();
    let mut group = c.benchmark_group("recipe_cost");

    for lines in [3, 12, 48] {
        let (recipe, book) = recipe_with_lines(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &lines, |b, _| {
            b.iter(|| costing::cost_of(black_box(&recipe), &book, &converter).unwrap());
        });
    }

    group.finish();
}

fn bench_unit_convert(c: &mut Criterion) {
    let converter = UnitConverter::new(&["kg", "g", "l", "ml", "piece"]).unwrap();
    let mut group = c.benchmark_group("unit_convert");

    group.bench_function("g_to_kg", |b| {
        b.iter(|| converter.convert(black_box(1250.0), "g", "kg"));
    });
    group.bench_function("incompatible", |b| {
        b.iter(|| converter.convert(black_box(1.0), "kg", "l"));
    });
    group.bench_function("suggest_legacy", |b| {
        b.iter(|| converter.suggest_better_unit(black_box(500.0), "gam"));
    });

    group.finish();
}

fn bench_prepare_serve(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("prepare_serve");

    let (recipe, book) = recipe_with_lines(3);
    let store_id = recipe.store_id;
    let product = Product::composite(
        store_id,
        "bench-dish",
        "Bench dish",
        CompositeInfo::new(Measure::new(20.0, "piece"), 4.0).with_recipe(recipe.id),
    )
    .with_retail_price(3.0);
    let product_id = product.id;

    let store = Arc::new(InMemoryStore::new());
    rt.block_on(async {
        for ingredient in book.into_values() {
            store.insert_ingredient(ingredient).await.unwrap();
        }
        store.insert_recipe(recipe).await.unwrap();
        store.insert_product(product).await.unwrap();
    });
    let engine = CompositeEngine::new(
        store,
        KitchenConfig::default(),
        Arc::new(ManualClock::default()),
    )
    .unwrap();
    let operator = Operator::new(Uuid::new_v4(), "bench", OperatorRole::Staff);

    // One prepared batch fully served keeps the shelf at zero between iterations
    group.bench_function("prepare_then_serve_batch", |b| {
        b.iter(|| {
            rt.block_on(async {
                engine.prepare(product_id, 1, &operator).await.unwrap();
                engine.serve(product_id, 20, &operator).await.unwrap();
            });
        });
    });

    group.bench_function("status", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(engine.status(product_id).await.unwrap());
            });
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_recipe_cost,
    bench_unit_convert,
    bench_prepare_serve,
);
criterion_main!(benches);
