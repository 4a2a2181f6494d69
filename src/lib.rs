// ABOUTME: Main library entry point for the prepline composite-product engine
// ABOUTME: Preparation, serving, costing, freshness and history for batch-cooked menu items
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Prepline
//!
//! Back-office engine for composite products: menu items cooked in batches from
//! raw ingredients, held as ready servings, sold one serving at a time and
//! discarded once their shelf life runs out.
//!
//! ## Features
//!
//! - **Unit conversion**: a closed vocabulary (`kg`, `l`, `piece` by default)
//!   with compatibility checks and advice for legacy units
//! - **Recipe costing**: scaled ingredient cost and availability per batch
//! - **Preparation**: all-or-nothing ingredient deduction with full shortfall reports
//! - **Serving**: whole-serving sales guarded by stock and freshness
//! - **History**: an append-only ledger written in the same commit as each change
//!
//! ## Architecture
//!
//! - **Engine**: `CompositeEngine` owns every business rule
//! - **Store**: `KitchenStore` applies buffered commits atomically
//! - **Tools**: a registry of JSON tools over the engine
//! - **Clock**: injected so freshness is testable
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use prepline::clock::SystemClock;
//! use prepline::config::KitchenConfig;
//! use prepline::engine::CompositeEngine;
//! use prepline::errors::AppResult;
//! use prepline::store::InMemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let engine = CompositeEngine::new(
//!         Arc::new(InMemoryStore::new()),
//!         KitchenConfig::from_env()?,
//!         Arc::new(SystemClock),
//!     )?;
//!     println!("max batches per prepare: {}", engine.config().max_batches_per_prepare);
//!     Ok(())
//! }
//! ```

// Re-exported from the core crate so consumers need a single dependency
pub use prepline_core::{constants, errors, units};

/// Injectable time source
pub mod clock;

/// Policy configuration loaded from the environment
pub mod config;

/// Recipe costing and price roll-up
pub mod costing;

/// Preparation, serving and discard engines
pub mod engine;

/// Freshness evaluation
pub mod freshness;

/// History ledger construction and aggregation
pub mod history;

/// Structured logging setup and domain log helpers
pub mod logging;

/// Ingredient, recipe, product and history models
pub mod models;

/// Storage abstraction and the in-memory backend
pub mod store;

/// JSON tool boundary over the engine
pub mod tools;
