// ABOUTME: Prepline CLI - command-line access to unit utilities and a kitchen walkthrough
// ABOUTME: Routes every command through the tool registry and prints JSON to stdout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
//!
//! Usage:
//! ```bash
//! # List the allowed unit vocabulary
//! prepline-cli units list
//!
//! # Convert 2500 g into kilograms with an extended vocabulary
//! prepline-cli --units kg,g,l,piece units convert 2500 g kg
//!
//! # Get advice for a legacy unit
//! prepline-cli units suggest portion --quantity 12
//!
//! # Seed a kitchen, prepare, serve and print status and history
//! prepline-cli demo --batches 1 --servings 5
//! ```

mod commands;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use prepline::clock::SystemClock;
use prepline::config::KitchenConfig;
use prepline::engine::CompositeEngine;
use prepline::errors::{AppError, AppResult};
use prepline::logging::LoggingConfig;
use prepline::models::{Operator, OperatorRole};
use prepline::store::InMemoryStore;
use prepline::tools::{ToolContext, ToolRegistry};
use tracing::debug;
use uuid::Uuid;

type Result<T> = AppResult<T>;

#[derive(Parser)]
#[command(
    name = "prepline-cli",
    about = "Prepline kitchen engine CLI",
    long_about = "Unit utilities and a scripted walkthrough of preparing and serving a composite product."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Allowed unit vocabulary override (comma-separated)
    #[arg(long, global = true, value_delimiter = ',')]
    units: Vec<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Unit vocabulary and conversion utilities
    Units {
        #[command(subcommand)]
        action: UnitsCommand,
    },

    /// Seed an in-memory kitchen and run prepare, serve, status and history
    Demo {
        /// Batches to prepare
        #[arg(long, default_value = "1")]
        batches: i64,

        /// Servings to sell afterwards
        #[arg(long, default_value = "5")]
        servings: i64,
    },
}

#[non_exhaustive]
#[derive(Subcommand)]
enum UnitsCommand {
    /// List allowed units
    List,

    /// Check one unit against the vocabulary
    Validate {
        /// Unit symbol
        unit: String,
    },

    /// Convert a quantity between units
    Convert {
        /// Quantity to convert
        quantity: f64,
        /// Source unit
        from: String,
        /// Target unit
        to: String,
    },

    /// Check whether two units share a dimension
    Compatible {
        /// First unit
        from: String,
        /// Second unit
        to: String,
    },

    /// Suggest an allowed unit for a legacy one
    Suggest {
        /// Unit as stored
        unit: String,
        /// Quantity to re-express
        #[arg(long)]
        quantity: Option<f64>,
    },

    /// Compare a requirement against stock
    Check {
        /// Quantity on hand
        #[arg(long)]
        stock_quantity: f64,
        /// Unit of the stock
        #[arg(long)]
        stock_unit: String,
        /// Quantity needed
        #[arg(long)]
        required_quantity: f64,
        /// Unit of the requirement
        #[arg(long)]
        required_unit: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only JSON
    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging.level = "debug".into();
    }
    logging
        .init()
        .map_err(|e| AppError::internal(format!("Failed to initialize logging: {e}")))?;

    let mut config = KitchenConfig::from_env()?;
    if !cli.units.is_empty() {
        config.allowed_units = cli.units.iter().map(|unit| unit.to_lowercase()).collect();
    }
    debug!(units = ?config.allowed_units, "Loaded kitchen configuration");

    let store = Arc::new(InMemoryStore::new());
    let engine = Arc::new(CompositeEngine::new(
        store.clone(),
        config,
        Arc::new(SystemClock),
    )?);
    let context = ToolContext::new(
        engine,
        Operator::new(Uuid::new_v4(), "prepline-cli", OperatorRole::Manager),
    );
    let registry = ToolRegistry::with_builtin_tools();

    let ok = match cli.command {
        Command::Units { action } => commands::units::run(&registry, &context, action).await?,
        Command::Demo { batches, servings } => {
            commands::demo::run(&registry, &context, &store, batches, servings).await?
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
