// ABOUTME: Logging configuration and structured logging setup for the kitchen engine
// ABOUTME: Configures log levels and formatters, plus structured events for stock mutations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Structured logging configuration

use std::env;
use std::io;

use anyhow::Result;
use prepline_core::constants::service_names;
use prepline_core::errors::KitchenError;
use serde_json::json;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::models::HistoryAction;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include thread information
    pub include_thread: bool,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for terminals
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_thread: false,
            service_name: service_names::PREPLINE.into(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_production = environment == "production";

        Self {
            level,
            format,
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_thread: is_production || env::var("LOG_INCLUDE_THREAD").is_ok(),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| service_names::PREPLINE.into()),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment,
        }
    }

    /// Initialize the global tracing subscriber
    ///
    /// Logs go to stderr so CLI output on stdout stays machine-readable.
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let env_filter = EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(env_filter);

        match self.format {
            LogFormat::Json => {
                let json_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_thread_ids(self.include_thread)
                    .with_thread_names(self.include_thread)
                    .with_target(true)
                    .with_writer(io::stderr)
                    .json();
                registry.with(json_layer).try_init()?;
            }
            LogFormat::Pretty => {
                let pretty_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_thread_ids(self.include_thread)
                    .with_thread_names(self.include_thread)
                    .with_target(true)
                    .with_writer(io::stderr);
                registry.with(pretty_layer).try_init()?;
            }
            LogFormat::Compact => {
                let compact_layer = fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stderr);
                registry.with(compact_layer).try_init()?;
            }
        }

        self.log_startup_info();
        Ok(())
    }

    fn log_startup_info(&self) {
        let config_summary = json!({
            "service": {
                "name": self.service_name,
                "version": self.service_version,
                "environment": self.environment
            },
            "logging": {
                "level": self.level,
                "format": format!("{:?}", self.format),
                "location": self.include_location,
                "thread": self.include_thread
            }
        });
        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            environment = %self.environment,
            "Logging initialised: {}",
            config_summary
        );
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Structured events for composite stock mutations
pub struct KitchenLogger;

impl KitchenLogger {
    /// A preparation was committed
    pub fn log_preparation(
        product_id: Uuid,
        batches: u32,
        servings: f64,
        recipe_batches: u32,
        total_cost: f64,
    ) {
        info!(
            product_id = %product_id,
            batches = batches,
            servings = servings,
            recipe_batches = recipe_batches,
            total_cost = total_cost,
            event_type = "composite_prepare",
            "Composite product prepared"
        );
    }

    /// Servings were sold
    pub fn log_serving(product_id: Uuid, servings: u32, remaining: f64, revenue: f64) {
        info!(
            product_id = %product_id,
            servings = servings,
            remaining = remaining,
            revenue = revenue,
            event_type = "composite_serve",
            "Composite product served"
        );
    }

    /// Stock was wasted or expired
    pub fn log_discard(product_id: Uuid, action: HistoryAction, quantity: f64, written_off: f64) {
        info!(
            product_id = %product_id,
            action = %action,
            quantity = quantity,
            written_off = written_off,
            event_type = "composite_discard",
            "Composite stock discarded"
        );
    }

    /// A caller-correctable rule rejected the request before any mutation
    pub fn log_rejection(product_id: Uuid, operation: &str, error: &KitchenError) {
        warn!(
            product_id = %product_id,
            operation = %operation,
            error_code = %error.code(),
            error = %error,
            event_type = "composite_rejected",
            "Composite operation rejected"
        );
    }

    /// The commit step failed; no retry is attempted
    pub fn log_commit_fault(product_id: Uuid, operation: &str, reason: &str) {
        error!(
            product_id = %product_id,
            operation = %operation,
            reason = %reason,
            event_type = "composite_commit_fault",
            "Composite commit failed"
        );
    }
}
