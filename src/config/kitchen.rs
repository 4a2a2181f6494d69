// ABOUTME: Engine policy configuration (allowed units, batch cap, freshness threshold)
// ABOUTME: Environment-only loading with validation before the engine may be constructed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Kitchen policy configuration.
//!
//! The policy is an explicit value handed to the engine at construction time,
//! so tests can run the same engine under alternative policies.
//!
//! # Environment
//!
//! ```bash
//! export PREPLINE_ALLOWED_UNITS=kg,l,piece
//! export PREPLINE_MAX_BATCHES_PER_PREPARE=10
//! export PREPLINE_EXPIRING_SOON_RATIO=0.8
//! ```

use std::env;
use std::str::FromStr;

use prepline_core::constants::env_vars;
use prepline_core::constants::freshness::DEFAULT_EXPIRING_SOON_RATIO;
use prepline_core::constants::limits::{DEFAULT_MAX_BATCHES_PER_PREPARE, MAX_BATCHES_CEILING};
use prepline_core::constants::units::DEFAULT_ALLOWED_UNITS;
use prepline_core::errors::AppError;
use prepline_core::units::{lookup_unit, UnitConverter};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Value outside acceptable range
    #[error("Value out of range: {0}")]
    ValueOutOfRange(&'static str),

    /// Required configuration field is missing
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Unit symbol absent from the conversion table
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// Failed to parse configuration value
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::config(error.to_string())
    }
}

/// Policy the composite engine runs under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitchenConfig {
    /// Unit symbols stored quantities may use
    pub allowed_units: Vec<String>,
    /// Upper bound on batches per prepare call
    pub max_batches_per_prepare: u32,
    /// Share of shelf life after which stock is "expiring soon"
    pub expiring_soon_ratio: f64,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            allowed_units: DEFAULT_ALLOWED_UNITS
                .iter()
                .map(|unit| (*unit).to_owned())
                .collect(),
            max_batches_per_prepare: DEFAULT_MAX_BATCHES_PER_PREPARE,
            expiring_soon_ratio: DEFAULT_EXPIRING_SOON_RATIO,
        }
    }
}

/// Read and parse an optional environment variable
fn env_parse<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Parse(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(None),
    }
}

impl KitchenConfig {
    /// Load configuration from the environment, falling back to defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` when a variable is set but unparsable, or any
    /// validation error from [`KitchenConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let allowed_units = match env::var(env_vars::ALLOWED_UNITS) {
            Ok(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(str::trim)
                .filter(|unit| !unit.is_empty())
                .map(str::to_lowercase)
                .collect(),
            _ => defaults.allowed_units,
        };

        let config = Self {
            allowed_units,
            max_batches_per_prepare: env_parse(env_vars::MAX_BATCHES_PER_PREPARE)?
                .unwrap_or(defaults.max_batches_per_prepare),
            expiring_soon_ratio: env_parse(env_vars::EXPIRING_SOON_RATIO)?
                .unwrap_or(defaults.expiring_soon_ratio),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every field is usable
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or unknown unit vocabulary, a batch cap of zero
    /// or above the hard ceiling, or a ratio outside `(0, 1)`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_units.is_empty() {
            return Err(ConfigError::MissingField("allowed_units"));
        }
        if let Some(unknown) = self
            .allowed_units
            .iter()
            .find(|unit| lookup_unit(unit).is_none())
        {
            return Err(ConfigError::UnknownUnit(unknown.clone()));
        }
        if self.max_batches_per_prepare == 0 || self.max_batches_per_prepare > MAX_BATCHES_CEILING
        {
            return Err(ConfigError::ValueOutOfRange(
                "max_batches_per_prepare must be between 1 and 100",
            ));
        }
        let ratio = self.expiring_soon_ratio;
        if ratio.is_nan() || ratio <= 0.0 || ratio >= 1.0 {
            return Err(ConfigError::ValueOutOfRange(
                "expiring_soon_ratio must be strictly between 0 and 1",
            ));
        }
        Ok(())
    }

    /// Build the unit converter for this vocabulary
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownUnit` if a symbol is absent from the factor table.
    pub fn unit_converter(&self) -> Result<UnitConverter, ConfigError> {
        UnitConverter::new(&self.allowed_units)
            .map_err(|_| ConfigError::UnknownUnit(self.allowed_units.join(",")))
    }
}
