// ABOUTME: Application constants for the composite-product engine organized by domain
// ABOUTME: Unit symbols, policy defaults, time conversions and environment variable names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Constants module
//!
//! Constants are grouped into small domain modules so call sites read as
//! `units::KILOGRAM` or `limits::MAX_BATCHES_CEILING` rather than bare literals.

/// Canonical unit symbols and the default allowed vocabulary
pub mod units {
    /// Canonical mass unit
    pub const KILOGRAM: &str = "kg";
    /// Canonical volume unit
    pub const LITER: &str = "l";
    /// Canonical count unit
    pub const PIECE: &str = "piece";

    /// The narrowed vocabulary stored quantities must use
    pub const DEFAULT_ALLOWED_UNITS: [&str; 3] = [KILOGRAM, LITER, PIECE];

    /// Unit suggested for legacy units whose dimension cannot be inferred
    pub const FALLBACK_SUGGESTED_UNIT: &str = KILOGRAM;

    /// Tolerance used when comparing converted floating-point quantities
    pub const QUANTITY_EPSILON: f64 = 1e-9;
}

/// Preparation limits
pub mod limits {
    /// Default cap on batches a single prepare call may request
    pub const DEFAULT_MAX_BATCHES_PER_PREPARE: u32 = 10;

    /// Hard ceiling no configuration may exceed
    pub const MAX_BATCHES_CEILING: u32 = 100;

    /// Default number of history rows returned by product history queries
    pub const DEFAULT_HISTORY_LIMIT: usize = 50;

    /// Attempts at a commit whose composite snapshot keeps going stale
    pub const COMMIT_ATTEMPTS: u32 = 5;

    /// Number of product-code characters used as the batch number prefix
    pub const BATCH_PREFIX_LEN: usize = 3;

    /// Batch prefix used when a product has no usable code
    pub const FALLBACK_BATCH_PREFIX: &str = "BAT";
}

/// Freshness policy defaults
pub mod freshness {
    /// Share of shelf life after which stock is reported as expiring soon
    pub const DEFAULT_EXPIRING_SOON_RATIO: f64 = 0.8;

    /// Seconds per hour, for elapsed-time conversion
    pub const SECONDS_PER_HOUR: f64 = 3600.0;

    /// Milliseconds per second
    pub const MS_PER_SECOND: f64 = 1000.0;
}

/// Environment variable names read by configuration loaders
pub mod env_vars {
    /// Comma-separated list of allowed unit symbols
    pub const ALLOWED_UNITS: &str = "PREPLINE_ALLOWED_UNITS";
    /// Maximum batches per prepare call
    pub const MAX_BATCHES_PER_PREPARE: &str = "PREPLINE_MAX_BATCHES_PER_PREPARE";
    /// Expiring-soon threshold ratio
    pub const EXPIRING_SOON_RATIO: &str = "PREPLINE_EXPIRING_SOON_RATIO";
}

/// Service identity used in structured logs
pub mod service_names {
    /// Default service name
    pub const PREPLINE: &str = "prepline";
}
