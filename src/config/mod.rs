// ABOUTME: Configuration module for the kitchen engine
// ABOUTME: Environment-only policy loading with typed validation errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Engine policy configuration
pub mod kitchen;

pub use kitchen::{ConfigError, KitchenConfig};
