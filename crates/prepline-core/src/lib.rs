// ABOUTME: Core types and constants for the prepline composite-product engine
// ABOUTME: Foundation crate with error taxonomy, constants and the unit conversion service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Prepline Core
//!
//! Foundation crate shared by the prepline engines. It changes rarely and has no
//! async or storage dependencies.
//!
//! ## Modules
//!
//! - **errors**: `ErrorCode`, `AppError`, `ErrorResponse` and the typed `KitchenError`
//! - **constants**: unit symbols, policy defaults and environment variable names
//! - **units**: allowed vocabulary, compatibility, conversion and legacy-unit advice

/// Unified error handling with machine-readable codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Unit conversion service
pub mod units;
