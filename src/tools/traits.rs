// ABOUTME: Defines the KitchenTool trait and ToolCapabilities for the tool boundary
// ABOUTME: Tools implement this trait to be registered and executed via the ToolRegistry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Tool Trait and Capabilities
//!
//! Every external operation is exposed as a named tool that takes JSON
//! arguments and returns JSON. Capability flags let callers filter tools
//! (for example, to route writes through an approval step).

use async_trait::async_trait;
use bitflags::bitflags;
use prepline_core::errors::AppResult;
use serde_json::Value;

use super::context::ToolContext;
use super::result::ToolResult;
use super::schema::JsonSchema;

bitflags! {
    /// Capabilities that tools declare for filtering and discovery
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ToolCapabilities: u8 {
        /// Tool reads stored kitchen data
        const READS_DATA = 0b0000_0001;
        /// Tool mutates stock or appends history
        const WRITES_DATA = 0b0000_0010;
        /// Tool is a pure unit utility
        const UNITS = 0b0000_0100;
        /// Tool operates on composite products
        const COMPOSITE = 0b0000_1000;
    }
}

impl ToolCapabilities {
    /// Check if tool reads data
    #[must_use]
    pub const fn reads_data(self) -> bool {
        self.contains(Self::READS_DATA)
    }

    /// Check if tool writes data
    #[must_use]
    pub const fn writes_data(self) -> bool {
        self.contains(Self::WRITES_DATA)
    }

    /// Check if tool is stateless
    #[must_use]
    pub const fn is_pure(self) -> bool {
        !self.intersects(Self::READS_DATA.union(Self::WRITES_DATA))
    }

    /// Get a description of all enabled capabilities for logging
    #[must_use]
    pub fn describe(&self) -> String {
        let parts: Vec<&str> = [
            (Self::READS_DATA, "reads_data"),
            (Self::WRITES_DATA, "writes_data"),
            (Self::UNITS, "units"),
            (Self::COMPOSITE, "composite"),
        ]
        .iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| *name)
        .collect();

        if parts.is_empty() {
            "none".to_owned()
        } else {
            parts.join(", ")
        }
    }
}

/// The trait every tool implements
#[async_trait]
pub trait KitchenTool: Send + Sync {
    /// Unique identifier for the tool (e.g., `serve_composite_product`)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> JsonSchema;

    /// Capability flags for filtering
    fn capabilities(&self) -> ToolCapabilities;

    /// Execute the tool with given arguments and context
    ///
    /// # Errors
    ///
    /// Returns `AppError` for invalid arguments or a failed engine operation
    async fn execute(&self, args: Value, context: &ToolContext) -> AppResult<ToolResult>;
}
