// ABOUTME: Tool boundary exposing unit utilities and composite operations as JSON tools
// ABOUTME: Re-exports the trait, registry, context and result types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Per-call context
pub mod context;
/// Tool implementations by category
pub mod implementations;
/// Tool registry
pub mod registry;
/// Tool results
pub mod result;
/// Input schemas
pub mod schema;
/// Tool trait and capabilities
pub mod traits;

pub use context::ToolContext;
pub use registry::ToolRegistry;
pub use result::ToolResult;
pub use traits::{KitchenTool, ToolCapabilities};
