// ABOUTME: Defines ToolContext which gives tools the engine and the acting operator
// ABOUTME: Replaces scattered parameter passing with one context object per call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;

use crate::engine::CompositeEngine;
use crate::models::Operator;

/// Resources and identity available to a tool call
#[derive(Clone)]
pub struct ToolContext {
    /// Shared engine
    pub engine: Arc<CompositeEngine>,
    /// Who is acting; recorded on history rows
    pub operator: Operator,
}

impl ToolContext {
    /// Create a context
    #[must_use]
    pub const fn new(engine: Arc<CompositeEngine>, operator: Operator) -> Self {
        Self { engine, operator }
    }
}
