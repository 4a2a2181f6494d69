// ABOUTME: Central registry for kitchen tools with capability-based filtering and execution
// ABOUTME: Provides tool discovery, schema listing and a call path that renders failures as JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Tool Registry
//!
//! Built once at startup and then used immutably for lookups. All tools are
//! `Arc`-wrapped for sharing across async tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use prepline_core::errors::{AppError, AppResult};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::context::ToolContext;
use super::implementations::{composite, units};
use super::result::ToolResult;
use super::schema::ToolSchema;
use super::traits::{KitchenTool, ToolCapabilities};

/// Registry of kitchen tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn KitchenTool>>,
    categories: HashMap<String, Vec<String>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in tool
    #[must_use]
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_tools();
        registry
    }

    /// Register a tool
    ///
    /// Returns `false` if a tool with the same name already exists.
    pub fn register(&mut self, tool: Arc<dyn KitchenTool>) -> bool {
        let name = tool.name().to_owned();

        if self.tools.contains_key(&name) {
            warn!("Tool '{}' is already registered, skipping", name);
            return false;
        }

        debug!(
            "Registering tool '{}' with capabilities: {}",
            name,
            tool.capabilities().describe()
        );
        self.tools.insert(name, tool);
        true
    }

    /// Register a tool and categorize it
    pub fn register_with_category(&mut self, tool: Arc<dyn KitchenTool>, category: &str) {
        let name = tool.name().to_owned();
        if self.register(tool) {
            self.categories
                .entry(category.to_owned())
                .or_default()
                .push(name);
        }
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn KitchenTool>> {
        self.tools.get(name)
    }

    /// Check if a tool is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// All tool names, sorted
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Tool names in a category
    #[must_use]
    pub fn tools_in_category(&self, category: &str) -> Vec<&str> {
        self.categories
            .get(category)
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Schemas of every tool, sorted by name
    #[must_use]
    pub fn all_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .map(|tool| ToolSchema {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                input_schema: tool.input_schema(),
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Tools carrying every flag in `required`
    #[must_use]
    pub fn filter_by_capabilities(&self, required: ToolCapabilities) -> Vec<&Arc<dyn KitchenTool>> {
        self.tools
            .values()
            .filter(|tool| tool.capabilities().contains(required))
            .collect()
    }

    /// Names of tools that write data
    #[must_use]
    pub fn write_tools(&self) -> Vec<&str> {
        self.tools
            .iter()
            .filter(|(_, tool)| tool.capabilities().writes_data())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Execute a tool by name
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the tool is unknown or its execution fails
    pub async fn execute(&self, name: &str, args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| AppError::invalid_input(format!("Unknown tool: {name}")))?;
        tool.execute(args, context).await
    }

    /// Execute a tool and render any failure as an error result
    pub async fn call(&self, name: &str, args: Value, context: &ToolContext) -> ToolResult {
        let started = Instant::now();
        let result = self
            .execute(name, args, context)
            .await
            .unwrap_or_else(|error| ToolResult::from_app_error(&error));
        debug!(
            tool = %name,
            success = !result.is_error,
            duration_ms = started.elapsed().as_millis(),
            "Tool call completed"
        );
        result
    }

    /// Register every built-in tool
    pub fn register_builtin_tools(&mut self) {
        info!("Registering built-in tools...");

        self.register_with_category(Arc::new(units::ListAllowedUnitsTool), "units");
        self.register_with_category(Arc::new(units::ValidateUnitTool), "units");
        self.register_with_category(Arc::new(units::ConvertUnitsTool), "units");
        self.register_with_category(Arc::new(units::CheckUnitCompatibilityTool), "units");
        self.register_with_category(Arc::new(units::CheckIngredientAvailabilityTool), "units");
        self.register_with_category(Arc::new(units::SuggestUnitTool), "units");

        self.register_with_category(Arc::new(composite::PrepareCompositeProductTool), "composite");
        self.register_with_category(Arc::new(composite::ServeCompositeProductTool), "composite");
        self.register_with_category(Arc::new(composite::DiscardCompositeProductTool), "composite");
        self.register_with_category(Arc::new(composite::CheckRecipeAvailabilityTool), "composite");
        self.register_with_category(Arc::new(composite::GetCompositeStatusTool), "composite");
        self.register_with_category(Arc::new(composite::GetCompositeHistoryTool), "composite");

        info!("Registered {} tools", self.len());
    }
}
