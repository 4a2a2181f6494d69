// ABOUTME: Composite product tools: prepare, serve, discard, availability, status and history
// ABOUTME: Parses JSON arguments and delegates to the composite engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prepline_core::constants::limits::MAX_BATCHES_CEILING;
use prepline_core::errors::{AppError, AppResult, KitchenError};
use serde_json::{json, Value};
use tracing::debug;

use super::{optional_str, optional_uuid, quantity_arg, required_uuid, to_content, whole_number};
use crate::engine::DiscardAction;
use crate::history::{self, HistoryFilter};
use crate::models::HistoryAction;
use crate::tools::context::ToolContext;
use crate::tools::result::ToolResult;
use crate::tools::schema::JsonSchema;
use crate::tools::traits::{KitchenTool, ToolCapabilities};

fn parse_action<T: serde::de::DeserializeOwned>(raw: &str, key: &str) -> AppResult<T> {
    serde_json::from_value(Value::String(raw.to_owned()))
        .map_err(|_| AppError::invalid_input(format!("Unknown {key} '{raw}'")))
}

fn optional_timestamp(args: &Value, key: &str) -> AppResult<Option<DateTime<Utc>>> {
    optional_str(args, key)
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|e| AppError::invalid_input(format!("Invalid {key} '{raw}': {e}")))
        })
        .transpose()
}

// ============================================================================
// PrepareCompositeProductTool
// ============================================================================

/// Prepares batches of a composite product
pub struct PrepareCompositeProductTool;

#[async_trait]
impl KitchenTool for PrepareCompositeProductTool {
    fn name(&self) -> &'static str {
        "prepare_composite_product"
    }

    fn description(&self) -> &'static str {
        "Prepare batches of a composite product, deducting ingredients and recording history atomically"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            &[
                ("productId", "string", "Composite product UUID"),
                ("quantityToPrepare", "integer", "Number of batches to prepare"),
            ],
            &["productId", "quantityToPrepare"],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::WRITES_DATA | ToolCapabilities::COMPOSITE
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        let product_id = required_uuid(&args, "productId")?;
        let max = context.engine.config().max_batches_per_prepare;
        let quantity = quantity_arg(&args, "quantityToPrepare", |requested| {
            KitchenError::InvalidQuantityToPrepare {
                requested,
                min: 1,
                max,
            }
        })?;

        let result = context
            .engine
            .prepare(product_id, quantity, &context.operator)
            .await?;
        to_content(&result)
    }
}

// ============================================================================
// ServeCompositeProductTool
// ============================================================================

/// Sells servings from prepared stock
pub struct ServeCompositeProductTool;

#[async_trait]
impl KitchenTool for ServeCompositeProductTool {
    fn name(&self) -> &'static str {
        "serve_composite_product"
    }

    fn description(&self) -> &'static str {
        "Serve whole servings from prepared stock; expired stock cannot be served"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            &[
                ("productId", "string", "Composite product UUID"),
                ("quantityToServe", "integer", "Number of servings to sell"),
            ],
            &["productId", "quantityToServe"],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::WRITES_DATA | ToolCapabilities::COMPOSITE
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        let product_id = required_uuid(&args, "productId")?;
        let quantity = quantity_arg(&args, "quantityToServe", |requested| {
            KitchenError::InvalidQuantityToServe { requested }
        })?;

        let result = context
            .engine
            .serve(product_id, quantity, &context.operator)
            .await?;
        to_content(&result)
    }
}

// ============================================================================
// DiscardCompositeProductTool
// ============================================================================

/// Writes off prepared stock as waste or expiry
pub struct DiscardCompositeProductTool;

#[async_trait]
impl KitchenTool for DiscardCompositeProductTool {
    fn name(&self) -> &'static str {
        "discard_composite_product"
    }

    fn description(&self) -> &'static str {
        "Remove prepared stock as waste or expiry; expire without a quantity clears the shelf"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            &[
                ("productId", "string", "Composite product UUID"),
                ("action", "string", "Either 'waste' or 'expire'"),
                ("quantity", "integer", "Servings to remove (required for waste)"),
                ("reason", "string", "Free-text note stored on the history row"),
            ],
            &["productId", "action"],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::WRITES_DATA | ToolCapabilities::COMPOSITE
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        let product_id = required_uuid(&args, "productId")?;
        let action: DiscardAction = parse_action(
            optional_str(&args, "action").unwrap_or_default(),
            "action",
        )?;
        let quantity = match args.get("quantity") {
            None | Some(Value::Null) => None,
            Some(_) => Some(quantity_arg(&args, "quantity", |requested| {
                KitchenError::InvalidQuantityToDiscard { requested }
            })?),
        };
        let reason = optional_str(&args, "reason").map(str::to_owned);

        let result = context
            .engine
            .discard(product_id, action, quantity, &context.operator, reason)
            .await?;
        to_content(&result)
    }
}

// ============================================================================
// CheckRecipeAvailabilityTool
// ============================================================================

/// Reports whether a product or recipe can be prepared right now
pub struct CheckRecipeAvailabilityTool;

#[async_trait]
impl KitchenTool for CheckRecipeAvailabilityTool {
    fn name(&self) -> &'static str {
        "check_recipe_availability"
    }

    fn description(&self) -> &'static str {
        "List every missing ingredient for a product preparation or a number of recipe batches"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            &[
                ("productId", "string", "Composite product UUID"),
                ("quantityToPrepare", "integer", "Batches of the product (default 1)"),
                ("recipeId", "string", "Recipe UUID, used when productId is absent"),
                ("recipeBatches", "integer", "Recipe batches, 1 to 100 (default 1)"),
            ],
            &[],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::COMPOSITE
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        if let Some(product_id) = optional_uuid(&args, "productId")? {
            let quantity = whole_number(args.get("quantityToPrepare")).unwrap_or(1);
            let availability = context
                .engine
                .check_availability(product_id, quantity)
                .await?;
            return to_content(&availability);
        }

        let Some(recipe_id) = optional_uuid(&args, "recipeId")? else {
            return Err(AppError::invalid_input(
                "Either productId or recipeId is required",
            ));
        };
        let batches = match args.get("recipeBatches") {
            None | Some(Value::Null) => 1,
            Some(raw) => whole_number(Some(raw))
                .and_then(|batches| u32::try_from(batches).ok())
                .filter(|batches| (1..=MAX_BATCHES_CEILING).contains(batches))
                .ok_or_else(|| {
                    AppError::invalid_input(format!(
                        "recipeBatches must be a whole number between 1 and {MAX_BATCHES_CEILING}, got {raw}"
                    ))
                })?,
        };
        debug!(%recipe_id, batches, "Checking recipe availability");
        let availability = context
            .engine
            .recipe_availability(recipe_id, batches)
            .await?;
        to_content(&availability)
    }
}

// ============================================================================
// GetCompositeStatusTool
// ============================================================================

/// Stock, freshness and optionally costing of one composite product
pub struct GetCompositeStatusTool;

#[async_trait]
impl KitchenTool for GetCompositeStatusTool {
    fn name(&self) -> &'static str {
        "get_composite_status"
    }

    fn description(&self) -> &'static str {
        "Current stock and freshness of a composite product, with optional price roll-up and child breakdown"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            &[
                ("productId", "string", "Composite product UUID"),
                ("includeCosting", "boolean", "Add price roll-up and child breakdown"),
            ],
            &["productId"],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::COMPOSITE
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        let product_id = required_uuid(&args, "productId")?;
        let include_costing = args
            .get("includeCosting")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let status = context.engine.status(product_id).await?;
        let mut content = serde_json::to_value(&status)?;
        if include_costing {
            let rollup = context.engine.price_rollup(product_id).await?;
            let children = context.engine.child_product_breakdown(product_id).await?;
            content["priceRollup"] = serde_json::to_value(&rollup)?;
            content["childProducts"] = serde_json::to_value(&children)?;
        }
        Ok(ToolResult::ok(content))
    }
}

// ============================================================================
// GetCompositeHistoryTool
// ============================================================================

/// History rows plus totals, per product or per store
pub struct GetCompositeHistoryTool;

#[async_trait]
impl KitchenTool for GetCompositeHistoryTool {
    fn name(&self) -> &'static str {
        "get_composite_history"
    }

    fn description(&self) -> &'static str {
        "Newest-first history for a product, or a filtered store history, with totals"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            &[
                ("productId", "string", "Composite product UUID"),
                ("limit", "integer", "Maximum rows for a product query"),
                ("storeId", "string", "Store UUID, used when productId is absent"),
                ("action", "string", "Only rows with this action"),
                ("from", "string", "RFC 3339 lower bound (inclusive)"),
                ("to", "string", "RFC 3339 upper bound (exclusive)"),
            ],
            &[],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::COMPOSITE
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        let rows = if let Some(product_id) = optional_uuid(&args, "productId")? {
            let limit = whole_number(args.get("limit"))
                .filter(|limit| *limit > 0)
                .map(|limit| limit as usize);
            context
                .engine
                .history_for_product(product_id, limit)
                .await?
        } else if let Some(store_id) = optional_uuid(&args, "storeId")? {
            let filter = HistoryFilter {
                action: optional_str(&args, "action")
                    .map(|raw| parse_action::<HistoryAction>(raw, "action"))
                    .transpose()?,
                from: optional_timestamp(&args, "from")?,
                to: optional_timestamp(&args, "to")?,
            };
            context.engine.history_for_store(store_id, &filter).await?
        } else {
            return Err(AppError::invalid_input(
                "Either productId or storeId is required",
            ));
        };

        Ok(ToolResult::ok(json!({
            "summary": history::summarize(&rows),
            "count": rows.len(),
            "records": rows,
        })))
    }
}
