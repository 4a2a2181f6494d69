// ABOUTME: Unit utility tools over the configured unit converter
// ABOUTME: Implements list_allowed_units, validate_unit, convert_units, check_unit_compatibility and more
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Unit Tools
//!
//! Stateless wrappers over the Unit Conversion Service. None of them read or
//! write stored data.

use async_trait::async_trait;
use prepline_core::errors::{AppResult, KitchenError};
use serde_json::{json, Value};

use super::{required_f64, required_str, to_content};
use crate::tools::context::ToolContext;
use crate::tools::result::ToolResult;
use crate::tools::schema::JsonSchema;
use crate::tools::traits::{KitchenTool, ToolCapabilities};

// ============================================================================
// ListAllowedUnitsTool
// ============================================================================

/// Lists the allowed unit vocabulary
pub struct ListAllowedUnitsTool;

#[async_trait]
impl KitchenTool for ListAllowedUnitsTool {
    fn name(&self) -> &'static str {
        "list_allowed_units"
    }

    fn description(&self) -> &'static str {
        "List the units stored quantities may use, with their dimension"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(&[], &[])
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::UNITS
    }

    async fn execute(&self, _args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        let units = context.engine.converter().allowed_units();
        Ok(ToolResult::ok(json!({
            "units": units,
            "count": units.len(),
        })))
    }
}

// ============================================================================
// ValidateUnitTool
// ============================================================================

/// Checks one unit against the vocabulary
pub struct ValidateUnitTool;

#[async_trait]
impl KitchenTool for ValidateUnitTool {
    fn name(&self) -> &'static str {
        "validate_unit"
    }

    fn description(&self) -> &'static str {
        "Check whether a unit is allowed; disallowed units come with an advisory suggestion"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(&[("unit", "string", "Unit symbol to check")], &["unit"])
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::UNITS
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        let unit = required_str(&args, "unit")?;
        let converter = context.engine.converter();
        let valid = converter.is_unit_allowed(unit);
        Ok(ToolResult::ok(json!({
            "unit": unit,
            "valid": valid,
            "dimension": converter.dimension_of(unit),
            "suggestion": (!valid).then(|| converter.suggest_better_unit(1.0, unit)),
        })))
    }
}

// ============================================================================
// ConvertUnitsTool
// ============================================================================

/// Converts a quantity between two allowed units
pub struct ConvertUnitsTool;

#[async_trait]
impl KitchenTool for ConvertUnitsTool {
    fn name(&self) -> &'static str {
        "convert_units"
    }

    fn description(&self) -> &'static str {
        "Convert a quantity between two compatible allowed units"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            &[
                ("quantity", "number", "Quantity to convert"),
                ("from", "string", "Source unit"),
                ("to", "string", "Target unit"),
            ],
            &["quantity", "from", "to"],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::UNITS
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        let quantity = required_f64(&args, "quantity")?;
        let from = required_str(&args, "from")?;
        let to = required_str(&args, "to")?;

        let result = context
            .engine
            .converter()
            .convert(quantity, from, to)
            .ok_or_else(|| KitchenError::ConversionFailed {
                quantity,
                from: from.to_owned(),
                to: to.to_owned(),
            })?;
        Ok(ToolResult::ok(json!({
            "quantity": quantity,
            "from": from,
            "to": to,
            "result": result,
        })))
    }
}

// ============================================================================
// CheckUnitCompatibilityTool
// ============================================================================

/// Tells whether two units measure the same dimension
pub struct CheckUnitCompatibilityTool;

#[async_trait]
impl KitchenTool for CheckUnitCompatibilityTool {
    fn name(&self) -> &'static str {
        "check_unit_compatibility"
    }

    fn description(&self) -> &'static str {
        "Check whether two allowed units measure the same dimension"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            &[
                ("from", "string", "First unit"),
                ("to", "string", "Second unit"),
            ],
            &["from", "to"],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::UNITS
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        let from = required_str(&args, "from")?;
        let to = required_str(&args, "to")?;
        let converter = context.engine.converter();
        Ok(ToolResult::ok(json!({
            "from": from,
            "to": to,
            "compatible": converter.are_units_compatible(from, to),
            "fromDimension": converter.dimension_of(from),
            "toDimension": converter.dimension_of(to),
        })))
    }
}

// ============================================================================
// CheckIngredientAvailabilityTool
// ============================================================================

/// Compares raw stock and requirement figures
pub struct CheckIngredientAvailabilityTool;

#[async_trait]
impl KitchenTool for CheckIngredientAvailabilityTool {
    fn name(&self) -> &'static str {
        "check_ingredient_availability"
    }

    fn description(&self) -> &'static str {
        "Compare a required quantity against stock, converting into the stock unit first"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            &[
                ("stockQuantity", "number", "Quantity on hand"),
                ("stockUnit", "string", "Unit of the stock"),
                ("requiredQuantity", "number", "Quantity needed"),
                ("requiredUnit", "string", "Unit of the requirement"),
            ],
            &["stockQuantity", "stockUnit", "requiredQuantity", "requiredUnit"],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::UNITS
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        let check = context.engine.converter().check_ingredient_availability(
            required_f64(&args, "stockQuantity")?,
            required_str(&args, "stockUnit")?,
            required_f64(&args, "requiredQuantity")?,
            required_str(&args, "requiredUnit")?,
        );
        to_content(&check)
    }
}

// ============================================================================
// SuggestUnitTool
// ============================================================================

/// Advises a canonical unit for a legacy symbol
pub struct SuggestUnitTool;

#[async_trait]
impl KitchenTool for SuggestUnitTool {
    fn name(&self) -> &'static str {
        "suggest_unit"
    }

    fn description(&self) -> &'static str {
        "Suggest an allowed unit for a legacy unit; advisory only, nothing is changed"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            &[
                ("unit", "string", "Unit as currently stored"),
                ("quantity", "number", "Optional quantity to re-express (default 1)"),
            ],
            &["unit"],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::UNITS
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> AppResult<ToolResult> {
        let unit = required_str(&args, "unit")?;
        let quantity = args.get("quantity").and_then(Value::as_f64).unwrap_or(1.0);
        to_content(&context.engine.converter().suggest_better_unit(quantity, unit))
    }
}
