// ABOUTME: Unit utility commands for prepline-cli
// ABOUTME: Maps each subcommand onto the matching unit tool
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use prepline::errors::AppResult;
use prepline::tools::{ToolContext, ToolRegistry};
use serde_json::{json, Value};

use super::print_result;
use crate::UnitsCommand;

fn tool_call(command: UnitsCommand) -> (&'static str, Value) {
    match command {
        UnitsCommand::List => ("list_allowed_units", json!({})),
        UnitsCommand::Validate { unit } => ("validate_unit", json!({ "unit": unit })),
        UnitsCommand::Convert { quantity, from, to } => (
            "convert_units",
            json!({ "quantity": quantity, "from": from, "to": to }),
        ),
        UnitsCommand::Compatible { from, to } => {
            ("check_unit_compatibility", json!({ "from": from, "to": to }))
        }
        UnitsCommand::Suggest { unit, quantity } => (
            "suggest_unit",
            json!({ "unit": unit, "quantity": quantity.unwrap_or(1.0) }),
        ),
        UnitsCommand::Check {
            stock_quantity,
            stock_unit,
            required_quantity,
            required_unit,
        } => (
            "check_ingredient_availability",
            json!({
                "stockQuantity": stock_quantity,
                "stockUnit": stock_unit,
                "requiredQuantity": required_quantity,
                "requiredUnit": required_unit,
            }),
        ),
    }
}

/// Run a units subcommand
pub async fn run(
    registry: &ToolRegistry,
    context: &ToolContext,
    command: UnitsCommand,
) -> AppResult<bool> {
    let (tool, args) = tool_call(command);
    let result = registry.call(tool, args, context).await;
    print_result(None, &result)
}
