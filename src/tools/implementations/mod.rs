// ABOUTME: Tool implementations organized by category, plus shared argument parsing
// ABOUTME: Unit utilities are stateless; composite tools go through the engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Composite product tools
pub mod composite;
/// Unit utility tools
pub mod units;

use prepline_core::errors::{AppError, AppResult, KitchenError};
use serde_json::Value;
use uuid::Uuid;

// ============================================================================
// Argument helpers
// ============================================================================

fn required_str<'a>(args: &'a Value, key: &str) -> AppResult<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::invalid_input(format!("Missing required parameter: {key}")))
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn required_f64(args: &Value, key: &str) -> AppResult<f64> {
    args.get(key)
        .and_then(Value::as_f64)
        .filter(|value| value.is_finite())
        .ok_or_else(|| AppError::invalid_input(format!("Missing or non-numeric parameter: {key}")))
}

fn required_uuid(args: &Value, key: &str) -> AppResult<Uuid> {
    let raw = required_str(args, key)?;
    Uuid::parse_str(raw)
        .map_err(|e| AppError::invalid_input(format!("Invalid {key} '{raw}': {e}")))
}

fn optional_uuid(args: &Value, key: &str) -> AppResult<Option<Uuid>> {
    optional_str(args, key)
        .map(|raw| {
            Uuid::parse_str(raw)
                .map_err(|e| AppError::invalid_input(format!("Invalid {key} '{raw}': {e}")))
        })
        .transpose()
}

/// Read a whole-number quantity; whole floats such as `3.0` are accepted
///
/// Missing, fractional or non-numeric values yield `None`.
fn whole_number(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    if let Some(integer) = value.as_i64() {
        return Some(integer);
    }
    let float = value.as_f64()?;
    let whole = float.is_finite()
        && float.fract().abs() < f64::EPSILON
        && float.abs() <= f64::from(u32::MAX);
    whole.then(|| float as i64)
}

/// Read a required quantity, rejecting with the operation's own error code
fn quantity_arg(
    args: &Value,
    key: &str,
    rejection: impl FnOnce(i64) -> KitchenError,
) -> AppResult<i64> {
    whole_number(args.get(key)).ok_or_else(|| rejection(0).into())
}

fn to_content<T: serde::Serialize>(value: &T) -> AppResult<super::result::ToolResult> {
    super::result::ToolResult::from_serializable(value).map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whole_number_accepts_integers_only() {
        assert_eq!(whole_number(Some(&json!(3))), Some(3));
        assert_eq!(whole_number(Some(&json!(3.0))), Some(3));
        assert_eq!(whole_number(Some(&json!(-2))), Some(-2));
        assert_eq!(whole_number(Some(&json!(2.5))), None);
        assert_eq!(whole_number(Some(&json!("3"))), None);
        assert_eq!(whole_number(None), None);
    }
}
