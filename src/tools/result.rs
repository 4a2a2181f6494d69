// ABOUTME: Defines ToolResult for tool execution responses
// ABOUTME: Success content is the operation's JSON; failures render as {error, message, details?}
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use prepline_core::errors::{AppError, ErrorResponse};
use serde::Serialize;
use serde_json::Value;

/// Result returned by tool execution
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// The result value to return to the caller
    pub content: Value,
    /// Whether this result represents an error condition
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result
    #[must_use]
    pub const fn ok(content: Value) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// Create an error result
    #[must_use]
    pub const fn error(content: Value) -> Self {
        Self {
            content,
            is_error: true,
        }
    }

    /// Create a result from a serializable value
    ///
    /// # Errors
    ///
    /// Returns the serialization error if the value cannot be converted to JSON
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::ok(serde_json::to_value(value)?))
    }

    /// Render an error in the boundary failure shape
    #[must_use]
    pub fn from_app_error(error: &AppError) -> Self {
        let response = ErrorResponse::from(error);
        Self::error(serde_json::to_value(&response).unwrap_or_else(|_| {
            serde_json::json!({ "error": response.error.as_str(), "message": response.message })
        }))
    }

    /// Machine-readable error code, if this is an error result
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        if self.is_error {
            self.content.get("error").and_then(Value::as_str)
        } else {
            None
        }
    }
}

impl Default for ToolResult {
    fn default() -> Self {
        Self::ok(Value::Null)
    }
}
