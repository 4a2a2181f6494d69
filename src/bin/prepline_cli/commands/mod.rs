// ABOUTME: Command handlers for prepline-cli
// ABOUTME: Shared output helper that prints tool results as pretty JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

pub mod demo;
pub mod units;

use prepline::errors::AppResult;
use prepline::tools::ToolResult;

/// Print a tool result to stdout; returns whether it succeeded
pub fn print_result(label: Option<&str>, result: &ToolResult) -> AppResult<bool> {
    let rendered = serde_json::to_string_pretty(&result.content)?;
    match label {
        Some(label) => println!("# {label}\n{rendered}"),
        None => println!("{rendered}"),
    }
    Ok(!result.is_error)
}
