// ABOUTME: Immutable audit rows for prepare, serve, expire and waste actions
// ABOUTME: Captures before/after stock snapshots, cost info, operator and batch details
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Operator;

/// Stock action recorded in history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    /// Stock was prepared (increase)
    Prepare,
    /// Stock was sold (decrease)
    Serve,
    /// Stock passed its shelf life and was removed (decrease)
    Expire,
    /// Stock was thrown away (decrease)
    Waste,
}

impl HistoryAction {
    /// Actions that raise stock
    #[must_use]
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::Prepare)
    }

    /// Actions that lower stock
    #[must_use]
    pub const fn is_negative(self) -> bool {
        matches!(self, Self::Serve | Self::Waste | Self::Expire)
    }

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Serve => "serve",
            Self::Expire => "expire",
            Self::Waste => "waste",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cost and revenue figures attached to a history row
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostInfo {
    /// Cost per serving
    pub unit_cost: f64,
    /// Total cost of the action
    pub total_cost: f64,
    /// Revenue the action is expected to generate
    pub estimated_revenue: f64,
}

/// Where a consumed quantity was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageSource {
    /// Raw ingredient stock, via a recipe
    Recipe,
    /// Another product's stock, via a legacy child entry
    ChildProduct,
}

/// One ingredient consumed by a preparation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientUsage {
    /// Ingredient or child product id
    pub source_id: Uuid,
    /// Display name
    pub name: String,
    /// Amount deducted
    pub quantity: f64,
    /// Unit of `quantity`
    pub unit: String,
    /// Cost of the amount deducted
    pub cost: f64,
    /// Ingredient or child product
    pub source: UsageSource,
    /// Figures are approximate because the child entry predates per-serving fields
    #[serde(default)]
    pub is_legacy_data: bool,
}

/// Batch details recorded on prepare actions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInfo {
    /// Batch identifier
    pub batch_number: Option<String>,
    /// When this batch stops being servable
    pub expiry_time: Option<DateTime<Utc>>,
    /// Ingredients deducted for this batch
    pub ingredients_used: Vec<IngredientUsage>,
}

/// Append-only audit row; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Row identifier
    pub id: Uuid,
    /// Composite product acted on
    pub product_id: Uuid,
    /// Owning store (opaque)
    pub store_id: Uuid,
    /// What happened
    pub action: HistoryAction,
    /// Servings moved (always positive)
    pub quantity: f64,
    /// Unit of `quantity`
    pub unit: String,
    /// Stock before the action
    pub stock_before: f64,
    /// Stock after the action
    pub stock_after: f64,
    /// Cost and revenue figures
    pub cost_info: CostInfo,
    /// Who did it
    pub operator: Operator,
    /// When it happened
    pub action_time: DateTime<Utc>,
    /// Batch details (prepare actions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_info: Option<BatchInfo>,
    /// Free-form note (waste reason and similar)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the row was written
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// `stock_after - stock_before`
    #[must_use]
    pub fn stock_change(&self) -> f64 {
        self.stock_after - self.stock_before
    }

    /// Whether the action raised stock
    #[must_use]
    pub const fn is_positive_action(&self) -> bool {
        self.action.is_positive()
    }

    /// Whether the action lowered stock
    #[must_use]
    pub const fn is_negative_action(&self) -> bool {
        self.action.is_negative()
    }
}
