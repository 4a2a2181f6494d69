// ABOUTME: History ledger: builds immutable audit rows and summarises them for reporting
// ABOUTME: Generates batch numbers, derives before/after snapshots and filters store history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # History Ledger
//!
//! Rows are built here and appended by the store in the same commit as the
//! stock mutation they describe. There is no update or delete; corrections are
//! compensating `waste`/`expire` rows.

use chrono::{DateTime, Utc};
use prepline_core::constants::limits::{BATCH_PREFIX_LEN, FALLBACK_BATCH_PREFIX};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BatchInfo, CostInfo, HistoryAction, HistoryRecord, Operator, Product};

/// Optional parts of a history row
#[derive(Debug, Clone, Default)]
pub struct RecordExtra {
    /// Cost and revenue figures
    pub cost_info: CostInfo,
    /// Batch details; prepare rows always get one
    pub batch_info: Option<BatchInfo>,
    /// Free-form note
    pub notes: Option<String>,
}

/// Batch number `{first three letters of the code}-{timestamp millis}`
#[must_use]
pub fn batch_number(product_code: &str, at: DateTime<Utc>) -> String {
    let prefix: String = product_code
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(BATCH_PREFIX_LEN)
        .collect::<String>()
        .to_uppercase();
    let prefix = if prefix.is_empty() {
        FALLBACK_BATCH_PREFIX.to_owned()
    } else {
        prefix
    };
    format!("{prefix}-{}", at.timestamp_millis())
}

/// Build the row for an action on `product` as it stands before the action
///
/// `quantity` is the positive number of servings moved; the direction comes
/// from `action`.
#[must_use]
pub fn record(
    action: HistoryAction,
    product: &Product,
    quantity: f64,
    operator: &Operator,
    extra: RecordExtra,
    now: DateTime<Utc>,
) -> HistoryRecord {
    let stock_before = product.current_stock();
    let stock_after = if action.is_positive() {
        stock_before + quantity
    } else {
        (stock_before - quantity).max(0.0)
    };

    let batch_info = match (action, extra.batch_info) {
        (HistoryAction::Prepare, Some(mut info)) => {
            if info.batch_number.is_none() {
                info.batch_number = Some(batch_number(&product.code, now));
            }
            Some(info)
        }
        (HistoryAction::Prepare, None) => Some(BatchInfo {
            batch_number: Some(batch_number(&product.code, now)),
            ..BatchInfo::default()
        }),
        (_, other) => other,
    };

    HistoryRecord {
        id: Uuid::new_v4(),
        product_id: product.id,
        store_id: product.store_id,
        action,
        quantity,
        unit: product.unit.clone(),
        stock_before,
        stock_after,
        cost_info: extra.cost_info,
        operator: operator.clone(),
        action_time: now,
        batch_info,
        notes: extra.notes,
        created_at: now,
    }
}

/// Store-level history filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    /// Only rows with this action
    #[serde(default)]
    pub action: Option<HistoryAction>,
    /// Rows created at or after this instant
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Rows created before this instant
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    /// Whether a row passes the filter
    #[must_use]
    pub fn matches(&self, row: &HistoryRecord) -> bool {
        self.action.is_none_or(|action| row.action == action)
            && self.from.is_none_or(|from| row.created_at >= from)
            && self.to.is_none_or(|to| row.created_at < to)
    }
}

/// Totals over a set of history rows
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    /// Servings prepared
    pub prepared: f64,
    /// Servings sold
    pub served: f64,
    /// Servings thrown away
    pub wasted: f64,
    /// Servings removed after expiry
    pub expired: f64,
    /// `prepared - served - wasted - expired`
    pub net_change: f64,
    /// Sum of recorded total costs
    pub total_cost: f64,
    /// Sum of recorded estimated revenue
    pub estimated_revenue: f64,
}

/// Aggregate rows into a summary
#[must_use]
pub fn summarize(rows: &[HistoryRecord]) -> HistorySummary {
    let mut summary = rows
        .iter()
        .fold(HistorySummary::default(), |mut acc, row| {
            match row.action {
                HistoryAction::Prepare => acc.prepared += row.quantity,
                HistoryAction::Serve => acc.served += row.quantity,
                HistoryAction::Waste => acc.wasted += row.quantity,
                HistoryAction::Expire => acc.expired += row.quantity,
            }
            acc.total_cost += row.cost_info.total_cost;
            acc.estimated_revenue += row.cost_info.estimated_revenue;
            acc
        });
    summary.net_change = summary.prepared - summary.served - summary.wasted - summary.expired;
    summary
}
