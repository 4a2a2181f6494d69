// ABOUTME: Pure freshness evaluation for prepared composite stock
// ABOUTME: Derives not_prepared/fresh/expiring_soon/expired from preparation time and shelf life
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Freshness
//!
//! Status is recomputed on every read from `last_prepared_at`, the shelf life
//! and the current instant. Nothing here is stored on the entity.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use prepline_core::constants::freshness::{MS_PER_SECOND, SECONDS_PER_HOUR};
use serde::{Deserialize, Serialize};

/// Freshness of prepared stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessStatus {
    /// Never prepared
    NotPrepared,
    /// Within the first part of its shelf life
    Fresh,
    /// In the last part of its shelf life
    ExpiringSoon,
    /// Shelf life is over; cannot be served
    Expired,
}

impl FreshnessStatus {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotPrepared => "not_prepared",
            Self::Fresh => "fresh",
            Self::ExpiringSoon => "expiring_soon",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for FreshnessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a freshness evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Freshness {
    /// Derived status
    pub status: FreshnessStatus,
    /// Hours since the last preparation, absent when never prepared
    pub hours_elapsed: Option<f64>,
    /// Hours of shelf life left (0 once expired), absent when never prepared
    pub hours_remaining: Option<f64>,
}

impl Freshness {
    /// Whether stock may still be served
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        matches!(self.status, FreshnessStatus::Expired)
    }
}

/// Hours between two instants, negative when `now` precedes `since`
#[must_use]
pub fn hours_between(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - since).num_milliseconds() as f64;
    millis / MS_PER_SECOND / SECONDS_PER_HOUR
}

/// Evaluate freshness
///
/// `expired` once `hours_elapsed >= expiry_hours`; `expiring_soon` once
/// `hours_elapsed >= expiring_soon_ratio * expiry_hours`; otherwise `fresh`.
#[must_use]
pub fn evaluate(
    last_prepared_at: Option<DateTime<Utc>>,
    expiry_hours: f64,
    now: DateTime<Utc>,
    expiring_soon_ratio: f64,
) -> Freshness {
    let Some(prepared_at) = last_prepared_at else {
        return Freshness {
            status: FreshnessStatus::NotPrepared,
            hours_elapsed: None,
            hours_remaining: None,
        };
    };

    let hours_elapsed = hours_between(prepared_at, now);
    let status = if expiry_hours.is_nan() || hours_elapsed >= expiry_hours {
        FreshnessStatus::Expired
    } else if hours_elapsed >= expiring_soon_ratio * expiry_hours {
        FreshnessStatus::ExpiringSoon
    } else {
        FreshnessStatus::Fresh
    };

    Freshness {
        status,
        hours_elapsed: Some(hours_elapsed),
        hours_remaining: Some((expiry_hours - hours_elapsed).max(0.0)),
    }
}

/// Instant at which a batch prepared at `prepared_at` expires
///
/// Saturates at the latest representable instant when the shelf life runs
/// past it.
#[must_use]
pub fn expiry_time(prepared_at: DateTime<Utc>, expiry_hours: f64) -> DateTime<Utc> {
    let millis = (expiry_hours * SECONDS_PER_HOUR * MS_PER_SECOND).round() as i64;
    Duration::try_milliseconds(millis)
        .and_then(|shelf_life| prepared_at.checked_add_signed(shelf_life))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
