// ABOUTME: Product and composite-product models with legacy child-product entries
// ABOUTME: Composite stock is private and only mutated by the engines through crate-level methods
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Products
//!
//! A [`Product`] becomes a composite product when it carries [`CompositeInfo`].
//! The composite's `current_stock` and `last_prepared_at` are not publicly
//! writable: stock only rises through preparation and only falls through
//! serving, waste or expiry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Measure;

/// Per-serving portion of a legacy child product entry
///
/// Records created before per-serving fields existed carry neither the
/// quantity nor the unit; that state is a variant of its own rather than a
/// pair of nulls to guard at each call site.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildPortion {
    /// Both fields were recorded
    Recorded {
        /// Quantity of the child consumed per serving
        quantity_per_serving: f64,
        /// Unit of that quantity, as stored
        unit: String,
    },
    /// At least one field is missing; consumers apply the documented defaults
    Legacy {
        /// Quantity if it was recorded
        quantity_per_serving: Option<f64>,
        /// Unit if it was recorded
        unit: Option<String>,
    },
}

impl ChildPortion {
    /// Whether this entry predates the per-serving fields
    #[must_use]
    pub const fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }

    /// Effective quantity per serving (legacy default: 1)
    #[must_use]
    pub fn quantity_per_serving(&self) -> f64 {
        match self {
            Self::Recorded {
                quantity_per_serving,
                ..
            } => *quantity_per_serving,
            Self::Legacy {
                quantity_per_serving,
                ..
            } => quantity_per_serving.unwrap_or(1.0),
        }
    }

    /// Stored unit, if any
    #[must_use]
    pub fn stored_unit(&self) -> Option<&str> {
        match self {
            Self::Recorded { unit, .. } => Some(unit),
            Self::Legacy { unit, .. } => unit.as_deref(),
        }
    }
}

/// A sub-product composed into each serving of a composite product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProduct {
    /// Referenced product
    pub product_id: Uuid,
    /// Quantity per serving (absent on legacy records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_per_serving: Option<f64>,
    /// Unit of `quantity_per_serving` (absent on legacy records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Cost price snapshot
    #[serde(default)]
    pub cost_price: Option<f64>,
    /// Selling price snapshot
    #[serde(default)]
    pub selling_price: Option<f64>,
    /// Retail price snapshot
    #[serde(default)]
    pub retail_price: Option<f64>,
}

impl ChildProduct {
    /// Create a fully specified entry
    #[must_use]
    pub fn new(product_id: Uuid, quantity_per_serving: f64, unit: impl Into<String>) -> Self {
        Self {
            product_id,
            quantity_per_serving: Some(quantity_per_serving),
            unit: Some(unit.into()),
            cost_price: None,
            selling_price: None,
            retail_price: None,
        }
    }

    /// Create an entry as written before per-serving fields existed
    #[must_use]
    pub const fn legacy(product_id: Uuid) -> Self {
        Self {
            product_id,
            quantity_per_serving: None,
            unit: None,
            cost_price: None,
            selling_price: None,
            retail_price: None,
        }
    }

    /// Set the cost price snapshot
    #[must_use]
    pub const fn with_cost_price(mut self, cost_price: f64) -> Self {
        self.cost_price = Some(cost_price);
        self
    }

    /// Classify the stored per-serving fields
    #[must_use]
    pub fn portion(&self) -> ChildPortion {
        match (self.quantity_per_serving, &self.unit) {
            (Some(quantity_per_serving), Some(unit)) => ChildPortion::Recorded {
                quantity_per_serving,
                unit: unit.clone(),
            },
            (quantity_per_serving, unit) => ChildPortion::Legacy {
                quantity_per_serving,
                unit: unit.clone(),
            },
        }
    }
}

/// Batch-preparation data embedded in a composite product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeInfo {
    /// Servings produced per prepared batch
    pub capacity: Measure,
    /// Linked recipe; authoritative over `child_products` when present
    #[serde(default)]
    pub recipe_id: Option<Uuid>,
    /// Legacy/alternate composition
    #[serde(default)]
    pub child_products: Vec<ChildProduct>,
    /// Shelf life of prepared stock
    pub expiry_hours: f64,
    current_stock: f64,
    #[serde(default)]
    last_prepared_at: Option<DateTime<Utc>>,
}

impl CompositeInfo {
    /// Create composite info with empty stock
    #[must_use]
    pub fn new(capacity: Measure, expiry_hours: f64) -> Self {
        Self {
            capacity,
            recipe_id: None,
            child_products: Vec::new(),
            expiry_hours,
            current_stock: 0.0,
            last_prepared_at: None,
        }
    }

    /// Link a recipe
    #[must_use]
    pub const fn with_recipe(mut self, recipe_id: Uuid) -> Self {
        self.recipe_id = Some(recipe_id);
        self
    }

    /// Add a child product entry
    #[must_use]
    pub fn with_child(mut self, child: ChildProduct) -> Self {
        self.child_products.push(child);
        self
    }

    /// Servings currently available
    #[must_use]
    pub const fn current_stock(&self) -> f64 {
        self.current_stock
    }

    /// When stock was last prepared
    #[must_use]
    pub const fn last_prepared_at(&self) -> Option<DateTime<Utc>> {
        self.last_prepared_at
    }

    /// Record a preparation: stock rises and the freshness clock restarts
    pub(crate) fn apply_preparation(&mut self, servings: f64, prepared_at: DateTime<Utc>) {
        self.current_stock += servings;
        self.last_prepared_at = Some(prepared_at);
    }

    /// Remove served, wasted or expired servings
    pub(crate) fn apply_decrease(&mut self, servings: f64) {
        self.current_stock = (self.current_stock - servings).max(0.0);
    }
}

/// A sellable item; composite when `composite` is present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product identifier
    pub id: Uuid,
    /// Owning store (opaque)
    pub store_id: Uuid,
    /// Short product code, used for batch numbers
    pub code: String,
    /// Display name
    pub name: String,
    /// Unit stock is tracked in (simple products)
    pub unit: String,
    /// Cost price
    pub cost_price: f64,
    /// Retail price per unit or serving
    pub retail_price: f64,
    /// Stock on hand (simple products)
    #[serde(default)]
    pub stock_quantity: f64,
    /// Batch-preparation data
    #[serde(default, rename = "compositeInfo", skip_serializing_if = "Option::is_none")]
    pub composite: Option<CompositeInfo>,
}

impl Product {
    /// Create a simple (non-composite) product
    #[must_use]
    pub fn simple(
        store_id: Uuid,
        code: impl Into<String>,
        name: impl Into<String>,
        unit: impl Into<String>,
        stock_quantity: f64,
        cost_price: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id,
            code: code.into(),
            name: name.into(),
            unit: unit.into(),
            cost_price,
            retail_price: 0.0,
            stock_quantity,
            composite: None,
        }
    }

    /// Create a composite product with empty stock
    #[must_use]
    pub fn composite(
        store_id: Uuid,
        code: impl Into<String>,
        name: impl Into<String>,
        info: CompositeInfo,
    ) -> Self {
        let unit = info.capacity.unit.clone();
        Self {
            id: Uuid::new_v4(),
            store_id,
            code: code.into(),
            name: name.into(),
            unit,
            cost_price: 0.0,
            retail_price: 0.0,
            stock_quantity: 0.0,
            composite: Some(info),
        }
    }

    /// Set the retail price
    #[must_use]
    pub const fn with_retail_price(mut self, retail_price: f64) -> Self {
        self.retail_price = retail_price;
        self
    }

    /// Set the cost price
    #[must_use]
    pub const fn with_cost_price(mut self, cost_price: f64) -> Self {
        self.cost_price = cost_price;
        self
    }

    /// Whether this product is batch-prepared
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        self.composite.is_some()
    }

    /// Servings currently available, zero for simple products
    #[must_use]
    pub fn current_stock(&self) -> f64 {
        self.composite
            .as_ref()
            .map_or(0.0, CompositeInfo::current_stock)
    }
}
