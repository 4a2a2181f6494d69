// ABOUTME: Serving and discard engines plus the composite status view
// ABOUTME: Guarded stock decreases for serve, waste and expire, each with one history row
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use chrono::{DateTime, Utc};
use prepline_core::constants::limits::COMMIT_ATTEMPTS;
use prepline_core::errors::KitchenError;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{retries_exhausted, storage, Attempt, CompositeEngine};
use crate::freshness::{self, Freshness};
use crate::history::{self, RecordExtra};
use crate::logging::KitchenLogger;
use crate::models::{CompositeInfo, CostInfo, HistoryAction, Measure, Operator, Product};
use crate::store::{StockDecrease, StoreError};

/// Successful serve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingResult {
    /// Stock left after serving
    pub remaining_stock: f64,
    /// `quantity_to_serve × retail_price`
    pub revenue_generated: f64,
    /// Stock before serving
    pub previous_stock: f64,
    /// History row appended with the serve
    pub history_id: Uuid,
}

/// Ways stock leaves the shelf without being sold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardAction {
    /// Thrown away
    Waste,
    /// Removed after its shelf life
    Expire,
}

impl From<DiscardAction> for HistoryAction {
    fn from(action: DiscardAction) -> Self {
        match action {
            DiscardAction::Waste => Self::Waste,
            DiscardAction::Expire => Self::Expire,
        }
    }
}

/// Successful waste or expire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscardResult {
    /// What was done
    pub action: DiscardAction,
    /// Servings removed
    pub quantity_removed: f64,
    /// Stock left
    pub remaining_stock: f64,
    /// `quantity_removed × unit_cost`
    pub written_off_value: f64,
    /// History row appended with the discard
    pub history_id: Uuid,
}

/// Read view of a composite product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeStatus {
    /// Product id
    pub product_id: Uuid,
    /// Product name
    pub name: String,
    /// Servings available
    pub current_stock: f64,
    /// Servings per prepared batch
    pub capacity: Measure,
    /// Freshness at the time of the call
    pub freshness: Freshness,
    /// When the current stock expires
    pub expires_at: Option<DateTime<Utc>>,
    /// When stock was last prepared
    pub last_prepared_at: Option<DateTime<Utc>>,
    /// Whether at least one serving can be sold now
    pub can_serve: bool,
}

impl CompositeEngine {
    fn freshness_of(&self, info: &CompositeInfo) -> Freshness {
        freshness::evaluate(
            info.last_prepared_at(),
            info.expiry_hours,
            self.clock.now(),
            self.config.expiring_soon_ratio,
        )
    }

    /// Sell servings from prepared stock
    ///
    /// Checked in order: quantity, available stock, freshness.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantityToServe`, `InsufficientStock`, `ProductExpired`,
    /// `InvalidCompositeStructure`, `ProductNotFound` or `Storage`.
    #[instrument(skip(self, operator), fields(product_id = %product_id, quantity = quantity_to_serve))]
    pub async fn serve(
        &self,
        product_id: Uuid,
        quantity_to_serve: i64,
        operator: &Operator,
    ) -> Result<ServingResult, KitchenError> {
        let outcome = self
            .serve_with_retry(product_id, quantity_to_serve, operator)
            .await;
        if let Err(error) = &outcome {
            if error.is_rejection() {
                KitchenLogger::log_rejection(product_id, "serve", error);
            }
        }
        outcome
    }

    async fn serve_with_retry(
        &self,
        product_id: Uuid,
        quantity_to_serve: i64,
        operator: &Operator,
    ) -> Result<ServingResult, KitchenError> {
        for attempt in 1..=COMMIT_ATTEMPTS {
            if let Attempt::Committed(result) = self
                .serve_inner(product_id, quantity_to_serve, operator)
                .await?
            {
                return Ok(result);
            }
            debug!(%product_id, attempt, "composite stock moved before commit, retrying serve");
        }
        Err(KitchenError::Storage(retries_exhausted(product_id, "serve")))
    }

    async fn serve_inner(
        &self,
        product_id: Uuid,
        quantity_to_serve: i64,
        operator: &Operator,
    ) -> Result<Attempt<ServingResult>, KitchenError> {
        let quantity = u32::try_from(quantity_to_serve)
            .ok()
            .filter(|quantity| *quantity > 0)
            .ok_or(KitchenError::InvalidQuantityToServe {
                requested: quantity_to_serve,
            })?;
        let (product, info) = self.load_composite(product_id).await?;

        let stock = info.current_stock();
        let servings = f64::from(quantity);
        if servings > stock {
            return Err(KitchenError::InsufficientStock {
                requested: quantity,
                available: stock,
            });
        }

        let freshness = self.freshness_of(&info);
        if freshness.is_expired() {
            return Err(KitchenError::ProductExpired {
                product_id,
                hours_elapsed: freshness.hours_elapsed.unwrap_or_default(),
                expiry_hours: info.expiry_hours,
            });
        }

        let unit_cost = self.latest_unit_cost(&product).await?;
        let revenue = servings * product.retail_price;
        let record = history::record(
            HistoryAction::Serve,
            &product,
            servings,
            operator,
            RecordExtra {
                cost_info: CostInfo {
                    unit_cost,
                    total_cost: servings * unit_cost,
                    estimated_revenue: revenue,
                },
                ..RecordExtra::default()
            },
            self.clock.now(),
        );
        let history_id = record.id;

        let updated = match self
            .store
            .commit_stock_decrease(StockDecrease {
                product_id,
                expected_stock: stock,
                quantity: servings,
                history: record,
            })
            .await
        {
            Ok(updated) => updated,
            Err(StoreError::Stale { .. }) => return Ok(Attempt::Stale),
            Err(error) => return Err(decrease_error(product_id, "serve", quantity, error)),
        };

        KitchenLogger::log_serving(product_id, quantity, updated.current_stock(), revenue);

        Ok(Attempt::Committed(ServingResult {
            remaining_stock: updated.current_stock(),
            revenue_generated: revenue,
            previous_stock: stock,
            history_id,
        }))
    }

    /// Remove stock as waste or expiry
    ///
    /// `waste` needs an explicit quantity. `expire` without a quantity removes
    /// everything on the shelf and is allowed whatever the freshness status.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantityToDiscard`, `InsufficientStock`,
    /// `InvalidCompositeStructure`, `ProductNotFound` or `Storage`.
    #[instrument(skip(self, operator, reason), fields(product_id = %product_id, action = ?action))]
    pub async fn discard(
        &self,
        product_id: Uuid,
        action: DiscardAction,
        quantity: Option<i64>,
        operator: &Operator,
        reason: Option<String>,
    ) -> Result<DiscardResult, KitchenError> {
        let outcome = self
            .discard_with_retry(product_id, action, quantity, operator, reason)
            .await;
        if let Err(error) = &outcome {
            if error.is_rejection() {
                KitchenLogger::log_rejection(product_id, "discard", error);
            }
        }
        outcome
    }

    async fn discard_with_retry(
        &self,
        product_id: Uuid,
        action: DiscardAction,
        quantity: Option<i64>,
        operator: &Operator,
        reason: Option<String>,
    ) -> Result<DiscardResult, KitchenError> {
        for attempt in 1..=COMMIT_ATTEMPTS {
            if let Attempt::Committed(result) = self
                .discard_inner(product_id, action, quantity, operator, reason.clone())
                .await?
            {
                return Ok(result);
            }
            debug!(%product_id, attempt, "composite stock moved before commit, retrying discard");
        }
        Err(KitchenError::Storage(retries_exhausted(product_id, "discard")))
    }

    async fn discard_inner(
        &self,
        product_id: Uuid,
        action: DiscardAction,
        quantity: Option<i64>,
        operator: &Operator,
        reason: Option<String>,
    ) -> Result<Attempt<DiscardResult>, KitchenError> {
        let requested = match (action, quantity) {
            (_, Some(requested)) => Some(
                u32::try_from(requested)
                    .ok()
                    .filter(|quantity| *quantity > 0)
                    .ok_or(KitchenError::InvalidQuantityToDiscard { requested })?,
            ),
            (DiscardAction::Expire, None) => None,
            (DiscardAction::Waste, None) => {
                return Err(KitchenError::InvalidQuantityToDiscard { requested: 0 })
            }
        };
        let (product, info) = self.load_composite(product_id).await?;

        let stock = info.current_stock();
        let removed = requested.map_or(stock, f64::from);
        if stock <= 0.0 || removed > stock {
            return Err(KitchenError::InsufficientStock {
                requested: requested.unwrap_or(0),
                available: stock,
            });
        }

        let unit_cost = self.latest_unit_cost(&product).await?;
        let written_off = removed * unit_cost;
        let record = history::record(
            action.into(),
            &product,
            removed,
            operator,
            RecordExtra {
                cost_info: CostInfo {
                    unit_cost,
                    total_cost: written_off,
                    estimated_revenue: 0.0,
                },
                batch_info: None,
                notes: reason,
            },
            self.clock.now(),
        );
        let history_id = record.id;

        let updated = match self
            .store
            .commit_stock_decrease(StockDecrease {
                product_id,
                expected_stock: stock,
                quantity: removed,
                history: record,
            })
            .await
        {
            Ok(updated) => updated,
            Err(StoreError::Stale { .. }) => return Ok(Attempt::Stale),
            Err(error) => {
                return Err(decrease_error(
                    product_id,
                    "discard",
                    requested.unwrap_or(0),
                    error,
                ))
            }
        };

        KitchenLogger::log_discard(product_id, action.into(), removed, written_off);

        Ok(Attempt::Committed(DiscardResult {
            action,
            quantity_removed: removed,
            remaining_stock: updated.current_stock(),
            written_off_value: written_off,
            history_id,
        }))
    }

    /// Current stock, freshness and servability of a composite product
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound`, `InvalidCompositeStructure` or `Storage`.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn status(&self, product_id: Uuid) -> Result<CompositeStatus, KitchenError> {
        let (product, info) = self.load_composite(product_id).await?;
        let freshness = self.freshness_of(&info);
        let current_stock = info.current_stock();
        Ok(CompositeStatus {
            product_id,
            name: product.name,
            current_stock,
            capacity: info.capacity.clone(),
            freshness,
            expires_at: info
                .last_prepared_at()
                .map(|prepared| freshness::expiry_time(prepared, info.expiry_hours)),
            last_prepared_at: info.last_prepared_at(),
            can_serve: current_stock >= 1.0 && !freshness.is_expired(),
        })
    }

    /// Cost per serving of the most recent preparation, else the product's cost price
    async fn latest_unit_cost(&self, product: &Product) -> Result<f64, KitchenError> {
        Ok(self
            .store
            .latest_history(product.id, HistoryAction::Prepare)
            .await
            .map_err(storage)?
            .map_or(product.cost_price, |row| row.cost_info.unit_cost))
    }
}

fn decrease_error(product_id: Uuid, operation: &str, requested: u32, error: StoreError) -> KitchenError {
    match error {
        StoreError::Conflict { available, .. } => KitchenError::InsufficientStock {
            requested,
            available,
        },
        other => {
            let reason = other.to_string();
            KitchenLogger::log_commit_fault(product_id, operation, &reason);
            KitchenError::Storage(reason)
        }
    }
}
