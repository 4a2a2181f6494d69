// ABOUTME: Preparation engine: turns prepared batches into composite stock
// ABOUTME: Availability-first check, then one atomic commit of deductions, stock and history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use prepline_core::constants::limits::COMMIT_ATTEMPTS;
use prepline_core::errors::KitchenError;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::requirements::IngredientRequirement;
use super::{retries_exhausted, Attempt, CompositeEngine};
use crate::costing::{MissingIngredient, RecipeAvailability};
use crate::freshness;
use crate::history::{self, RecordExtra};
use crate::logging::KitchenLogger;
use crate::models::{BatchInfo, CostInfo, HistoryAction, Operator};
use crate::store::{PreparationCommit, StoreError};

/// Per-ingredient line of a preparation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredIngredientEntry {
    /// Ingredient or child product name
    pub name: String,
    /// Amount consumed
    pub needed: f64,
    /// Unit of `needed`
    pub unit: String,
    /// Stock before the deduction
    pub available: f64,
    /// Recipe batches the amount was scaled to
    pub recipe_batches_needed: u32,
    /// Figures rely on legacy defaults
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_legacy_data: bool,
}

/// Stock and cost figures of a preparation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparationDetails {
    /// Composite stock after the preparation
    pub new_stock: f64,
    /// Composite stock before the preparation
    pub previous_stock: f64,
    /// Generated batch number
    pub batch_number: Option<String>,
    /// When the prepared stock expires
    pub expiry_time: DateTime<Utc>,
    /// Ingredient cost of the preparation
    pub total_cost: f64,
    /// Cost per serving
    pub unit_cost: f64,
    /// Revenue if every serving sells
    pub estimated_revenue: f64,
}

/// Successful preparation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparationResult {
    /// Servings added to stock
    pub total_servings_prepared: f64,
    /// Recipe batches executed
    pub recipe_batches_made: u32,
    /// Stock and cost figures
    pub preparation_details: PreparationDetails,
    /// Consumption keyed by ingredient or child product id
    pub required_ingredients: BTreeMap<Uuid, RequiredIngredientEntry>,
    /// History row appended with the preparation
    pub history_id: Uuid,
}

impl CompositeEngine {
    fn validate_quantity_to_prepare(&self, requested: i64) -> Result<u32, KitchenError> {
        let max = self.config.max_batches_per_prepare;
        u32::try_from(requested)
            .ok()
            .filter(|quantity| (1..=max).contains(quantity))
            .ok_or(KitchenError::InvalidQuantityToPrepare {
                requested,
                min: 1,
                max,
            })
    }

    /// What `quantity_to_prepare` batches would consume, without mutating anything
    ///
    /// # Errors
    ///
    /// Returns quantity, structure, lookup or unit errors.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn check_availability(
        &self,
        product_id: Uuid,
        quantity_to_prepare: i64,
    ) -> Result<RecipeAvailability, KitchenError> {
        let quantity = self.validate_quantity_to_prepare(quantity_to_prepare)?;
        let (product, info) = self.load_composite(product_id).await?;
        let plan = self.plan_requirements(&product, &info, quantity).await?;
        let missing_ingredients: Vec<MissingIngredient> = plan
            .shortfalls()
            .into_iter()
            .map(|shortfall| MissingIngredient {
                name: shortfall.name,
                needed: shortfall.needed,
                available: shortfall.available,
                unit: shortfall.unit,
            })
            .collect();
        Ok(RecipeAvailability {
            can_prepare: missing_ingredients.is_empty(),
            missing_ingredients,
        })
    }

    /// Prepare `quantity_to_prepare` batches of a composite product
    ///
    /// All shortfalls are collected before anything is written; on success the
    /// deductions, the stock increase and the history row land in one commit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantityToPrepare`, `InvalidCompositeStructure`,
    /// `InsufficientIngredients`, legacy child errors, unit errors, or
    /// `PreparationFailed` when the commit itself fails.
    #[instrument(skip(self, operator), fields(product_id = %product_id, quantity = quantity_to_prepare))]
    pub async fn prepare(
        &self,
        product_id: Uuid,
        quantity_to_prepare: i64,
        operator: &Operator,
    ) -> Result<PreparationResult, KitchenError> {
        let outcome = self
            .prepare_with_retry(product_id, quantity_to_prepare, operator)
            .await;
        if let Err(error) = &outcome {
            if error.is_rejection() {
                KitchenLogger::log_rejection(product_id, "prepare", error);
            }
        }
        outcome
    }

    async fn prepare_with_retry(
        &self,
        product_id: Uuid,
        quantity_to_prepare: i64,
        operator: &Operator,
    ) -> Result<PreparationResult, KitchenError> {
        for attempt in 1..=COMMIT_ATTEMPTS {
            if let Attempt::Committed(result) = self
                .prepare_inner(product_id, quantity_to_prepare, operator)
                .await?
            {
                return Ok(result);
            }
            debug!(%product_id, attempt, "stock moved before commit, retrying prepare");
        }
        Err(KitchenError::PreparationFailed {
            product_id,
            reason: retries_exhausted(product_id, "prepare"),
        })
    }

    async fn prepare_inner(
        &self,
        product_id: Uuid,
        quantity_to_prepare: i64,
        operator: &Operator,
    ) -> Result<Attempt<PreparationResult>, KitchenError> {
        let quantity = self.validate_quantity_to_prepare(quantity_to_prepare)?;
        let (product, info) = self.load_composite(product_id).await?;
        let plan = self.plan_requirements(&product, &info, quantity).await?;

        let shortfalls = plan.shortfalls();
        if !shortfalls.is_empty() {
            return Err(KitchenError::InsufficientIngredients { shortfalls });
        }

        let now = self.clock.now();
        let servings = info.capacity.quantity * f64::from(quantity);
        let total_cost = plan.total_cost();
        let cost_info = CostInfo {
            unit_cost: total_cost / servings,
            total_cost,
            estimated_revenue: servings * product.retail_price,
        };
        let record = history::record(
            HistoryAction::Prepare,
            &product,
            servings,
            operator,
            RecordExtra {
                cost_info,
                batch_info: Some(BatchInfo {
                    batch_number: None,
                    expiry_time: Some(freshness::expiry_time(now, info.expiry_hours)),
                    ingredients_used: plan
                        .requirements
                        .iter()
                        .map(IngredientRequirement::usage)
                        .collect(),
                }),
                notes: plan
                    .is_legacy_data()
                    .then(|| "prepared from legacy child product data".to_owned()),
            },
            now,
        );
        let history_id = record.id;
        let batch_number = record
            .batch_info
            .as_ref()
            .and_then(|batch| batch.batch_number.clone());

        let commit = PreparationCommit {
            product_id,
            expected_stock: info.current_stock(),
            servings,
            prepared_at: now,
            deductions: plan
                .requirements
                .iter()
                .map(IngredientRequirement::deduction)
                .collect(),
            history: record,
        };
        let updated = match self.store.commit_preparation(commit).await {
            Ok(updated) => updated,
            // A tripped ingredient guard means stock moved after the availability
            // pass; the next attempt reports the full shortfall list
            Err(StoreError::Stale { .. } | StoreError::Conflict { .. }) => {
                return Ok(Attempt::Stale)
            }
            Err(error) => return Err(commit_error(product_id, &error)),
        };

        KitchenLogger::log_preparation(product_id, quantity, servings, plan.recipe_batches, total_cost);

        Ok(Attempt::Committed(PreparationResult {
            total_servings_prepared: servings,
            recipe_batches_made: plan.recipe_batches,
            preparation_details: PreparationDetails {
                new_stock: updated.current_stock(),
                previous_stock: info.current_stock(),
                batch_number,
                expiry_time: freshness::expiry_time(now, info.expiry_hours),
                total_cost,
                unit_cost: cost_info.unit_cost,
                estimated_revenue: cost_info.estimated_revenue,
            },
            required_ingredients: plan
                .requirements
                .iter()
                .map(|requirement| {
                    (
                        requirement.source_id(),
                        RequiredIngredientEntry {
                            name: requirement.name().to_owned(),
                            needed: requirement.needed(),
                            unit: requirement.unit().to_owned(),
                            available: requirement.available(),
                            recipe_batches_needed: plan.recipe_batches,
                            is_legacy_data: requirement.is_legacy_data(),
                        },
                    )
                })
                .collect(),
            history_id,
        }))
    }
}

/// A commit that failed for any reason other than moved stock is a fault
fn commit_error(product_id: Uuid, error: &StoreError) -> KitchenError {
    let reason = error.to_string();
    KitchenLogger::log_commit_fault(product_id, "prepare", &reason);
    KitchenError::PreparationFailed { product_id, reason }
}
