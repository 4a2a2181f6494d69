// ABOUTME: Unit vocabulary, dimension model and linear conversion between compatible units
// ABOUTME: Validates against an allowed set and suggests canonical units for legacy symbols
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Unit Conversion Service
//!
//! Stored quantities use a closed vocabulary (by default `kg`, `l`, `piece`).
//! [`UnitConverter`] answers membership, compatibility and conversion questions
//! against that vocabulary using a fixed linear factor table.
//!
//! Legacy symbols such as `g` or `gam` are never converted silently:
//! [`UnitConverter::suggest_better_unit`] only *advises* a canonical unit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::units::{
    DEFAULT_ALLOWED_UNITS, FALLBACK_SUGGESTED_UNIT, KILOGRAM, LITER, PIECE, QUANTITY_EPSILON,
};
use crate::errors::KitchenError;

/// Measurement dimension a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Weight
    Mass,
    /// Capacity
    Volume,
    /// Whole items
    Count,
}

impl Dimension {
    /// Canonical unit symbol for this dimension
    #[must_use]
    pub const fn canonical_unit(self) -> &'static str {
        match self {
            Self::Mass => KILOGRAM,
            Self::Volume => LITER,
            Self::Count => PIECE,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mass => "mass",
            Self::Volume => "volume",
            Self::Count => "count",
        };
        f.write_str(name)
    }
}

/// A unit the conversion table knows how to scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDefinition {
    /// Symbol as stored
    pub symbol: &'static str,
    /// Dimension
    pub dimension: Dimension,
    /// Factor to the dimension's canonical unit
    pub to_canonical: f64,
}

impl UnitDefinition {
    const fn new(symbol: &'static str, dimension: Dimension, to_canonical: f64) -> Self {
        Self {
            symbol,
            dimension,
            to_canonical,
        }
    }
}

/// Units a configuration may admit into the allowed vocabulary
const UNIT_TABLE: &[UnitDefinition] = &[
    UnitDefinition::new(KILOGRAM, Dimension::Mass, 1.0),
    UnitDefinition::new("g", Dimension::Mass, 0.001),
    UnitDefinition::new("mg", Dimension::Mass, 0.000_001),
    UnitDefinition::new("lb", Dimension::Mass, 0.453_592_37),
    UnitDefinition::new("oz", Dimension::Mass, 0.028_349_523_125),
    UnitDefinition::new(LITER, Dimension::Volume, 1.0),
    UnitDefinition::new("ml", Dimension::Volume, 0.001),
    UnitDefinition::new("cl", Dimension::Volume, 0.01),
    UnitDefinition::new("dl", Dimension::Volume, 0.1),
    UnitDefinition::new(PIECE, Dimension::Count, 1.0),
];

/// Legacy spellings seen in stored records, with their factor to the canonical unit
const LEGACY_MASS_ALIASES: &[(&str, f64)] = &[
    ("g", 0.001),
    ("gam", 0.001),
    ("gram", 0.001),
    ("grams", 0.001),
    ("gr", 0.001),
    ("mg", 0.000_001),
    ("kilogram", 1.0),
    ("kilograms", 1.0),
    ("kilo", 1.0),
    ("kgs", 1.0),
    ("lb", 0.453_592_37),
    ("lbs", 0.453_592_37),
    ("oz", 0.028_349_523_125),
    ("ton", 1000.0),
];

const LEGACY_VOLUME_ALIASES: &[(&str, f64)] = &[
    ("ml", 0.001),
    ("cl", 0.01),
    ("dl", 0.1),
    ("liter", 1.0),
    ("liters", 1.0),
    ("litre", 1.0),
    ("litres", 1.0),
    ("lit", 1.0),
    ("cup", 0.24),
    ("tbsp", 0.015),
    ("tsp", 0.005),
    ("gallon", 3.785_411_784),
];

/// Normalize a unit symbol for lookup
#[must_use]
pub fn normalize_unit(unit: &str) -> String {
    unit.trim().to_lowercase()
}

/// Look up a unit in the conversion table, ignoring case and surrounding space
#[must_use]
pub fn lookup_unit(unit: &str) -> Option<&'static UnitDefinition> {
    let normalized = normalize_unit(unit);
    UNIT_TABLE.iter().find(|def| def.symbol == normalized)
}

/// Classify a legacy symbol by dimension, with its factor when known
fn classify_legacy(unit: &str) -> Option<(Dimension, f64)> {
    let normalized = normalize_unit(unit);
    if let Some(def) = UNIT_TABLE.iter().find(|def| def.symbol == normalized) {
        return Some((def.dimension, def.to_canonical));
    }
    if let Some((_, factor)) = LEGACY_MASS_ALIASES.iter().find(|(s, _)| *s == normalized) {
        return Some((Dimension::Mass, *factor));
    }
    LEGACY_VOLUME_ALIASES
        .iter()
        .find(|(s, _)| *s == normalized)
        .map(|(_, factor)| (Dimension::Volume, *factor))
}

/// An allowed unit as listed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedUnit {
    /// Unit symbol
    pub symbol: String,
    /// Dimension it measures
    pub dimension: Dimension,
}

/// Outcome of comparing a requirement against stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityCheck {
    /// Stock on hand, in `unit`
    pub available: f64,
    /// Requirement converted into `unit`, absent when conversion failed
    pub required: Option<f64>,
    /// Whether stock covers the requirement
    pub sufficient: bool,
    /// Missing amount in `unit` (0 when sufficient)
    pub shortfall: f64,
    /// Stock unit every figure is expressed in
    pub unit: String,
    /// Human-readable reason when the comparison could not be made
    pub reason: Option<String>,
}

/// Advisory result for a possibly non-canonical unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSuggestion {
    /// Whether the caller should migrate to the suggested unit
    pub should_change: bool,
    /// Unit as given
    pub current_unit: String,
    /// Unit to migrate to
    pub suggested_unit: Option<String>,
    /// The quantity re-expressed in the suggested unit, when the factor is known
    pub suggested_quantity: Option<f64>,
    /// Why the suggestion was made
    pub reason: String,
}

/// Validates and converts quantities against an allowed unit vocabulary
#[derive(Debug, Clone)]
pub struct UnitConverter {
    allowed: Vec<&'static UnitDefinition>,
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ALLOWED_UNITS
                .iter()
                .filter_map(|symbol| lookup_unit(symbol))
                .collect(),
        }
    }
}

impl UnitConverter {
    /// Build a converter admitting exactly the given symbols
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::InvalidUnit` if a symbol is absent from the factor table
    /// or the list is empty.
    pub fn new<S: AsRef<str>>(allowed: &[S]) -> Result<Self, KitchenError> {
        let mut defs: Vec<&'static UnitDefinition> = Vec::with_capacity(allowed.len());
        for symbol in allowed {
            let def = lookup_unit(symbol.as_ref()).ok_or_else(|| KitchenError::InvalidUnit {
                unit: symbol.as_ref().to_owned(),
            })?;
            if !defs.iter().any(|existing| existing.symbol == def.symbol) {
                defs.push(def);
            }
        }
        if defs.is_empty() {
            return Err(KitchenError::InvalidUnit {
                unit: String::new(),
            });
        }
        Ok(Self { allowed: defs })
    }

    /// List the allowed vocabulary
    #[must_use]
    pub fn allowed_units(&self) -> Vec<AllowedUnit> {
        self.allowed
            .iter()
            .map(|def| AllowedUnit {
                symbol: def.symbol.to_owned(),
                dimension: def.dimension,
            })
            .collect()
    }

    fn allowed_definition(&self, unit: &str) -> Option<&'static UnitDefinition> {
        let normalized = normalize_unit(unit);
        self.allowed
            .iter()
            .copied()
            .find(|def| def.symbol == normalized)
    }

    /// Membership test against the allowed vocabulary
    #[must_use]
    pub fn is_unit_allowed(&self, unit: &str) -> bool {
        self.allowed_definition(unit).is_some()
    }

    /// Dimension of an allowed unit
    #[must_use]
    pub fn dimension_of(&self, unit: &str) -> Option<Dimension> {
        self.allowed_definition(unit).map(|def| def.dimension)
    }

    /// True only if both units are allowed and measure the same dimension
    #[must_use]
    pub fn are_units_compatible(&self, a: &str, b: &str) -> bool {
        match (self.allowed_definition(a), self.allowed_definition(b)) {
            (Some(lhs), Some(rhs)) => lhs.dimension == rhs.dimension,
            _ => false,
        }
    }

    /// Convert between compatible allowed units, `None` when not possible
    #[must_use]
    pub fn convert(&self, quantity: f64, from: &str, to: &str) -> Option<f64> {
        self.try_convert(quantity, from, to).ok()
    }

    /// Convert between compatible allowed units
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::ConversionFailed` if either unit is outside the allowed
    /// vocabulary or the quantity is not finite, and `KitchenError::UnitIncompatible`
    /// if the units measure different dimensions.
    pub fn try_convert(&self, quantity: f64, from: &str, to: &str) -> Result<f64, KitchenError> {
        let conversion_failed = || KitchenError::ConversionFailed {
            quantity,
            from: from.to_owned(),
            to: to.to_owned(),
        };
        if !quantity.is_finite() {
            return Err(conversion_failed());
        }
        let (Some(source), Some(target)) =
            (self.allowed_definition(from), self.allowed_definition(to))
        else {
            return Err(conversion_failed());
        };
        if source.dimension != target.dimension {
            return Err(KitchenError::UnitIncompatible {
                from: from.to_owned(),
                to: to.to_owned(),
                context: format!("{} vs {}", source.dimension, target.dimension),
            });
        }
        if source.symbol == target.symbol {
            return Ok(quantity);
        }
        Ok(quantity * source.to_canonical / target.to_canonical)
    }

    /// Compare a requirement against stock, converting the requirement into the stock unit
    ///
    /// Never fails: an impossible comparison yields `sufficient == false` with a reason.
    #[must_use]
    pub fn check_ingredient_availability(
        &self,
        stock_quantity: f64,
        stock_unit: &str,
        required_quantity: f64,
        required_unit: &str,
    ) -> AvailabilityCheck {
        match self.try_convert(required_quantity, required_unit, stock_unit) {
            Ok(required) => {
                let sufficient = stock_quantity + QUANTITY_EPSILON >= required;
                AvailabilityCheck {
                    available: stock_quantity,
                    required: Some(required),
                    sufficient,
                    shortfall: if sufficient {
                        0.0
                    } else {
                        required - stock_quantity
                    },
                    unit: stock_unit.to_owned(),
                    reason: None,
                }
            }
            Err(error) => AvailabilityCheck {
                available: stock_quantity,
                required: None,
                sufficient: false,
                shortfall: 0.0,
                unit: stock_unit.to_owned(),
                reason: Some(match error {
                    KitchenError::UnitIncompatible { .. } => format!(
                        "Required unit '{required_unit}' is not compatible with stock unit '{stock_unit}'"
                    ),
                    _ => format!(
                        "Cannot convert {required_quantity} {required_unit} into '{stock_unit}'"
                    ),
                }),
            },
        }
    }

    /// Advise a canonical unit for a legacy or unknown symbol
    ///
    /// Mass-like units map to the mass unit, volume-like to the volume unit, and
    /// anything unrecognised to the fallback. The input is never modified.
    #[must_use]
    pub fn suggest_better_unit(&self, quantity: f64, unit: &str) -> UnitSuggestion {
        if self.is_unit_allowed(unit) {
            return UnitSuggestion {
                should_change: false,
                current_unit: unit.to_owned(),
                suggested_unit: None,
                suggested_quantity: None,
                reason: format!("'{unit}' is already an allowed unit"),
            };
        }

        let classified = classify_legacy(unit);
        let dimension = classified.map(|(dimension, _)| dimension);
        let target = self.target_for(dimension);
        let suggested_quantity = classified.and_then(|(_, factor)| {
            lookup_unit(target)
                .filter(|def| Some(def.dimension) == dimension)
                .map(|def| quantity * factor / def.to_canonical)
        });
        let reason = dimension.map_or_else(
            || format!("'{unit}' is not recognised; defaulting to '{target}'"),
            |dimension| format!("'{unit}' is a legacy {dimension} unit; use '{target}'"),
        );

        UnitSuggestion {
            should_change: true,
            current_unit: unit.to_owned(),
            suggested_unit: Some(target.to_owned()),
            suggested_quantity,
            reason,
        }
    }

    fn target_for(&self, dimension: Option<Dimension>) -> &'static str {
        let Some(dimension @ (Dimension::Mass | Dimension::Volume)) = dimension else {
            return FALLBACK_SUGGESTED_UNIT;
        };
        let canonical = dimension.canonical_unit();
        if self.is_unit_allowed(canonical) {
            return canonical;
        }
        self.allowed
            .iter()
            .find(|def| def.dimension == dimension)
            .map_or(FALLBACK_SUGGESTED_UNIT, |def| def.symbol)
    }
}
