// ABOUTME: Tests for the unit vocabulary, conversion and advisory suggestions
// ABOUTME: Covers legacy symbols, cross-dimension refusals and stock availability checks
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use prepline::errors::{AppError, ErrorCode, KitchenError};
use prepline::units::{Dimension, UnitConverter};

fn approx(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

#[test]
fn test_legacy_gram_is_refused_and_advised() {
    let converter = UnitConverter::default();

    assert!(!converter.is_unit_allowed("g"));
    let suggestion = converter.suggest_better_unit(1000.0, "g");
    assert!(suggestion.should_change);
    assert_eq!(suggestion.current_unit, "g");
    assert_eq!(suggestion.suggested_unit.as_deref(), Some("kg"));
    assert!(approx(suggestion.suggested_quantity.unwrap(), 1.0));
}

#[test]
fn test_suggestions_by_dimension() {
    let converter = UnitConverter::default();

    let millilitres = converter.suggest_better_unit(250.0, "ml");
    assert_eq!(millilitres.suggested_unit.as_deref(), Some("l"));
    assert!(approx(millilitres.suggested_quantity.unwrap(), 0.25));

    let misspelt = converter.suggest_better_unit(500.0, "gam");
    assert_eq!(misspelt.suggested_unit.as_deref(), Some("kg"));
    assert!(approx(misspelt.suggested_quantity.unwrap(), 0.5));

    let unknown = converter.suggest_better_unit(3.0, "bunch");
    assert!(unknown.should_change);
    assert_eq!(unknown.suggested_unit.as_deref(), Some("kg"));
    assert!(unknown.suggested_quantity.is_none());

    let allowed = converter.suggest_better_unit(3.0, "piece");
    assert!(!allowed.should_change);
    assert!(allowed.suggested_unit.is_none());
}

#[test]
fn test_allowed_vocabulary_is_case_insensitive() {
    let converter = UnitConverter::default();

    assert!(converter.is_unit_allowed("KG"));
    assert!(converter.is_unit_allowed(" l "));
    assert_eq!(converter.dimension_of("piece"), Some(Dimension::Count));
    assert!(converter.dimension_of("gam").is_none());
}

#[test]
fn test_compatibility_requires_both_allowed_and_same_dimension() {
    let wide = UnitConverter::new(&["kg", "g", "l", "ml", "piece"]).unwrap();

    assert!(wide.are_units_compatible("kg", "g"));
    assert!(wide.are_units_compatible("ml", "l"));
    assert!(!wide.are_units_compatible("kg", "l"));
    assert!(!wide.are_units_compatible("piece", "kg"));
    assert!(!UnitConverter::default().are_units_compatible("kg", "g"));
}

#[test]
fn test_convert_refuses_outside_vocabulary_and_across_dimensions() {
    let converter = UnitConverter::default();

    assert!(approx(converter.convert(2.5, "kg", "kg").unwrap(), 2.5));
    assert!(converter.convert(1000.0, "g", "kg").is_none());
    assert!(converter.convert(1.0, "kg", "l").is_none());
    assert!(converter.convert(f64::NAN, "kg", "kg").is_none());

    let error = converter.try_convert(1.0, "kg", "piece").unwrap_err();
    assert!(matches!(error, KitchenError::UnitIncompatible { .. }));
    assert_eq!(AppError::from(error).code, ErrorCode::UnitIncompatible);

    let wide = UnitConverter::new(&["kg", "g"]).unwrap();
    assert!(approx(wide.convert(1500.0, "g", "kg").unwrap(), 1.5));
}

#[test]
fn test_availability_check_converts_into_stock_unit() {
    let converter = UnitConverter::new(&["kg", "g", "l", "piece"]).unwrap();

    let enough = converter.check_ingredient_availability(2.0, "kg", 1500.0, "g");
    assert!(enough.sufficient);
    assert!(approx(enough.required.unwrap(), 1.5));
    assert!(approx(enough.shortfall, 0.0));
    assert_eq!(enough.unit, "kg");

    let short = converter.check_ingredient_availability(1.0, "kg", 1250.0, "g");
    assert!(!short.sufficient);
    assert!(approx(short.shortfall, 0.25));
    assert!(short.reason.is_none());

    let mismatched = converter.check_ingredient_availability(5.0, "kg", 1.0, "l");
    assert!(!mismatched.sufficient);
    assert!(mismatched.required.is_none());
    assert!(mismatched.reason.unwrap().contains("not compatible"));

    let unknown = converter.check_ingredient_availability(5.0, "kg", 1.0, "gam");
    assert!(!unknown.sufficient);
    assert!(unknown.reason.unwrap().contains("Cannot convert"));
}

#[test]
fn test_unknown_vocabulary_is_invalid_unit() {
    let error = UnitConverter::new(&["kg", "portion"]).unwrap_err();

    assert!(matches!(&error, KitchenError::InvalidUnit { unit } if unit == "portion"));
    let app: AppError = error.into();
    assert_eq!(app.code, ErrorCode::InvalidUnit);
    assert_eq!(app.code.as_str(), "invalid_unit");
}
