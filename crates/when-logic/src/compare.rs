// crates/when-logic/src/compare.rs
// ============================================================================
// Module: Value Comparison Helpers
// Description: Equality, ordering, containment, and emptiness over JSON values.
// Purpose: Give conditions deterministic, type-aware comparison semantics.
// Dependencies: bigdecimal, serde_json, time
// ============================================================================

//! ## Overview
//! Comparison helpers convert JSON value pairs into tri-state outcomes.
//! Numbers are compared as decimals so `1.0` equals `1` and float drift does
//! not flip an ordering. Strings order temporally when both sides parse as
//! RFC3339 date-times or dates; otherwise ordering is undecidable and the
//! helpers yield `Unknown` rather than guessing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::Number;
use serde_json::Value;
use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::tristate::TriState;

// ============================================================================
// SECTION: Equality
// ============================================================================

/// Compares two values for equality, with decimal-aware numeric handling.
#[must_use]
pub fn compare_equality(left: &Value, right: &Value) -> TriState {
    match (left, right) {
        (Value::Number(left_num), Value::Number(right_num)) => {
            match (decimal_from_number(left_num), decimal_from_number(right_num)) {
                (Some(left_dec), Some(right_dec)) => TriState::from(left_dec == right_dec),
                _ => TriState::Unknown,
            }
        }
        _ => TriState::from(left == right),
    }
}

// ============================================================================
// SECTION: Ordering
// ============================================================================

/// Orders two values when an ordering is defined.
///
/// Numbers order as decimals; strings order temporally when both parse as
/// RFC3339 date-times or calendar dates. Every other pairing is unordered.
#[must_use]
pub fn compare_ordering(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(left_num), Some(right_num)) = (left.as_number(), right.as_number()) {
        return decimal_cmp(left_num, right_num);
    }
    if let (Value::String(left_str), Value::String(right_str)) = (left, right) {
        return temporal_cmp(left_str, right_str);
    }
    None
}

// ============================================================================
// SECTION: Containment
// ============================================================================

/// Evaluates containment for string and array values.
///
/// A string contains a substring; an array contains a member. Array needles
/// that are themselves arrays require every element to be present.
#[must_use]
pub fn contains_value(haystack: &Value, needle: &Value) -> TriState {
    match (haystack, needle) {
        (Value::String(text), Value::String(part)) => TriState::from(text.contains(part.as_str())),
        (Value::Array(items), Value::Array(parts)) => {
            TriState::from(parts.iter().all(|part| items.contains(part)))
        }
        (Value::Array(items), single) => TriState::from(items.contains(single)),
        _ => TriState::Unknown,
    }
}

// ============================================================================
// SECTION: Emptiness
// ============================================================================

/// Returns true when a value carries no user-visible content.
#[must_use]
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

// ============================================================================
// SECTION: Numeric and Temporal Primitives
// ============================================================================

/// Orders numeric JSON values using decimal-aware comparison.
fn decimal_cmp(left: &Number, right: &Number) -> Option<Ordering> {
    let left = decimal_from_number(left)?;
    let right = decimal_from_number(right)?;
    Some(left.cmp(&right))
}

/// Parses a JSON number into `BigDecimal` with a stable string representation.
fn decimal_from_number(number: &Number) -> Option<BigDecimal> {
    let rendered = number.to_string();
    BigDecimal::from_str(&rendered).ok()
}

/// Compares RFC3339 date-time or date-only strings.
fn temporal_cmp(left: &str, right: &str) -> Option<Ordering> {
    if let (Ok(left), Ok(right)) =
        (OffsetDateTime::parse(left, &Rfc3339), OffsetDateTime::parse(right, &Rfc3339))
    {
        return Some(left.cmp(&right));
    }
    let left = parse_rfc3339_date(left)?;
    let right = parse_rfc3339_date(right)?;
    Some(left.cmp(&right))
}

/// Parses an RFC3339 date-only value (YYYY-MM-DD).
fn parse_rfc3339_date(value: &str) -> Option<Date> {
    let mut parts = value.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = time::Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}
