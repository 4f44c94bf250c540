// crates/formforge-core/src/runtime/visibility.rs
// ============================================================================
// Module: FormForge Conditional Visibility
// Description: Fresh evaluation of page and field visibility conditions.
// Purpose: Exclude hidden pages and fields from rendering and gates.
// Dependencies: crate::core, when-logic
// ============================================================================

//! ## Overview
//! Visibility is computed fresh from current values on every render,
//! validation, and navigation decision; nothing here is cached. A page or
//! field without a condition is always visible; with a condition it is
//! visible only when the condition decides `True`. An undecided condition
//! (referenced value missing) hides the element, matching how a renderer
//! treats an unmet predicate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use when_logic::ValueLookup;

use crate::core::FieldName;
use crate::core::FieldSpec;
use crate::core::PageSpec;

// ============================================================================
// SECTION: Value Lookup Adapter
// ============================================================================

/// Adapts the typed values map to the condition lookup contract.
pub struct ValuesLookup<'a> {
    /// Borrowed values map.
    values: &'a BTreeMap<FieldName, Value>,
}

impl<'a> ValuesLookup<'a> {
    /// Wraps a values map.
    #[must_use]
    pub const fn new(values: &'a BTreeMap<FieldName, Value>) -> Self {
        Self {
            values,
        }
    }
}

impl ValueLookup for ValuesLookup<'_> {
    fn value(&self, name: &str) -> Option<Value> {
        self.values.get(&FieldName::new(name)).cloned()
    }
}

// ============================================================================
// SECTION: Visibility Decisions
// ============================================================================

/// Returns true when the field should be rendered and validated.
#[must_use]
pub fn field_visible(field: &FieldSpec, values: &BTreeMap<FieldName, Value>) -> bool {
    field
        .show_when
        .as_ref()
        .is_none_or(|condition| condition.eval(&ValuesLookup::new(values)).is_true())
}

/// Returns true when the page should be rendered and validated.
#[must_use]
pub fn page_visible(page: &PageSpec, values: &BTreeMap<FieldName, Value>) -> bool {
    page.show_when
        .as_ref()
        .is_none_or(|condition| condition.eval(&ValuesLookup::new(values)).is_true())
}

/// Returns the page's currently visible fields in presentation order.
#[must_use]
pub fn visible_fields<'a>(
    page: &'a PageSpec,
    values: &BTreeMap<FieldName, Value>,
) -> Vec<&'a FieldSpec> {
    page.fields.iter().filter(|field| field_visible(field, values)).collect()
}
