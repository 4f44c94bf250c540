// crates/formforge-core/src/core/schema.rs
// ============================================================================
// Module: FormForge Schema Model
// Description: Declarative form schema: pages, fields, rules, and specs.
// Purpose: Define the canonical, data-only schema consumed by the engine.
// Dependencies: crate::core::{identifiers, validation}, serde, when-logic
// ============================================================================

//! ## Overview
//! Schema documents describe a multi-page form as pure data: ordered pages of
//! fields, per-field validation and suggestion specs, and schema-level
//! cross-field rules. The engine treats a loaded schema as read-only for the
//! whole session. Shape problems (duplicate names, dangling references) are
//! tolerated at runtime with no-op lookups; the schema lint utility reports
//! them ahead of time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use when_logic::Condition;

use crate::core::identifiers::CheckId;
use crate::core::identifiers::FieldName;
use crate::core::identifiers::FieldType;
use crate::core::identifiers::PageId;
use crate::core::identifiers::RuleId;
use crate::core::identifiers::SchemaVersion;
use crate::core::validation::Severity;

// ============================================================================
// SECTION: Schema Document
// ============================================================================

/// Canonical form schema document.
///
/// # Invariants
/// - Treated as immutable for the duration of a render session.
/// - Field names should be unique across all pages; the engine does not
///   enforce this and resolves duplicates to the first occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema document version.
    pub version: SchemaVersion,
    /// Ordered pages.
    pub pages: Vec<PageSpec>,
    /// Schema-level cross-field rules.
    #[serde(default)]
    pub cross_rules: Vec<CrossFieldRule>,
}

impl Schema {
    /// Returns the field spec with the given name, if present.
    #[must_use]
    pub fn field(&self, name: &FieldName) -> Option<&FieldSpec> {
        self.pages.iter().flat_map(|page| page.fields.iter()).find(|field| field.name == *name)
    }

    /// Iterates every field spec in page order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.pages.iter().flat_map(|page| page.fields.iter())
    }

    /// Returns the page containing the given field, if any.
    #[must_use]
    pub fn page_of(&self, name: &FieldName) -> Option<&PageSpec> {
        self.pages.iter().find(|page| page.fields.iter().any(|field| field.name == *name))
    }

    /// Builds the reverse dependency map: changed field to dependent fields.
    ///
    /// A field B appears under key A when B declares `depends_on: [A]`, so a
    /// change to A retriggers B's validation and suggestion.
    #[must_use]
    pub fn dependents(&self) -> BTreeMap<FieldName, Vec<FieldName>> {
        let mut map: BTreeMap<FieldName, Vec<FieldName>> = BTreeMap::new();
        for field in self.fields() {
            for upstream in &field.depends_on {
                map.entry(upstream.clone()).or_default().push(field.name.clone());
            }
        }
        map
    }
}

// ============================================================================
// SECTION: Pages
// ============================================================================

/// One page of fields presented together.
///
/// # Invariants
/// - Field order within the page is the presentation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    /// Page identifier.
    pub page_id: PageId,
    /// Optional page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional page description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered fields on the page.
    pub fields: Vec<FieldSpec>,
    /// Optional visibility condition over current values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_when: Option<Condition>,
}

// ============================================================================
// SECTION: Fields
// ============================================================================

/// One input unit in the form.
///
/// # Invariants
/// - `name` keys the values map and must be unique across the schema.
/// - `field_type` is an open string dispatched through the type registry;
///   unknown types degrade to the fallback handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name keying the values map.
    pub name: FieldName,
    /// Open field type key.
    pub field_type: FieldType,
    /// Human-readable label.
    pub label: String,
    /// Optional helper description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Required-presence flag.
    #[serde(default)]
    pub required: bool,
    /// Optional default value applied at mount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Optional visibility condition over current values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_when: Option<Condition>,
    /// Names of fields whose changes retrigger this field's validation and
    /// suggestion.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<FieldName>,
    /// Optional validation spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationSpec>,
    /// Optional suggestion spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggest: Option<SuggestSpec>,
    /// Free-form widget configuration passed through to renderers.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub config: Map<String, Value>,
}

// ============================================================================
// SECTION: Validation Specs
// ============================================================================

/// Per-field validation spec.
///
/// # Invariants
/// - Checks apply in the engine's fixed order regardless of declaration
///   order; the first failure wins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationSpec {
    /// Minimum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Minimum numeric value (decimal-aware).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    /// Maximum numeric value (decimal-aware).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    /// Regex the rendered value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Email format flag.
    #[serde(default)]
    pub email: bool,
    /// URL format flag.
    #[serde(default)]
    pub url: bool,
    /// Loose phone format flag (ten or more digits).
    #[serde(default)]
    pub phone: bool,
    /// Named synchronous check dispatched through the check registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
    /// Optional remote (asynchronous) check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteCheckSpec>,
}

/// Remote check spec dispatched to the async validator after all synchronous
/// checks pass.
///
/// # Invariants
/// - `debounce_ms`, when set, overrides the engine-wide debounce window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCheckSpec {
    /// Check identifier agreed with the validator implementation.
    pub check_id: CheckId,
    /// Optional per-field debounce override in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<i64>,
}

// ============================================================================
// SECTION: Suggestion Specs
// ============================================================================

/// Per-field suggestion spec.
///
/// # Invariants
/// - Absent spec means the field never requests suggestions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuggestSpec {
    /// Minimum confidence required to surface a suggestion; engine default
    /// applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
    /// Accepted-suggestion lifetime override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<i64>,
    /// Free-form provider parameters.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

// ============================================================================
// SECTION: Cross-Field Rules
// ============================================================================

/// Schema-level rule judging multiple fields jointly.
///
/// # Invariants
/// - A failing rule's outcome attaches to every field in `fields`.
/// - `expect` failing means the condition evaluated `False`; `Unknown`
///   (missing participants) does not fail the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossFieldRule {
    /// Rule identifier.
    pub rule_id: RuleId,
    /// Participating field names.
    pub fields: Vec<FieldName>,
    /// Condition expected to hold over the participating values.
    pub expect: Condition,
    /// Message attached to every participating field on failure.
    pub message: String,
    /// Outcome severity.
    #[serde(default)]
    pub severity: Severity,
    /// Blocking flag; defaults to the severity's blocking default when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking: Option<bool>,
}
