// crates/formforge-schema-check/src/lib.rs
// ============================================================================
// Module: FormForge Schema Check
// Description: Shape lint for schema documents ahead of rendering.
// Purpose: Report structural problems the engine tolerates at runtime.
// Dependencies: formforge-core, serde, when-logic
// ============================================================================

//! ## Overview
//! The engine deliberately tolerates malformed schemas at runtime: unknown
//! field names become no-ops so a live-edited schema cannot crash a session.
//! This crate is the other half of that bargain — a lint that builder
//! tooling runs ahead of time to report duplicate names, dangling
//! references, dependency cycles, and unknown field types before a schema
//! ships.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use formforge_core::FieldName;
use formforge_core::FieldTypeRegistry;
use formforge_core::Schema;
use serde::Deserialize;
use serde::Serialize;
use when_logic::Condition;

// ============================================================================
// SECTION: Issue Model
// ============================================================================

/// Issue severity reported by the lint.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// The schema will misbehave at runtime.
    Error,
    /// The schema will degrade but keep working.
    Warning,
}

/// One lint finding.
///
/// # Invariants
/// - `location` names the page, field, or rule the finding anchors to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    /// Finding severity.
    pub severity: IssueSeverity,
    /// Anchor: a page id, field name, or rule id.
    pub location: String,
    /// Human-readable description.
    pub message: String,
}

impl SchemaIssue {
    /// Builds an error finding.
    fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            location: location.into(),
            message: message.into(),
        }
    }

    /// Builds a warning finding.
    fn warning(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            location: location.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Schema Lint
// ============================================================================

/// Lints a schema document and returns every finding.
#[must_use]
pub fn check_schema(schema: &Schema) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();
    let known_fields: BTreeSet<&FieldName> =
        schema.fields().map(|field| &field.name).collect();

    check_structure(schema, &mut issues);
    check_field_types(schema, &mut issues);
    check_references(schema, &known_fields, &mut issues);
    check_conditions(schema, &known_fields, &mut issues);
    check_dependency_cycles(schema, &mut issues);
    issues
}

/// Reports empty schemas, duplicate identifiers, and empty pages.
fn check_structure(schema: &Schema, issues: &mut Vec<SchemaIssue>) {
    if schema.pages.is_empty() {
        issues.push(SchemaIssue::error("<schema>", "schema has no pages"));
    }

    let mut page_ids = BTreeSet::new();
    for page in &schema.pages {
        if !page_ids.insert(&page.page_id) {
            issues.push(SchemaIssue::error(
                page.page_id.as_str(),
                format!("duplicate page id `{}`", page.page_id),
            ));
        }
        if page.fields.is_empty() {
            issues.push(SchemaIssue::warning(
                page.page_id.as_str(),
                format!("page `{}` has no fields", page.page_id),
            ));
        }
    }

    let mut field_names = BTreeSet::new();
    for field in schema.fields() {
        if !field_names.insert(&field.name) {
            issues.push(SchemaIssue::error(
                field.name.as_str(),
                format!("duplicate field name `{}`", field.name),
            ));
        }
    }
}

/// Reports field types without a registered handler.
fn check_field_types(schema: &Schema, issues: &mut Vec<SchemaIssue>) {
    let registry = FieldTypeRegistry::default();
    for field in schema.fields() {
        if !registry.is_known(&field.field_type) {
            issues.push(SchemaIssue::warning(
                field.name.as_str(),
                format!(
                    "field `{}` has unknown type `{}`; renderers will degrade",
                    field.name, field.field_type
                ),
            ));
        }
    }
}

/// Reports dangling `depends_on` and cross-rule field references.
fn check_references(
    schema: &Schema,
    known_fields: &BTreeSet<&FieldName>,
    issues: &mut Vec<SchemaIssue>,
) {
    for field in schema.fields() {
        for upstream in &field.depends_on {
            if upstream == &field.name {
                issues.push(SchemaIssue::warning(
                    field.name.as_str(),
                    format!("field `{}` depends on itself", field.name),
                ));
            } else if !known_fields.contains(upstream) {
                issues.push(SchemaIssue::error(
                    field.name.as_str(),
                    format!("field `{}` depends on unknown field `{upstream}`", field.name),
                ));
            }
        }
    }

    for rule in &schema.cross_rules {
        if rule.fields.is_empty() {
            issues.push(SchemaIssue::warning(
                rule.rule_id.as_str(),
                format!("rule `{}` names no fields", rule.rule_id),
            ));
        }
        for name in &rule.fields {
            if !known_fields.contains(name) {
                issues.push(SchemaIssue::error(
                    rule.rule_id.as_str(),
                    format!("rule `{}` references unknown field `{name}`", rule.rule_id),
                ));
            }
        }
    }
}

/// Reports structural condition failures and unknown condition references.
fn check_conditions(
    schema: &Schema,
    known_fields: &BTreeSet<&FieldName>,
    issues: &mut Vec<SchemaIssue>,
) {
    let mut conditions: Vec<(String, &Condition)> = Vec::new();
    for page in &schema.pages {
        if let Some(condition) = &page.show_when {
            conditions.push((page.page_id.as_str().to_string(), condition));
        }
        for field in &page.fields {
            if let Some(condition) = &field.show_when {
                conditions.push((field.name.as_str().to_string(), condition));
            }
        }
    }
    for rule in &schema.cross_rules {
        conditions.push((rule.rule_id.as_str().to_string(), &rule.expect));
    }

    for (location, condition) in conditions {
        if let Err(error) = condition.validate() {
            issues.push(SchemaIssue::error(
                location.clone(),
                format!("invalid condition: {error}"),
            ));
        }
        for referenced in condition.referenced_fields() {
            if !known_fields.contains(&FieldName::new(referenced.clone())) {
                issues.push(SchemaIssue::warning(
                    location.clone(),
                    format!("condition references unknown field `{referenced}`"),
                ));
            }
        }
    }
}

/// Reports cycles in the `depends_on` graph.
///
/// The engine short-circuits cascades at runtime, so a cycle degrades
/// rather than hangs; it is still almost always an authoring mistake.
fn check_dependency_cycles(schema: &Schema, issues: &mut Vec<SchemaIssue>) {
    let edges: BTreeMap<&FieldName, &Vec<FieldName>> =
        schema.fields().map(|field| (&field.name, &field.depends_on)).collect();

    let mut reported: BTreeSet<&FieldName> = BTreeSet::new();
    for start in edges.keys().copied() {
        if reported.contains(start) {
            continue;
        }
        let mut stack: Vec<&FieldName> = vec![start];
        let mut visited: BTreeSet<&FieldName> = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for upstream in edges.get(current).copied().into_iter().flatten() {
                if upstream == start {
                    if reported.insert(start) {
                        issues.push(SchemaIssue::warning(
                            start.as_str(),
                            format!("field `{start}` participates in a dependency cycle"),
                        ));
                    }
                } else if edges.contains_key(upstream) {
                    stack.push(upstream);
                }
            }
        }
    }
}
