// crates/formforge-schema-check/tests/checks.rs
// ============================================================================
// Module: Schema Check Tests
// Description: Lint findings for malformed schema documents.
// Purpose: Validate each finding class the lint reports.
// Dependencies: formforge_core, formforge_schema_check, serde_json
// ============================================================================

//! ## Overview
//! Validates duplicate detection, dangling references, condition problems,
//! dependency cycles, and unknown-type warnings.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use formforge_core::CrossFieldRule;
use formforge_core::FieldName;
use formforge_core::FieldSpec;
use formforge_core::PageSpec;
use formforge_core::Schema;
use formforge_core::Severity;
use formforge_schema_check::IssueSeverity;
use formforge_schema_check::SchemaIssue;
use formforge_schema_check::check_schema;
use serde_json::json;
use when_logic::Condition;
use when_logic::Operand;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn field(name: &str, field_type: &str) -> FieldSpec {
    FieldSpec {
        name: name.into(),
        field_type: field_type.into(),
        label: name.to_string(),
        description: None,
        required: false,
        default_value: None,
        show_when: None,
        depends_on: Vec::new(),
        validation: None,
        suggest: None,
        config: serde_json::Map::new(),
    }
}

fn schema_of(fields: Vec<FieldSpec>) -> Schema {
    Schema {
        version: "1".into(),
        pages: vec![PageSpec {
            page_id: "main".into(),
            title: None,
            description: None,
            fields,
            show_when: None,
        }],
        cross_rules: Vec::new(),
    }
}

fn errors(issues: &[SchemaIssue]) -> Vec<&SchemaIssue> {
    issues.iter().filter(|issue| issue.severity == IssueSeverity::Error).collect()
}

// ============================================================================
// SECTION: Findings
// ============================================================================

#[test]
fn a_well_formed_schema_reports_nothing() {
    let schema = schema_of(vec![field("title", "text"), field("count", "number")]);
    assert!(check_schema(&schema).is_empty());
}

#[test]
fn an_empty_schema_is_an_error() {
    let schema = Schema {
        version: "1".into(),
        pages: Vec::new(),
        cross_rules: Vec::new(),
    };
    let issues = check_schema(&schema);
    assert_eq!(errors(&issues).len(), 1);
}

#[test]
fn duplicate_field_names_are_errors() {
    let schema = schema_of(vec![field("title", "text"), field("title", "textarea")]);
    let issues = check_schema(&schema);
    assert!(
        errors(&issues)
            .iter()
            .any(|issue| issue.message.contains("duplicate field name"))
    );
}

#[test]
fn duplicate_page_ids_are_errors() {
    let mut schema = schema_of(vec![field("a", "text")]);
    schema.pages.push(PageSpec {
        page_id: "main".into(),
        title: None,
        description: None,
        fields: vec![field("b", "text")],
        show_when: None,
    });
    let issues = check_schema(&schema);
    assert!(
        errors(&issues).iter().any(|issue| issue.message.contains("duplicate page id"))
    );
}

#[test]
fn dangling_depends_on_references_are_errors() {
    let mut dependent = field("phone", "phone");
    dependent.depends_on = vec![FieldName::new("country")];
    let schema = schema_of(vec![dependent]);
    let issues = check_schema(&schema);
    assert!(
        errors(&issues)
            .iter()
            .any(|issue| issue.message.contains("unknown field `country`"))
    );
}

#[test]
fn self_dependencies_are_warnings() {
    let mut looped = field("a", "text");
    looped.depends_on = vec![FieldName::new("a")];
    let schema = schema_of(vec![looped]);
    let issues = check_schema(&schema);
    assert!(issues.iter().any(|issue| {
        issue.severity == IssueSeverity::Warning && issue.message.contains("depends on itself")
    }));
}

#[test]
fn dependency_cycles_are_warnings() {
    let mut a = field("a", "text");
    a.depends_on = vec![FieldName::new("b")];
    let mut b = field("b", "text");
    b.depends_on = vec![FieldName::new("a")];
    let schema = schema_of(vec![a, b]);
    let issues = check_schema(&schema);
    assert!(issues.iter().any(|issue| issue.message.contains("dependency cycle")));
}

#[test]
fn cross_rules_referencing_unknown_fields_are_errors() {
    let mut schema = schema_of(vec![field("start_date", "date")]);
    schema.cross_rules.push(CrossFieldRule {
        rule_id: "date-order".into(),
        fields: vec![FieldName::new("start_date"), FieldName::new("end_date")],
        expect: Condition::GreaterOrEqual {
            field: "end_date".to_string(),
            operand: Operand::Field("start_date".to_string()),
        },
        message: "end date must not precede start date".to_string(),
        severity: Severity::Error,
        blocking: None,
    });
    let issues = check_schema(&schema);
    assert!(
        errors(&issues)
            .iter()
            .any(|issue| issue.message.contains("unknown field `end_date`"))
    );
}

#[test]
fn conditions_referencing_unknown_fields_are_warnings() {
    let mut conditional = field("detail", "text");
    conditional.show_when = Some(Condition::Equals {
        field: "kind".to_string(),
        operand: Operand::Literal(json!("other")),
    });
    let schema = schema_of(vec![conditional]);
    let issues = check_schema(&schema);
    assert!(issues.iter().any(|issue| {
        issue.severity == IssueSeverity::Warning
            && issue.message.contains("unknown field `kind`")
    }));
}

#[test]
fn structurally_invalid_conditions_are_errors() {
    let mut conditional = field("detail", "text");
    conditional.show_when = Some(Condition::All {
        conditions: Vec::new(),
    });
    let schema = schema_of(vec![conditional]);
    let issues = check_schema(&schema);
    assert!(
        errors(&issues).iter().any(|issue| issue.message.contains("invalid condition"))
    );
}

#[test]
fn unknown_field_types_are_warnings() {
    let schema = schema_of(vec![field("widget", "holo-display")]);
    let issues = check_schema(&schema);
    assert!(issues.iter().any(|issue| {
        issue.severity == IssueSeverity::Warning && issue.message.contains("unknown type")
    }));
}
