// crates/formforge-core/tests/validation_unit.rs
// ============================================================================
// Module: Validation Engine Unit Tests
// Description: Pipeline ordering, caching, coalescing, staleness, cascades.
// Purpose: Validate the validation engine against its contract.
// Dependencies: formforge_core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Validates the fixed synchronous pipeline order, the remote-check cache
//! and in-flight coalescing, stale-result discarding, the debounce queue,
//! cross-field rules, and the dependency cascade.

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

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use formforge_core::CallContext;
use formforge_core::CheckId;
use formforge_core::Collaborators;
use formforge_core::CrossFieldRule;
use formforge_core::EngineConfig;
use formforge_core::EngineEvent;
use formforge_core::FieldName;
use formforge_core::FieldSpec;
use formforge_core::FormSession;
use formforge_core::MemoryEventSink;
use formforge_core::PageSpec;
use formforge_core::RemoteCheckError;
use formforge_core::RemoteCheckSpec;
use formforge_core::RemoteOutcome;
use formforge_core::RemoteValidator;
use formforge_core::Schema;
use formforge_core::Timestamp;
use formforge_core::ValidationSpec;
use formforge_core::ValueSource;
use serde_json::Value;
use serde_json::json;
use tokio::sync::Notify;
use when_logic::Condition;
use when_logic::Operand;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Validator counting calls and rejecting values listed as taken.
struct CountingValidator {
    calls: AtomicUsize,
    taken: Vec<Value>,
}

impl CountingValidator {
    fn new(taken: Vec<Value>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            taken,
        }
    }
}

#[async_trait]
impl RemoteValidator for CountingValidator {
    async fn check(
        &self,
        _check_id: &CheckId,
        value: &Value,
        _ctx: &CallContext,
    ) -> Result<RemoteOutcome, RemoteCheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.taken.contains(value) {
            Ok(RemoteOutcome::Message("already taken".to_string()))
        } else {
            Ok(RemoteOutcome::Valid)
        }
    }
}

/// Validator that blocks until released, for interleaving tests.
struct GatedValidator {
    calls: AtomicUsize,
    entered: Notify,
    release: Notify,
    taken: Vec<Value>,
}

impl GatedValidator {
    fn new(taken: Vec<Value>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
            taken,
        }
    }
}

#[async_trait]
impl RemoteValidator for GatedValidator {
    async fn check(
        &self,
        _check_id: &CheckId,
        value: &Value,
        _ctx: &CallContext,
    ) -> Result<RemoteOutcome, RemoteCheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        if self.taken.contains(value) {
            Ok(RemoteOutcome::Message("already taken".to_string()))
        } else {
            Ok(RemoteOutcome::Valid)
        }
    }
}

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

fn one_page(fields: Vec<FieldSpec>, cross_rules: Vec<CrossFieldRule>) -> Schema {
    Schema {
        version: "1".into(),
        pages: vec![PageSpec {
            page_id: "main".into(),
            title: None,
            description: None,
            fields,
            show_when: None,
        }],
        cross_rules,
    }
}

fn remote_spec(check_id: &str) -> ValidationSpec {
    ValidationSpec {
        remote: Some(RemoteCheckSpec {
            check_id: check_id.into(),
            debounce_ms: None,
        }),
        ..ValidationSpec::default()
    }
}

fn session_with_validator(
    schema: Schema,
    validator: Arc<dyn RemoteValidator>,
) -> (Arc<FormSession>, Arc<MemoryEventSink>) {
    let events = Arc::new(MemoryEventSink::new());
    let collaborators = Collaborators {
        validator,
        events: Arc::clone(&events) as Arc<dyn formforge_core::EventSink>,
        ..Collaborators::default()
    };
    let session = FormSession::new(
        schema,
        BTreeMap::new(),
        EngineConfig::default(),
        collaborators,
    );
    (session, events)
}

fn t(millis: i64) -> Timestamp {
    Timestamp::from_unix_millis(millis)
}

fn name(raw: &str) -> FieldName {
    FieldName::new(raw)
}

// ============================================================================
// SECTION: Synchronous Pipeline Order
// ============================================================================

#[tokio::test]
async fn required_failure_wins_over_length_failure() {
    let schema = one_page(
        vec![FieldSpec {
            required: true,
            validation: Some(ValidationSpec {
                min_length: Some(5),
                ..ValidationSpec::default()
            }),
            ..field("title", "text")
        }],
        Vec::new(),
    );
    let (session, _) = session_with_validator(schema, Arc::new(CountingValidator::new(vec![])));

    session.store().set_value(&name("title"), json!(""), ValueSource::User, t(1));
    let outcome =
        session.validation().validate_field(&name("title"), t(2)).await.unwrap();
    assert!(!outcome.valid);
    assert_eq!(outcome.message.as_deref(), Some("title is required"));
}

#[tokio::test]
async fn email_and_phone_and_range_checks_reject_bad_values() {
    let schema = one_page(
        vec![
            FieldSpec {
                validation: Some(ValidationSpec {
                    email: true,
                    ..ValidationSpec::default()
                }),
                ..field("email", "email")
            },
            FieldSpec {
                validation: Some(ValidationSpec {
                    phone: true,
                    ..ValidationSpec::default()
                }),
                ..field("phone", "phone")
            },
            FieldSpec {
                validation: Some(ValidationSpec {
                    min: Some(json!(1)),
                    max: Some(json!(10)),
                    ..ValidationSpec::default()
                }),
                ..field("count", "number")
            },
        ],
        Vec::new(),
    );
    let (session, _) = session_with_validator(schema, Arc::new(CountingValidator::new(vec![])));
    let engine = session.validation();

    session.store().set_value(&name("email"), json!("nope"), ValueSource::User, t(1));
    assert!(!engine.validate_field(&name("email"), t(1)).await.unwrap().valid);
    session.store().set_value(&name("email"), json!("a@b.com"), ValueSource::User, t(2));
    assert!(engine.validate_field(&name("email"), t(2)).await.unwrap().valid);

    session.store().set_value(&name("phone"), json!("12345"), ValueSource::User, t(3));
    assert!(!engine.validate_field(&name("phone"), t(3)).await.unwrap().valid);
    session
        .store()
        .set_value(&name("phone"), json!("+1 (555) 123-4567"), ValueSource::User, t(4));
    assert!(engine.validate_field(&name("phone"), t(4)).await.unwrap().valid);

    session.store().set_value(&name("count"), json!(42), ValueSource::User, t(5));
    let outcome = engine.validate_field(&name("count"), t(5)).await.unwrap();
    assert_eq!(outcome.message.as_deref(), Some("count must be at most 10"));
}

#[tokio::test]
async fn empty_optional_values_pass_every_check() {
    let schema = one_page(
        vec![FieldSpec {
            validation: Some(ValidationSpec {
                min_length: Some(5),
                email: true,
                ..ValidationSpec::default()
            }),
            ..field("contact", "email")
        }],
        Vec::new(),
    );
    let (session, _) = session_with_validator(schema, Arc::new(CountingValidator::new(vec![])));
    let outcome =
        session.validation().validate_field(&name("contact"), t(1)).await.unwrap();
    assert!(outcome.valid);
}

// ============================================================================
// SECTION: Cache and Coalescing
// ============================================================================

#[tokio::test]
async fn identical_values_within_the_ttl_hit_the_cache() {
    let validator = Arc::new(CountingValidator::new(vec![]));
    let schema = one_page(
        vec![FieldSpec {
            validation: Some(remote_spec("unique-title")),
            ..field("title", "text")
        }],
        Vec::new(),
    );
    let (session, _) =
        session_with_validator(schema, Arc::clone(&validator) as Arc<dyn RemoteValidator>);
    let engine = session.validation();

    session.store().set_value(&name("title"), json!("draft"), ValueSource::User, t(1));
    engine.validate_field(&name("title"), t(1)).await.unwrap();
    engine.validate_field(&name("title"), t(2)).await.unwrap();

    assert_eq!(validator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cache_expires_after_the_ttl_window() {
    let validator = Arc::new(CountingValidator::new(vec![]));
    let schema = one_page(
        vec![FieldSpec {
            validation: Some(remote_spec("unique-title")),
            ..field("title", "text")
        }],
        Vec::new(),
    );
    let (session, _) =
        session_with_validator(schema, Arc::clone(&validator) as Arc<dyn RemoteValidator>);
    let engine = session.validation();
    let ttl = EngineConfig::default().validation_cache_ttl_ms;

    session.store().set_value(&name("title"), json!("draft"), ValueSource::User, t(1));
    engine.validate_field(&name("title"), t(1)).await.unwrap();
    engine.validate_field(&name("title"), t(1).plus_millis(ttl + 1)).await.unwrap();

    assert_eq!(validator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_identical_requests_share_one_provider_call() {
    let validator = Arc::new(GatedValidator::new(vec![]));
    let schema = one_page(
        vec![FieldSpec {
            validation: Some(remote_spec("unique-title")),
            ..field("title", "text")
        }],
        Vec::new(),
    );
    let (session, _) =
        session_with_validator(schema, Arc::clone(&validator) as Arc<dyn RemoteValidator>);

    session.store().set_value(&name("title"), json!("draft"), ValueSource::User, t(1));

    let first = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.validation().validate_field(&name("title"), t(1)).await }
    });
    validator.entered.notified().await;
    let second = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.validation().validate_field(&name("title"), t(1)).await }
    });

    validator.release.notify_one();
    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert!(first.valid && second.valid);
    assert_eq!(validator.calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// SECTION: Staleness
// ============================================================================

#[tokio::test]
async fn stale_results_never_overwrite_the_current_value_outcome() {
    let validator = Arc::new(GatedValidator::new(vec![json!("a")]));
    let schema = one_page(
        vec![FieldSpec {
            validation: Some(remote_spec("unique-title")),
            ..field("title", "text")
        }],
        Vec::new(),
    );
    let (session, events) =
        session_with_validator(schema, Arc::clone(&validator) as Arc<dyn RemoteValidator>);

    session.set_value(&name("title"), json!("a"), t(1));
    let in_flight = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.validation().validate_field(&name("title"), t(1)).await }
    });
    validator.entered.notified().await;

    // The value moves on while the "a" check is still in flight.
    session.set_value(&name("title"), json!("b"), t(2));
    validator.release.notify_one();
    let _ = in_flight.await.unwrap();

    let stored = session.store().outcome(&name("title")).unwrap();
    assert!(stored.valid, "the rejected outcome for `a` must not stick to `b`");
    assert!(
        events
            .events()
            .iter()
            .any(|event| matches!(event, EngineEvent::StaleResultDiscarded { .. }))
    );
}

// ============================================================================
// SECTION: Debounce Queue
// ============================================================================

#[tokio::test]
async fn debounced_checks_fire_only_after_the_window_elapses() {
    let validator = Arc::new(CountingValidator::new(vec![]));
    let schema = one_page(
        vec![FieldSpec {
            validation: Some(remote_spec("unique-title")),
            ..field("title", "text")
        }],
        Vec::new(),
    );
    let (session, _) =
        session_with_validator(schema, Arc::clone(&validator) as Arc<dyn RemoteValidator>);
    let debounce = EngineConfig::default().remote_debounce_ms;

    // Each keystroke re-queues; nothing runs until the window elapses.
    session.set_value(&name("title"), json!("d"), t(0));
    session.set_value(&name("title"), json!("dr"), t(100));
    session.set_value(&name("title"), json!("draft"), t(200));

    session.flush_due(t(250)).await;
    assert_eq!(validator.calls.load(Ordering::SeqCst), 0);

    session.flush_due(t(200 + debounce)).await;
    assert_eq!(validator.calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// SECTION: Cross-Field Rules
// ============================================================================

#[tokio::test]
async fn failing_date_rule_attaches_to_both_fields() {
    let rule = CrossFieldRule {
        rule_id: "date-order".into(),
        fields: vec![name("start_date"), name("end_date")],
        expect: Condition::GreaterOrEqual {
            field: "end_date".to_string(),
            operand: Operand::Field("start_date".to_string()),
        },
        message: "end date must not precede start date".to_string(),
        severity: formforge_core::Severity::Error,
        blocking: None,
    };
    let schema = one_page(
        vec![field("start_date", "date"), field("end_date", "date")],
        vec![rule],
    );
    let (session, _) = session_with_validator(schema, Arc::new(CountingValidator::new(vec![])));

    session.set_value(&name("start_date"), json!("2025-01-10"), t(1));
    session.set_value(&name("end_date"), json!("2025-01-01"), t(2));

    let failures = session.validation().validate_cross();
    assert_eq!(failures.len(), 2);
    assert!(failures[&name("start_date")].is_blocking_failure());
    assert!(failures[&name("end_date")].is_blocking_failure());

    // Fixing the order clears the rule.
    session.set_value(&name("end_date"), json!("2025-02-01"), t(3));
    assert!(session.validation().validate_cross().is_empty());
}

// ============================================================================
// SECTION: Dependency Cascade
// ============================================================================

#[tokio::test]
async fn changing_an_upstream_field_invalidates_the_dependent_cache() {
    let validator = Arc::new(CountingValidator::new(vec![]));
    let schema = one_page(
        vec![field("country", "select"), FieldSpec {
            depends_on: vec![name("country")],
            validation: Some(remote_spec("phone-for-country")),
            ..field("phone", "phone")
        }],
        Vec::new(),
    );
    let (session, _) =
        session_with_validator(schema, Arc::clone(&validator) as Arc<dyn RemoteValidator>);
    let engine = session.validation();
    let debounce = EngineConfig::default().remote_debounce_ms;

    session.set_value(&name("phone"), json!("5551234567"), t(1));
    engine.validate_field(&name("phone"), t(1)).await.unwrap();
    assert_eq!(validator.calls.load(Ordering::SeqCst), 1);

    // Same phone value revalidates without the cascade: cache hit.
    engine.validate_field(&name("phone"), t(2)).await.unwrap();
    assert_eq!(validator.calls.load(Ordering::SeqCst), 1);

    // The upstream change drops the cached entry and re-queues the check.
    session.set_value(&name("country"), json!("de"), t(3));
    session.flush_due(t(3).plus_millis(debounce)).await;
    assert_eq!(validator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn dependency_cycles_settle_instead_of_recursing() {
    let schema = one_page(
        vec![
            FieldSpec {
                depends_on: vec![name("b")],
                ..field("a", "text")
            },
            FieldSpec {
                depends_on: vec![name("a")],
                ..field("b", "text")
            },
        ],
        Vec::new(),
    );
    let (session, _) = session_with_validator(schema, Arc::new(CountingValidator::new(vec![])));

    let affected = session.validation().on_value_changed(&name("a"), t(1));
    assert_eq!(affected.len(), 2);
}
