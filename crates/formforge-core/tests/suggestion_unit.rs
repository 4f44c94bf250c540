// crates/formforge-core/tests/suggestion_unit.rs
// ============================================================================
// Module: Suggestion Engine Unit Tests
// Description: Request gating, confidence thresholds, expiry, cascades.
// Purpose: Validate the dual-value suggestion flow end to end.
// Dependencies: formforge_core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Validates the request gate, the confidence threshold, provider failure
//! degradation, the expiry sweep, and the dependent-field cascade.

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
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use formforge_core::CallContext;
use formforge_core::Collaborators;
use formforge_core::EngineConfig;
use formforge_core::EngineEvent;
use formforge_core::EventSink;
use formforge_core::FieldName;
use formforge_core::FieldSpec;
use formforge_core::FormSession;
use formforge_core::MemoryEventSink;
use formforge_core::PageSpec;
use formforge_core::Schema;
use formforge_core::SuggestError;
use formforge_core::SuggestSpec;
use formforge_core::SuggestionProvider;
use formforge_core::SuggestionResult;
use formforge_core::SuggestionStatus;
use formforge_core::Timestamp;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Provider serving canned proposals per field, counting calls.
struct MapProvider {
    calls: AtomicUsize,
    responses: Mutex<BTreeMap<FieldName, SuggestionResult>>,
    fail: bool,
}

impl MapProvider {
    fn new(responses: BTreeMap<FieldName, SuggestionResult>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            responses: Mutex::new(responses),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            responses: Mutex::new(BTreeMap::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl SuggestionProvider for MapProvider {
    async fn suggest(
        &self,
        _current: &Value,
        ctx: &CallContext,
    ) -> Result<Option<SuggestionResult>, SuggestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SuggestError::Provider("model unavailable".to_string()));
        }
        Ok(self.responses.lock().unwrap().get(&ctx.field).cloned())
    }
}

fn proposal(value: Value, confidence: f64) -> SuggestionResult {
    SuggestionResult {
        value,
        confidence,
        reason: Some("derived from context".to_string()),
        source: Some("document-analysis".to_string()),
    }
}

fn suggest_field(name: &str, min_confidence: Option<f64>) -> FieldSpec {
    FieldSpec {
        name: name.into(),
        field_type: "text".into(),
        label: name.to_string(),
        description: None,
        required: false,
        default_value: None,
        show_when: None,
        depends_on: Vec::new(),
        validation: None,
        suggest: Some(SuggestSpec {
            min_confidence,
            ttl_secs: None,
            params: serde_json::Map::new(),
        }),
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

fn session_with_provider(
    schema: Schema,
    provider: Arc<dyn SuggestionProvider>,
) -> (Arc<FormSession>, Arc<MemoryEventSink>) {
    let events = Arc::new(MemoryEventSink::new());
    let collaborators = Collaborators {
        suggestions: provider,
        events: Arc::clone(&events) as Arc<dyn EventSink>,
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
// SECTION: Request Gate
// ============================================================================

#[tokio::test]
async fn value_changes_produce_an_available_suggestion() {
    let provider = Arc::new(MapProvider::new(
        [(name("title"), proposal(json!("A Better Title"), 0.9))].into_iter().collect(),
    ));
    let (session, _) = session_with_provider(
        schema_of(vec![suggest_field("title", None)]),
        Arc::clone(&provider) as Arc<dyn SuggestionProvider>,
    );

    session.set_value(&name("title"), json!("my draft title"), t(1));
    session.flush_due(t(2)).await;

    let state = session.store().suggestion(&name("title")).unwrap();
    assert_eq!(state.status, SuggestionStatus::Available);
    assert_eq!(state.suggested_value, Some(json!("A Better Title")));
    assert_eq!(state.original_suggested_value, Some(json!("A Better Title")));
    assert_eq!(state.user_value, Some(json!("my draft title")));
    assert_eq!(state.source.as_deref(), Some("document-analysis"));
}

#[tokio::test]
async fn empty_values_never_request_suggestions() {
    let provider = Arc::new(MapProvider::new(BTreeMap::new()));
    let (session, _) = session_with_provider(
        schema_of(vec![suggest_field("title", None)]),
        Arc::clone(&provider) as Arc<dyn SuggestionProvider>,
    );

    session.set_value(&name("title"), json!(""), t(1));
    session.flush_due(t(2)).await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn a_fresh_suggestion_blocks_duplicate_requests() {
    let provider = Arc::new(MapProvider::new(
        [(name("title"), proposal(json!("A Better Title"), 0.9))].into_iter().collect(),
    ));
    let (session, _) = session_with_provider(
        schema_of(vec![suggest_field("title", None)]),
        Arc::clone(&provider) as Arc<dyn SuggestionProvider>,
    );

    session.set_value(&name("title"), json!("first"), t(1));
    session.flush_due(t(2)).await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    // The unexpired suggestion gates the next request even though the
    // value changed again.
    session.set_value(&name("title"), json!("second"), t(3));
    session.flush_due(t(4)).await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fields_without_a_suggest_spec_are_ignored() {
    let provider = Arc::new(MapProvider::new(BTreeMap::new()));
    let mut plain = suggest_field("title", None);
    plain.suggest = None;
    let (session, _) = session_with_provider(
        schema_of(vec![plain]),
        Arc::clone(&provider) as Arc<dyn SuggestionProvider>,
    );

    session.set_value(&name("title"), json!("anything"), t(1));
    session.flush_due(t(2)).await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// SECTION: Confidence Gate
// ============================================================================

#[tokio::test]
async fn low_confidence_proposals_are_discarded_before_storage() {
    let provider = Arc::new(MapProvider::new(
        [(name("title"), proposal(json!("meh"), 0.5))].into_iter().collect(),
    ));
    let (session, events) = session_with_provider(
        schema_of(vec![suggest_field("title", None)]),
        Arc::clone(&provider) as Arc<dyn SuggestionProvider>,
    );

    session.set_value(&name("title"), json!("draft"), t(1));
    session.flush_due(t(2)).await;

    assert!(session.store().suggestion(&name("title")).is_none());
    assert!(events.events().iter().any(|event| matches!(
        event,
        EngineEvent::SuggestionBelowThreshold { confidence, .. } if (*confidence - 0.5).abs() < f64::EPSILON
    )));
}

#[tokio::test]
async fn per_field_thresholds_override_the_engine_default() {
    let provider = Arc::new(MapProvider::new(
        [(name("title"), proposal(json!("ok"), 0.5))].into_iter().collect(),
    ));
    let (session, _) = session_with_provider(
        schema_of(vec![suggest_field("title", Some(0.4))]),
        Arc::clone(&provider) as Arc<dyn SuggestionProvider>,
    );

    session.set_value(&name("title"), json!("draft"), t(1));
    session.flush_due(t(2)).await;
    assert_eq!(
        session.store().suggestion(&name("title")).unwrap().status,
        SuggestionStatus::Available
    );
}

// ============================================================================
// SECTION: Failure Degradation
// ============================================================================

#[tokio::test]
async fn provider_failures_degrade_to_no_suggestion() {
    let provider = Arc::new(MapProvider::failing());
    let (session, events) = session_with_provider(
        schema_of(vec![suggest_field("title", None)]),
        Arc::clone(&provider) as Arc<dyn SuggestionProvider>,
    );

    session.set_value(&name("title"), json!("draft"), t(1));
    session.flush_due(t(2)).await;

    assert!(session.store().suggestion(&name("title")).is_none());
    assert!(session.store().outcome(&name("title")).is_none_or(|outcome| outcome.valid));
    assert!(
        events
            .events()
            .iter()
            .any(|event| matches!(event, EngineEvent::SuggestionFailed { .. }))
    );
}

// ============================================================================
// SECTION: Expiry Sweep
// ============================================================================

#[tokio::test]
async fn the_sweep_clears_lapsed_accepted_suggestions() {
    let provider = Arc::new(MapProvider::new(
        [(name("title"), proposal(json!("A Better Title"), 0.9))].into_iter().collect(),
    ));
    let (session, events) = session_with_provider(
        schema_of(vec![suggest_field("title", None)]),
        Arc::clone(&provider) as Arc<dyn SuggestionProvider>,
    );
    let ttl = EngineConfig::default().suggestion_ttl_ms;

    session.set_value(&name("title"), json!("draft"), t(1));
    session.flush_due(t(2)).await;
    session.accept_suggestion(&name("title"), t(3));

    // Before expiry the sweep leaves it alone.
    assert!(session.sweep(t(3).plus_millis(ttl - 1)).is_empty());

    let cleared = session.sweep(t(4).plus_millis(ttl));
    assert_eq!(cleared, vec![name("title")]);
    assert!(session.store().suggestion(&name("title")).is_none());
    assert!(
        events
            .events()
            .iter()
            .any(|event| matches!(event, EngineEvent::SuggestionsExpired { .. }))
    );

    // The accepted value itself survives the sweep.
    assert_eq!(session.value(&name("title")), Some(json!("A Better Title")));
}

// ============================================================================
// SECTION: Dependent Cascade
// ============================================================================

#[tokio::test]
async fn upstream_changes_invalidate_and_refresh_dependent_suggestions() {
    let provider = Arc::new(MapProvider::new(
        [(name("city"), proposal(json!("Berlin"), 0.9))].into_iter().collect(),
    ));
    let mut city = suggest_field("city", None);
    city.depends_on = vec![name("country")];
    let schema = schema_of(vec![suggest_field("country", None), city]);
    let (session, _) = session_with_provider(
        schema,
        Arc::clone(&provider) as Arc<dyn SuggestionProvider>,
    );

    session.set_value(&name("city"), json!("somewhere"), t(1));
    session.flush_due(t(2)).await;
    assert_eq!(
        session.store().suggestion(&name("city")).unwrap().status,
        SuggestionStatus::Available
    );
    let calls_before = provider.calls.load(Ordering::SeqCst);

    // The fresh suggestion would normally gate a re-request; the upstream
    // change clears it first.
    session.set_value(&name("country"), json!("de"), t(3));
    session.flush_due(t(4)).await;
    assert!(provider.calls.load(Ordering::SeqCst) > calls_before);
    assert_eq!(
        session.store().suggestion(&name("city")).unwrap().status,
        SuggestionStatus::Available
    );
}
