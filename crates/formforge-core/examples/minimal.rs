// crates/formforge-core/examples/minimal.rs
// ============================================================================
// Module: FormForge Minimal Example
// Description: Minimal end-to-end form session using in-memory collaborators.
// Purpose: Demonstrate value writes, suggestions, gated navigation, submit.
// Dependencies: formforge-core
// ============================================================================

//! ## Overview
//! Drives a two-page form through a full session: typing a value, receiving
//! and accepting a suggestion, passing the navigation gate, and submitting.
//! All collaborators are in-memory and host-agnostic.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use formforge_core::CallContext;
use formforge_core::Collaborators;
use formforge_core::EngineConfig;
use formforge_core::FieldName;
use formforge_core::FieldSpec;
use formforge_core::FormSession;
use formforge_core::NavigationOutcome;
use formforge_core::PageSpec;
use formforge_core::Schema;
use formforge_core::SubmissionSink;
use formforge_core::SubmitError;
use formforge_core::SubmitOutcome;
use formforge_core::SuggestError;
use formforge_core::SuggestSpec;
use formforge_core::SuggestionProvider;
use formforge_core::SuggestionResult;
use formforge_core::Timestamp;
use formforge_core::ValidationSpec;
use serde_json::Value;
use serde_json::json;

/// Error type for example preconditions.
#[derive(Debug)]
struct ExampleError(&'static str);

impl std::fmt::Display for ExampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ExampleError {}

/// Suggestion provider that tidies whatever the user typed.
struct TidyingProvider;

#[async_trait]
impl SuggestionProvider for TidyingProvider {
    async fn suggest(
        &self,
        current: &Value,
        _ctx: &CallContext,
    ) -> Result<Option<SuggestionResult>, SuggestError> {
        let Some(text) = current.as_str() else {
            return Ok(None);
        };
        Ok(Some(SuggestionResult {
            value: json!(text.trim().to_uppercase()),
            confidence: 0.92,
            reason: Some("normalized casing".to_string()),
            source: Some("example-normalizer".to_string()),
        }))
    }
}

/// Submission sink recording the final payload.
#[derive(Default)]
struct RecordingSink {
    /// Submitted payloads.
    payloads: Mutex<Vec<BTreeMap<FieldName, Value>>>,
}

#[async_trait]
impl SubmissionSink for RecordingSink {
    async fn submit(&self, values: &BTreeMap<FieldName, Value>) -> Result<(), SubmitError> {
        self.payloads
            .lock()
            .map_err(|_| SubmitError::Sink("sink mutex poisoned".to_string()))?
            .push(values.clone());
        Ok(())
    }
}

/// Builds the example schema: a contact page and a details page.
fn example_schema() -> Schema {
    Schema {
        version: "1".into(),
        pages: vec![
            PageSpec {
                page_id: "contact".into(),
                title: Some("Contact".to_string()),
                description: None,
                fields: vec![
                    FieldSpec {
                        name: "email".into(),
                        field_type: "email".into(),
                        label: "Email".to_string(),
                        description: None,
                        required: true,
                        default_value: None,
                        show_when: None,
                        depends_on: Vec::new(),
                        validation: Some(ValidationSpec {
                            email: true,
                            ..ValidationSpec::default()
                        }),
                        suggest: None,
                        config: serde_json::Map::new(),
                    },
                    FieldSpec {
                        name: "company".into(),
                        field_type: "text".into(),
                        label: "Company".to_string(),
                        description: None,
                        required: false,
                        default_value: None,
                        show_when: None,
                        depends_on: Vec::new(),
                        validation: None,
                        suggest: Some(SuggestSpec::default()),
                        config: serde_json::Map::new(),
                    },
                ],
                show_when: None,
            },
            PageSpec {
                page_id: "details".into(),
                title: Some("Details".to_string()),
                description: None,
                fields: vec![FieldSpec {
                    name: "notes".into(),
                    field_type: "textarea".into(),
                    label: "Notes".to_string(),
                    description: None,
                    required: false,
                    default_value: None,
                    show_when: None,
                    depends_on: Vec::new(),
                    validation: None,
                    suggest: None,
                    config: serde_json::Map::new(),
                }],
                show_when: None,
            },
        ],
        cross_rules: Vec::new(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink = Arc::new(RecordingSink::default());
    let collaborators = Collaborators {
        suggestions: Arc::new(TidyingProvider),
        submission: Arc::clone(&sink) as Arc<dyn SubmissionSink>,
        ..Collaborators::default()
    };
    let session = FormSession::new(
        example_schema(),
        BTreeMap::new(),
        EngineConfig::default(),
        collaborators,
    );

    let now = Timestamp::from_unix_millis(1_700_000_000_000);
    let email = FieldName::new("email");
    let company = FieldName::new("company");

    session.set_value(&email, json!("a@b.com"), now);
    session.set_value(&company, json!("  acme gmbh "), now);
    session.flush_due(now.plus_millis(1_000)).await;

    if !session.accept_suggestion(&company, now.plus_millis(1_100)) {
        return Err(Box::new(ExampleError("expected a company suggestion")) as Box<dyn std::error::Error>);
    }
    if session.value(&company) != Some(json!("ACME GMBH")) {
        return Err(Box::new(ExampleError("expected the accepted proposal")));
    }

    match session.next(now.plus_millis(1_200)).await {
        NavigationOutcome::Advanced {
            page: 1,
        } => {}
        _ => return Err(Box::new(ExampleError("expected the gate to open"))),
    }

    match session.submit(now.plus_millis(1_300)).await {
        SubmitOutcome::Submitted => {}
        _ => return Err(Box::new(ExampleError("expected a successful submit"))),
    }

    let payloads = sink
        .payloads
        .lock()
        .map_err(|_| ExampleError("sink mutex poisoned"))?;
    if payloads.len() != 1 {
        return Err(Box::new(ExampleError("expected exactly one submission")));
    }
    Ok(())
}
