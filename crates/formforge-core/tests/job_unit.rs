// crates/formforge-core/tests/job_unit.rs
// ============================================================================
// Module: Job Tracker Unit Tests
// Description: Job lifecycle, idempotent updates, cancellation, resumption.
// Purpose: Validate field-level anticipatory states driven by job polls.
// Dependencies: formforge_core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Validates the expecting-to-available field transitions, idempotent update
//! application across redelivered polls, terminal straggler resolution,
//! cancellation semantics, and resumption from a prior session.

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
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use formforge_core::BackgroundJob;
use formforge_core::Collaborators;
use formforge_core::EngineConfig;
use formforge_core::EngineEvent;
use formforge_core::EventSink;
use formforge_core::FieldName;
use formforge_core::FieldSpec;
use formforge_core::FormSession;
use formforge_core::JobDescriptor;
use formforge_core::JobFeed;
use formforge_core::JobFeedError;
use formforge_core::JobId;
use formforge_core::JobStatus;
use formforge_core::JobUpdate;
use formforge_core::MemoryEventSink;
use formforge_core::PageSpec;
use formforge_core::Schema;
use formforge_core::SuggestSpec;
use formforge_core::SuggestionStatus;
use formforge_core::Timestamp;
use serde_json::json;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Feed replaying scripted status responses; optionally failing cancels.
struct ScriptedFeed {
    statuses: Mutex<VecDeque<BackgroundJob>>,
    status_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    fail_cancel: bool,
}

impl ScriptedFeed {
    fn new(statuses: Vec<BackgroundJob>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            status_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            fail_cancel: false,
        }
    }

    fn failing_cancel(statuses: Vec<BackgroundJob>) -> Self {
        Self {
            fail_cancel: true,
            ..Self::new(statuses)
        }
    }
}

#[async_trait]
impl JobFeed for ScriptedFeed {
    async fn status(&self, job_id: &JobId) -> Result<BackgroundJob, JobFeedError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| JobFeedError::UnknownJob(job_id.clone()))
    }

    async fn cancel(&self, _job_id: &JobId) -> Result<(), JobFeedError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_cancel {
            Err(JobFeedError::Provider("cancel endpoint unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

fn suggestible(name: &str) -> FieldSpec {
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
        suggest: Some(SuggestSpec::default()),
        config: serde_json::Map::new(),
    }
}

fn schema_ab() -> Schema {
    Schema {
        version: "1".into(),
        pages: vec![PageSpec {
            page_id: "main".into(),
            title: None,
            description: None,
            fields: vec![suggestible("a"), suggestible("b")],
            show_when: None,
        }],
        cross_rules: Vec::new(),
    }
}

fn job(job_id: &str, status: JobStatus) -> BackgroundJob {
    BackgroundJob {
        job_id: job_id.into(),
        status,
        progress: 0.0,
        partial_results: BTreeMap::new(),
        completed_fields: Vec::new(),
        pending_fields: Vec::new(),
        new_updates: Vec::new(),
        field_errors: BTreeMap::new(),
        error: None,
        started_at: None,
        updated_at: None,
    }
}

fn update(field: &str, value: serde_json::Value, confidence: f64, at: i64) -> JobUpdate {
    JobUpdate {
        field: field.into(),
        value,
        confidence,
        at: Timestamp::from_unix_millis(at),
    }
}

fn session_with_feed(feed: Arc<dyn JobFeed>) -> (Arc<FormSession>, Arc<MemoryEventSink>) {
    let events = Arc::new(MemoryEventSink::new());
    let collaborators = Collaborators {
        jobs: feed,
        events: Arc::clone(&events) as Arc<dyn EventSink>,
        ..Collaborators::default()
    };
    let session = FormSession::new(
        schema_ab(),
        BTreeMap::new(),
        EngineConfig::default(),
        collaborators,
    );
    (session, events)
}

fn descriptor(job_id: &str) -> JobDescriptor {
    JobDescriptor {
        job_id: job_id.into(),
        affected_fields: vec![FieldName::new("a"), FieldName::new("b")],
    }
}

fn t(millis: i64) -> Timestamp {
    Timestamp::from_unix_millis(millis)
}

fn name(raw: &str) -> FieldName {
    FieldName::new(raw)
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

#[tokio::test]
async fn starting_a_job_marks_every_affected_field_expecting() {
    let feed = Arc::new(ScriptedFeed::new(Vec::new()));
    let (session, _) = session_with_feed(Arc::clone(&feed) as Arc<dyn JobFeed>);

    session.jobs().start(descriptor("job-1"), t(1));

    for field in ["a", "b"] {
        assert_eq!(
            session.store().suggestion(&name(field)).unwrap().status,
            SuggestionStatus::Expecting
        );
    }
    assert_eq!(session.store().job().unwrap().status, JobStatus::Queued);
    assert!(session.jobs().is_polling());
}

#[tokio::test]
async fn polls_move_completed_fields_to_available_and_resolve_stragglers() {
    let mut processing = job("job-1", JobStatus::Processing);
    processing.progress = 0.5;
    processing.new_updates = vec![update("a", json!("X"), 0.9, 100)];
    processing.completed_fields = vec![name("a")];
    processing.pending_fields = vec![name("b")];

    let mut done = job("job-1", JobStatus::Completed);
    done.progress = 1.0;
    done.partial_results = [(name("a"), json!("X"))].into_iter().collect();
    done.completed_fields = vec![name("a")];
    done.field_errors = [(name("b"), "no value found".to_string())].into_iter().collect();

    let feed = Arc::new(ScriptedFeed::new(vec![processing, done]));
    let (session, _) = session_with_feed(Arc::clone(&feed) as Arc<dyn JobFeed>);
    session.jobs().start(descriptor("job-1"), t(1));

    assert!(session.poll_job(t(2)).await);
    let a = session.store().suggestion(&name("a")).unwrap();
    assert_eq!(a.status, SuggestionStatus::Available);
    assert_eq!(a.suggested_value, Some(json!("X")));
    assert_eq!(
        session.store().suggestion(&name("b")).unwrap().status,
        SuggestionStatus::Expecting
    );

    // The terminal poll resolves the straggler from its reported error.
    assert!(!session.poll_job(t(3)).await);
    let b = session.store().suggestion(&name("b")).unwrap();
    assert_eq!(b.status, SuggestionStatus::None);
    assert_eq!(b.error.as_deref(), Some("no value found"));
    assert!(session.store().job().is_none());
    assert!(!session.jobs().is_polling());
}

#[tokio::test]
async fn redelivered_updates_apply_at_most_once() {
    let mut first = job("job-1", JobStatus::Processing);
    first.new_updates = vec![update("a", json!("X"), 0.9, 100)];

    // A slow retried poll redelivers the same (field, timestamp) update.
    let mut second = job("job-1", JobStatus::Processing);
    second.new_updates = vec![update("a", json!("X"), 0.9, 100)];

    let feed = Arc::new(ScriptedFeed::new(vec![first, second]));
    let (session, _) = session_with_feed(Arc::clone(&feed) as Arc<dyn JobFeed>);
    session.jobs().start(descriptor("job-1"), t(1));

    session.poll_job(t(2)).await;
    assert!(session.accept_suggestion(&name("a"), t(3)));
    assert_eq!(
        session.store().suggestion(&name("a")).unwrap().status,
        SuggestionStatus::Accepted
    );

    // The duplicate must not reopen the accepted suggestion.
    session.poll_job(t(4)).await;
    assert_eq!(
        session.store().suggestion(&name("a")).unwrap().status,
        SuggestionStatus::Accepted
    );
}

#[tokio::test]
async fn failed_jobs_revert_pending_fields_with_an_error() {
    let mut failed = job("job-1", JobStatus::Failed);
    failed.error = Some("analysis crashed".to_string());

    let feed = Arc::new(ScriptedFeed::new(vec![failed]));
    let (session, events) = session_with_feed(Arc::clone(&feed) as Arc<dyn JobFeed>);
    session.jobs().start(descriptor("job-1"), t(1));

    assert!(!session.poll_job(t(2)).await);
    for field in ["a", "b"] {
        let state = session.store().suggestion(&name(field)).unwrap();
        assert_eq!(state.status, SuggestionStatus::None);
        assert_eq!(state.error.as_deref(), Some("analysis crashed"));
    }
    assert!(
        events.events().iter().any(|event| matches!(event, EngineEvent::JobFailed { .. }))
    );
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

#[tokio::test]
async fn cancellation_stops_polling_and_reverts_fields_without_error() {
    let feed = Arc::new(ScriptedFeed::new(vec![job("job-1", JobStatus::Processing)]));
    let (session, _) = session_with_feed(Arc::clone(&feed) as Arc<dyn JobFeed>);
    session.jobs().start(descriptor("job-1"), t(1));

    session.cancel_job(&"job-1".into()).await;

    assert!(session.store().suggestion(&name("a")).is_none());
    assert!(session.store().suggestion(&name("b")).is_none());
    assert!(session.store().job().is_none());
    assert!(!session.jobs().is_polling());
    assert_eq!(feed.cancel_calls.load(Ordering::SeqCst), 1);

    // A queued poll that would otherwise fire now does nothing.
    assert!(!session.poll_job(t(2)).await);
    assert_eq!(feed.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn a_failed_remote_cancel_still_unblocks_local_state() {
    let feed =
        Arc::new(ScriptedFeed::failing_cancel(vec![job("job-1", JobStatus::Processing)]));
    let (session, events) = session_with_feed(Arc::clone(&feed) as Arc<dyn JobFeed>);
    session.jobs().start(descriptor("job-1"), t(1));

    session.cancel_job(&"job-1".into()).await;

    assert!(session.store().job().is_none());
    assert!(!session.jobs().is_polling());
    assert!(
        events
            .events()
            .iter()
            .any(|event| matches!(event, EngineEvent::JobCancelFailed { .. }))
    );
}

// ============================================================================
// SECTION: Resumption
// ============================================================================

#[tokio::test]
async fn resuming_an_active_job_restores_expecting_fields_and_polling() {
    let mut active = job("job-1", JobStatus::Processing);
    active.partial_results = [(name("a"), json!("X"))].into_iter().collect();
    active.completed_fields = vec![name("a")];
    active.pending_fields = vec![name("b")];

    let feed = Arc::new(ScriptedFeed::new(vec![active]));
    let (session, _) = session_with_feed(Arc::clone(&feed) as Arc<dyn JobFeed>);

    assert!(session.resume_job("job-1".into(), t(1)).await);
    assert_eq!(
        session.store().suggestion(&name("a")).unwrap().status,
        SuggestionStatus::Available
    );
    assert_eq!(
        session.store().suggestion(&name("b")).unwrap().status,
        SuggestionStatus::Expecting
    );
    assert!(session.jobs().is_polling());
}

#[tokio::test]
async fn resuming_a_finished_job_applies_results_without_polling() {
    let mut done = job("job-1", JobStatus::Completed);
    done.partial_results = [(name("a"), json!("X"))].into_iter().collect();
    done.completed_fields = vec![name("a")];

    let feed = Arc::new(ScriptedFeed::new(vec![done]));
    let (session, _) = session_with_feed(Arc::clone(&feed) as Arc<dyn JobFeed>);

    assert!(!session.resume_job("job-1".into(), t(1)).await);
    assert_eq!(
        session.store().suggestion(&name("a")).unwrap().status,
        SuggestionStatus::Available
    );
    assert!(!session.jobs().is_polling());
}
