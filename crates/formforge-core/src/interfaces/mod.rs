// crates/formforge-core/src/interfaces/mod.rs
// ============================================================================
// Module: FormForge Interfaces
// Description: Host-agnostic interfaces for suggestions, validation, jobs,
//              persistence, submission, and diagnostics.
// Purpose: Define the contract surfaces the engine integrates through.
// Dependencies: crate::core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the engine reaches the outside world without
//! embedding host-specific details. Providers are injected as trait objects;
//! the engine treats every call as fallible, converts failures into error
//! states, and never lets one escape as a panic. Null implementations are
//! provided so hosts wire up only the collaborators they need.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::BackgroundJob;
use crate::core::EngineEvent;
use crate::core::FieldChange;
use crate::core::FieldName;
use crate::core::JobDescriptor;
use crate::core::JobId;
use crate::core::RemoteOutcome;
use crate::core::Schema;
use crate::core::SuggestionResult;
use crate::core::identifiers::CheckId;

// ============================================================================
// SECTION: Call Contexts
// ============================================================================

/// Context provided to suggestion and validation providers.
///
/// # Invariants
/// - `values` is a snapshot; providers must not treat it as live state.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Field the call concerns.
    pub field: FieldName,
    /// Snapshot of all current values.
    pub values: BTreeMap<FieldName, Value>,
    /// Schema for the session.
    pub schema: Arc<Schema>,
}

// ============================================================================
// SECTION: Suggestion Provider
// ============================================================================

/// Suggestion provider errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SuggestError {
    /// Provider reported an error.
    #[error("suggestion provider error: {0}")]
    Provider(String),
    /// Provider does not implement the requested operation.
    #[error("suggestion operation not supported")]
    Unsupported,
}

/// Bulk suggestion request covering many fields at once.
///
/// # Invariants
/// - `attachments` are opaque references (uploaded documents, images) the
///   provider may analyze; the engine does not interpret them.
#[derive(Debug, Clone)]
pub struct BulkSuggestRequest {
    /// Opaque attachment references.
    pub attachments: Vec<Value>,
    /// Schema for the session.
    pub schema: Arc<Schema>,
    /// Snapshot of all current values.
    pub values: BTreeMap<FieldName, Value>,
}

/// Bulk suggestion response.
///
/// # Invariants
/// - `immediate` results and a `job` may both be present; immediate results
///   apply first, then the job fills the rest over time.
#[derive(Debug, Clone, Default)]
pub struct BulkSuggestResponse {
    /// Proposals available right away.
    pub immediate: BTreeMap<FieldName, SuggestionResult>,
    /// Descriptor for a long-running job filling further fields.
    pub job: Option<JobDescriptor>,
}

/// Host-supplied source of field suggestions.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Proposes a value for one field, or `None` when it has nothing to
    /// offer.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestError`] when the provider fails; the engine degrades
    /// to "no suggestion".
    async fn suggest(
        &self,
        current: &Value,
        ctx: &CallContext,
    ) -> Result<Option<SuggestionResult>, SuggestError>;

    /// Proposes values for many fields at once, optionally via a background
    /// job.
    ///
    /// # Errors
    ///
    /// Returns [`SuggestError::Unsupported`] unless overridden.
    async fn bulk_suggest(
        &self,
        request: &BulkSuggestRequest,
    ) -> Result<BulkSuggestResponse, SuggestError> {
        let _ = request;
        Err(SuggestError::Unsupported)
    }
}

// ============================================================================
// SECTION: Remote Validator
// ============================================================================

/// Remote validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum RemoteCheckError {
    /// Validator reported an error.
    #[error("remote validation error: {0}")]
    Provider(String),
}

/// Host-supplied asynchronous validator.
#[async_trait]
pub trait RemoteValidator: Send + Sync {
    /// Runs the named check against a value.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCheckError`] when the check cannot run; the engine
    /// converts the failure into a blocking outcome.
    async fn check(
        &self,
        check_id: &CheckId,
        value: &Value,
        ctx: &CallContext,
    ) -> Result<RemoteOutcome, RemoteCheckError>;
}

// ============================================================================
// SECTION: Job Feed
// ============================================================================

/// Job feed errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum JobFeedError {
    /// Feed reported an error.
    #[error("job feed error: {0}")]
    Provider(String),
    /// The job identifier is unknown to the feed.
    #[error("unknown job: {0}")]
    UnknownJob(JobId),
}

/// Host-supplied source of background job status.
#[async_trait]
pub trait JobFeed: Send + Sync {
    /// Fetches the full job state, including only updates that are new since
    /// the previous fetch.
    ///
    /// # Errors
    ///
    /// Returns [`JobFeedError`] when the status cannot be fetched; polling
    /// continues.
    async fn status(&self, job_id: &JobId) -> Result<BackgroundJob, JobFeedError>;

    /// Requests cancellation of a job.
    ///
    /// # Errors
    ///
    /// Returns [`JobFeedError`] when the remote cancellation fails; local
    /// state is unblocked regardless.
    async fn cancel(&self, job_id: &JobId) -> Result<(), JobFeedError>;
}

// ============================================================================
// SECTION: Draft Sink
// ============================================================================

/// Draft persistence errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum DraftError {
    /// Sink reported an error.
    #[error("draft sink error: {0}")]
    Sink(String),
}

/// Host-supplied draft persistence.
#[async_trait]
pub trait DraftSink: Send + Sync {
    /// Persists the current values and the deltas since the last checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError`] when persistence fails; the dirty state is
    /// retained and the save retried on the next interval.
    async fn save(
        &self,
        values: &BTreeMap<FieldName, Value>,
        changes: &[FieldChange],
    ) -> Result<(), DraftError>;
}

// ============================================================================
// SECTION: Submission Sink
// ============================================================================

/// Submission errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Sink reported an error.
    #[error("submission error: {0}")]
    Sink(String),
}

/// Host-supplied submission target; the sole way validated values leave the
/// engine.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Receives the validated values snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] when the host rejects the payload; the engine
    /// reports the failure without mutating its own state.
    async fn submit(&self, values: &BTreeMap<FieldName, Value>) -> Result<(), SubmitError>;
}

// ============================================================================
// SECTION: Event Sink
// ============================================================================

/// Sink for structured engine diagnostics.
pub trait EventSink: Send + Sync {
    /// Records one engine event.
    fn record(&self, event: &EngineEvent);
}

/// Observer of store-level state transitions.
pub trait StateObserver: Send + Sync {
    /// Called when the dirty flag transitions.
    fn dirty_changed(&self, dirty: bool) {
        let _ = dirty;
    }

    /// Called after every effective value write.
    fn value_changed(&self, field: &FieldName, value: &Value) {
        let _ = (field, value);
    }
}

// ============================================================================
// SECTION: Null Implementations
// ============================================================================

/// Suggestion provider that never proposes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSuggestionProvider;

#[async_trait]
impl SuggestionProvider for NullSuggestionProvider {
    async fn suggest(
        &self,
        _current: &Value,
        _ctx: &CallContext,
    ) -> Result<Option<SuggestionResult>, SuggestError> {
        Ok(None)
    }
}

/// Remote validator that accepts every value.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRemoteValidator;

#[async_trait]
impl RemoteValidator for NullRemoteValidator {
    async fn check(
        &self,
        _check_id: &CheckId,
        _value: &Value,
        _ctx: &CallContext,
    ) -> Result<RemoteOutcome, RemoteCheckError> {
        Ok(RemoteOutcome::Valid)
    }
}

/// Job feed that knows no jobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullJobFeed;

#[async_trait]
impl JobFeed for NullJobFeed {
    async fn status(&self, job_id: &JobId) -> Result<BackgroundJob, JobFeedError> {
        Err(JobFeedError::UnknownJob(job_id.clone()))
    }

    async fn cancel(&self, _job_id: &JobId) -> Result<(), JobFeedError> {
        Ok(())
    }
}

/// Draft sink that discards every save.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDraftSink;

#[async_trait]
impl DraftSink for NullDraftSink {
    async fn save(
        &self,
        _values: &BTreeMap<FieldName, Value>,
        _changes: &[FieldChange],
    ) -> Result<(), DraftError> {
        Ok(())
    }
}

/// Submission sink that accepts every payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSubmissionSink;

#[async_trait]
impl SubmissionSink for NullSubmissionSink {
    async fn submit(&self, _values: &BTreeMap<FieldName, Value>) -> Result<(), SubmitError> {
        Ok(())
    }
}

/// Event sink that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn record(&self, _event: &EngineEvent) {}
}

/// Observer that ignores every transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl StateObserver for NullObserver {}

// ============================================================================
// SECTION: In-Memory Event Sink
// ============================================================================

/// Event sink retaining records in memory for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<EngineEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().map_or_else(|poisoned| poisoned.into_inner().clone(), |guard| {
            guard.clone()
        })
    }
}

impl EventSink for MemoryEventSink {
    fn record(&self, event: &EngineEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

// ============================================================================
// SECTION: Collaborator Set
// ============================================================================

/// The full set of injected collaborators for one session.
///
/// # Invariants
/// - Every slot is populated; use the null implementations for collaborators
///   the host does not provide.
#[derive(Clone)]
pub struct Collaborators {
    /// Suggestion provider.
    pub suggestions: Arc<dyn SuggestionProvider>,
    /// Remote validator.
    pub validator: Arc<dyn RemoteValidator>,
    /// Background job feed.
    pub jobs: Arc<dyn JobFeed>,
    /// Draft persistence sink.
    pub drafts: Arc<dyn DraftSink>,
    /// Submission sink.
    pub submission: Arc<dyn SubmissionSink>,
    /// Diagnostic event sink.
    pub events: Arc<dyn EventSink>,
    /// Store state observer.
    pub observer: Arc<dyn StateObserver>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            suggestions: Arc::new(NullSuggestionProvider),
            validator: Arc::new(NullRemoteValidator),
            jobs: Arc::new(NullJobFeed),
            drafts: Arc::new(NullDraftSink),
            submission: Arc::new(NullSubmissionSink),
            events: Arc::new(NullEventSink),
            observer: Arc::new(NullObserver),
        }
    }
}
