// crates/formforge-core/src/runtime/jobs.rs
// ============================================================================
// Module: FormForge Job Tracker
// Description: Background suggestion job polling, cancellation, resumption.
// Purpose: Map job progress onto field-level expecting/available states.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The tracker owns at most one active background job per session. Starting
//! a job immediately marks every affected field as expecting a value so the
//! UI can show an anticipatory loading state. Each poll applies the feed's
//! new updates idempotently, keyed by field and timestamp, and a terminal
//! status resolves any straggling fields before the job is cleared.
//!
//! Cancellation stops polling and unblocks local state first; the remote
//! cancel call runs afterwards, and its failure is recorded without ever
//! leaving the form stuck on an abandoned job.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::core::ActiveValue;
use crate::core::BackgroundJob;
use crate::core::EngineConfig;
use crate::core::EngineEvent;
use crate::core::FieldName;
use crate::core::JobDescriptor;
use crate::core::JobId;
use crate::core::JobStatus;
use crate::core::JobUpdate;
use crate::core::SuggestionState;
use crate::core::SuggestionStatus;
use crate::core::Timestamp;
use crate::interfaces::EventSink;
use crate::interfaces::JobFeed;
use crate::runtime::store::FormStateStore;

// ============================================================================
// SECTION: Internal State
// ============================================================================

/// Bookkeeping for the active job.
struct ActiveJob {
    /// Job identifier.
    job_id: JobId,
    /// Fields the job may fill.
    affected: Vec<FieldName>,
    /// Applied update keys: (field, update timestamp in unix millis).
    seen: BTreeSet<(FieldName, i64)>,
    /// Whether polls should still be applied.
    polling: bool,
}

// ============================================================================
// SECTION: Job Tracker
// ============================================================================

/// Tracker for the session's background suggestion job.
pub struct JobTracker {
    /// Shared state store.
    store: Arc<FormStateStore>,
    /// Injected job feed.
    feed: Arc<dyn JobFeed>,
    /// Injected diagnostic sink.
    events: Arc<dyn EventSink>,
    /// Engine configuration.
    config: EngineConfig,
    /// Active job bookkeeping.
    inner: Mutex<Option<ActiveJob>>,
}

impl JobTracker {
    /// Creates a job tracker over the store.
    #[must_use]
    pub fn new(
        store: Arc<FormStateStore>,
        feed: Arc<dyn JobFeed>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let config = *store.config();
        Self {
            store,
            feed,
            events,
            config,
            inner: Mutex::new(None),
        }
    }

    /// Locks the bookkeeping, recovering from a poisoned lock.
    fn lock_inner(&self) -> MutexGuard<'_, Option<ActiveJob>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the active job identifier, if any.
    #[must_use]
    pub fn active(&self) -> Option<JobId> {
        self.lock_inner().as_ref().map(|job| job.job_id.clone())
    }

    /// Returns true while polls should keep firing.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.lock_inner().as_ref().is_some_and(|job| job.polling)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Starts tracking a job, marking every affected field as expecting.
    ///
    /// Any previously active job is locally reverted first, exactly as for a
    /// cancellation.
    pub fn start(&self, descriptor: JobDescriptor, now: Timestamp) {
        if let Some(previous) = self.lock_inner().take() {
            self.revert_pending_fields(&previous.affected);
            self.store.clear_job();
        }

        for name in &descriptor.affected_fields {
            self.mark_expecting(name, now);
        }
        self.store.set_job(BackgroundJob {
            job_id: descriptor.job_id.clone(),
            status: JobStatus::Queued,
            progress: 0.0,
            partial_results: BTreeMap::new(),
            completed_fields: Vec::new(),
            pending_fields: descriptor.affected_fields.clone(),
            new_updates: Vec::new(),
            field_errors: BTreeMap::new(),
            error: None,
            started_at: Some(now),
            updated_at: Some(now),
        });
        *self.lock_inner() = Some(ActiveJob {
            job_id: descriptor.job_id,
            affected: descriptor.affected_fields,
            seen: BTreeSet::new(),
            polling: true,
        });
    }

    /// Fetches current status for a job known from a previous session and
    /// resumes tracking when it is still active.
    ///
    /// Returns true when polling resumed.
    pub async fn resume(&self, job_id: JobId, now: Timestamp) -> bool {
        let job = match self.feed.status(&job_id).await {
            Ok(job) => job,
            Err(error) => {
                self.events.record(&EngineEvent::JobPollFailed {
                    job_id,
                    message: error.to_string(),
                });
                return false;
            }
        };

        let mut affected: Vec<FieldName> = job.completed_fields.clone();
        for name in &job.pending_fields {
            if !affected.contains(name) {
                affected.push(name.clone());
            }
        }

        if job.status.is_terminal() {
            // The job finished while the form was away; apply what it
            // produced and leave nothing active.
            for (name, value) in &job.partial_results {
                self.apply_update(
                    &JobUpdate {
                        field: name.clone(),
                        value: value.clone(),
                        confidence: 1.0,
                        at: now,
                    },
                    now,
                );
            }
            return false;
        }

        for name in &job.pending_fields {
            self.mark_expecting(name, now);
        }
        let mut seen = BTreeSet::new();
        for update in &job.new_updates {
            seen.insert((update.field.clone(), update.at.as_unix_millis()));
            self.apply_update(update, now);
        }
        for (name, value) in &job.partial_results {
            self.apply_update(
                &JobUpdate {
                    field: name.clone(),
                    value: value.clone(),
                    confidence: 1.0,
                    at: now,
                },
                now,
            );
        }
        self.store.set_job(job.clone());
        *self.lock_inner() = Some(ActiveJob {
            job_id,
            affected,
            seen,
            polling: true,
        });
        true
    }

    /// Polls the feed once and applies the result.
    ///
    /// Returns true when polling should continue.
    pub async fn poll_once(&self, now: Timestamp) -> bool {
        let Some(job_id) = ({
            let inner = self.lock_inner();
            inner.as_ref().filter(|job| job.polling).map(|job| job.job_id.clone())
        }) else {
            return false;
        };

        let job = match self.feed.status(&job_id).await {
            Ok(job) => job,
            Err(error) => {
                self.events.record(&EngineEvent::JobPollFailed {
                    job_id,
                    message: error.to_string(),
                });
                return true;
            }
        };

        // A cancellation racing the fetch wins: its state changes are final.
        let fresh_updates: Vec<JobUpdate> = {
            let mut inner = self.lock_inner();
            let Some(active) = inner.as_mut() else {
                return false;
            };
            if !active.polling || active.job_id != job_id {
                return false;
            }
            job.new_updates
                .iter()
                .filter(|update| {
                    active.seen.insert((update.field.clone(), update.at.as_unix_millis()))
                })
                .cloned()
                .collect()
        };

        for update in &fresh_updates {
            self.apply_update(update, now);
        }
        self.store.set_job(job.clone());

        if job.status.is_terminal() {
            self.finalize(&job, now);
            false
        } else {
            true
        }
    }

    /// Cancels the active job: stops polling, reverts pending fields, clears
    /// display state, then attempts the remote cancellation.
    pub async fn cancel(&self, job_id: &JobId) {
        let taken = {
            let mut inner = self.lock_inner();
            match inner.as_ref() {
                Some(active) if active.job_id == *job_id => inner.take(),
                _ => None,
            }
        };
        let Some(active) = taken else {
            return;
        };

        self.revert_pending_fields(&active.affected);
        self.store.clear_job();

        if let Err(error) = self.feed.cancel(&active.job_id).await {
            self.events.record(&EngineEvent::JobCancelFailed {
                job_id: active.job_id,
                message: error.to_string(),
            });
        }
    }

    // ------------------------------------------------------------------
    // Field state mechanics
    // ------------------------------------------------------------------

    /// Marks a field as expecting a job-delivered value.
    fn mark_expecting(&self, name: &FieldName, now: Timestamp) {
        let user_value = self.store.value(name);
        self.store.set_suggestion(name, SuggestionState {
            status: SuggestionStatus::Expecting,
            user_value,
            updated_at: Some(now),
            ..SuggestionState::default()
        });
    }

    /// Applies one job update through the confidence gate.
    fn apply_update(&self, update: &JobUpdate, now: Timestamp) {
        let threshold = self
            .store
            .schema()
            .field(&update.field)
            .and_then(|field| field.suggest.as_ref())
            .and_then(|spec| spec.min_confidence)
            .unwrap_or(self.config.min_confidence);
        if update.confidence < threshold {
            self.events.record(&EngineEvent::SuggestionBelowThreshold {
                field: update.field.clone(),
                confidence: update.confidence,
                threshold,
            });
            return;
        }
        let user_value = self
            .store
            .suggestion(&update.field)
            .and_then(|state| state.user_value)
            .or_else(|| self.store.value(&update.field));
        self.store.set_suggestion(&update.field, SuggestionState {
            status: SuggestionStatus::Available,
            user_value,
            suggested_value: Some(update.value.clone()),
            original_suggested_value: Some(update.value.clone()),
            active: ActiveValue::User,
            suggested_value_modified: false,
            confidence: Some(update.confidence),
            reason: None,
            updated_at: Some(now),
            expires_at: None,
            source: None,
            error: None,
        });
    }

    /// Resolves straggling fields once the job reached a terminal status and
    /// clears the job.
    fn finalize(&self, job: &BackgroundJob, now: Timestamp) {
        let affected = {
            let mut inner = self.lock_inner();
            inner.take().map(|active| active.affected).unwrap_or_default()
        };

        for name in &affected {
            let pending = self
                .store
                .suggestion(name)
                .is_some_and(|state| state.status.is_pending());
            if !pending {
                continue;
            }
            match job.status {
                JobStatus::Cancelled => {
                    self.store.clear_suggestion(name);
                }
                JobStatus::Failed => {
                    let message =
                        job.error.clone().unwrap_or_else(|| "job failed".to_string());
                    self.store.set_suggestion(name, SuggestionState {
                        status: SuggestionStatus::None,
                        error: Some(message),
                        updated_at: Some(now),
                        ..SuggestionState::default()
                    });
                }
                _ => {
                    if let Some(value) = job.partial_results.get(name) {
                        self.apply_update(
                            &JobUpdate {
                                field: name.clone(),
                                value: value.clone(),
                                confidence: 1.0,
                                at: now,
                            },
                            now,
                        );
                    } else {
                        let message = job
                            .field_errors
                            .get(name)
                            .cloned()
                            .unwrap_or_else(|| "no result delivered".to_string());
                        self.store.set_suggestion(name, SuggestionState {
                            status: SuggestionStatus::None,
                            error: Some(message),
                            updated_at: Some(now),
                            ..SuggestionState::default()
                        });
                    }
                }
            }
        }

        if job.status == JobStatus::Failed {
            self.events.record(&EngineEvent::JobFailed {
                job_id: job.job_id.clone(),
                message: job.error.clone().unwrap_or_else(|| "job failed".to_string()),
            });
        }
        self.store.clear_job();
    }

    /// Reverts every still-pending field of an abandoned job to no
    /// suggestion, without error.
    fn revert_pending_fields(&self, affected: &[FieldName]) {
        for name in affected {
            let pending = self
                .store
                .suggestion(name)
                .is_some_and(|state| state.status.is_pending());
            if pending {
                self.store.clear_suggestion(name);
            }
        }
    }
}
