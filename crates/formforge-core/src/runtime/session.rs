// crates/formforge-core/src/runtime/session.rs
// ============================================================================
// Module: FormForge Session
// Description: Unified facade over store, validation, suggestions, jobs, and
//              navigation.
// Purpose: Give hosts one state object wiring every component together.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! A session owns one schema render: the state store plus the validation,
//! suggestion, job, and navigation components, all sharing the store as the
//! single source of truth. Hosts interact with the session; the parts remain
//! reachable for advanced embedding.
//!
//! Value writes fan out here: the store applies the write, then the
//! validation engine revalidates and cascades, then the suggestion engine
//! queues re-suggestion — matching the data flow of an interactive form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::core::EngineConfig;
use crate::core::EngineEvent;
use crate::core::FieldChange;
use crate::core::FieldName;
use crate::core::JobId;
use crate::core::PageId;
use crate::core::Schema;
use crate::core::Timestamp;
use crate::core::ValueSource;
use crate::interfaces::Collaborators;
use crate::runtime::jobs::JobTracker;
use crate::runtime::navigator::FormNavigator;
use crate::runtime::navigator::NavigationOutcome;
use crate::runtime::navigator::PageView;
use crate::runtime::navigator::SubmitOutcome;
use crate::runtime::registry::CustomCheckRegistry;
use crate::runtime::registry::FieldTypeRegistry;
use crate::runtime::store::FormStateStore;
use crate::runtime::suggest::SuggestionEngine;
use crate::runtime::validate::ValidationEngine;

// ============================================================================
// SECTION: Form Session
// ============================================================================

/// One schema render session: the unified state object hosts talk to.
pub struct FormSession {
    /// Shared state store.
    store: Arc<FormStateStore>,
    /// Validation engine.
    validation: Arc<ValidationEngine>,
    /// Suggestion engine.
    suggestions: Arc<SuggestionEngine>,
    /// Background job tracker.
    jobs: Arc<JobTracker>,
    /// Page navigator.
    navigator: FormNavigator,
    /// Injected collaborators.
    collaborators: Collaborators,
}

impl FormSession {
    /// Creates a session with the default type and check registries.
    #[must_use]
    pub fn new(
        schema: Schema,
        initial: BTreeMap<FieldName, Value>,
        config: EngineConfig,
        collaborators: Collaborators,
    ) -> Arc<Self> {
        Self::with_registries(
            schema,
            initial,
            config,
            collaborators,
            FieldTypeRegistry::default(),
            CustomCheckRegistry::default(),
        )
    }

    /// Creates a session with caller-supplied registries.
    #[must_use]
    pub fn with_registries(
        schema: Schema,
        initial: BTreeMap<FieldName, Value>,
        config: EngineConfig,
        collaborators: Collaborators,
        types: FieldTypeRegistry,
        checks: CustomCheckRegistry,
    ) -> Arc<Self> {
        let schema = Arc::new(schema);
        let types = Arc::new(types);
        let checks = Arc::new(checks);
        let store = Arc::new(FormStateStore::new(
            Arc::clone(&schema),
            initial,
            config,
            Arc::clone(&collaborators.observer),
        ));
        let validation = Arc::new(ValidationEngine::new(
            Arc::clone(&store),
            Arc::clone(&collaborators.validator),
            Arc::clone(&collaborators.events),
            Arc::clone(&types),
            checks,
        ));
        let suggestions = Arc::new(SuggestionEngine::new(
            Arc::clone(&store),
            Arc::clone(&collaborators.suggestions),
            Arc::clone(&collaborators.events),
        ));
        let jobs = Arc::new(JobTracker::new(
            Arc::clone(&store),
            Arc::clone(&collaborators.jobs),
            Arc::clone(&collaborators.events),
        ));
        let navigator = FormNavigator::new(
            Arc::clone(&store),
            Arc::clone(&validation),
            types,
            Arc::clone(&collaborators.submission),
            Arc::clone(&collaborators.events),
        );
        Arc::new(Self {
            store,
            validation,
            suggestions,
            jobs,
            navigator,
            collaborators,
        })
    }

    // ------------------------------------------------------------------
    // Component access
    // ------------------------------------------------------------------

    /// Returns the state store.
    #[must_use]
    pub fn store(&self) -> &Arc<FormStateStore> {
        &self.store
    }

    /// Returns the validation engine.
    #[must_use]
    pub fn validation(&self) -> &Arc<ValidationEngine> {
        &self.validation
    }

    /// Returns the suggestion engine.
    #[must_use]
    pub fn suggestions(&self) -> &Arc<SuggestionEngine> {
        &self.suggestions
    }

    /// Returns the job tracker.
    #[must_use]
    pub fn jobs(&self) -> &Arc<JobTracker> {
        &self.jobs
    }

    /// Returns the navigator.
    #[must_use]
    pub const fn navigator(&self) -> &FormNavigator {
        &self.navigator
    }

    // ------------------------------------------------------------------
    // Value writes
    // ------------------------------------------------------------------

    /// Applies a user edit and fans out the change to validation and
    /// suggestion handling.
    ///
    /// Returns true when the write was effective.
    pub fn set_value(&self, name: &FieldName, value: Value, now: Timestamp) -> bool {
        self.set_value_with_source(name, value, ValueSource::User, now)
    }

    /// Applies a value write with an explicit source tag.
    pub fn set_value_with_source(
        &self,
        name: &FieldName,
        value: Value,
        source: ValueSource,
        now: Timestamp,
    ) -> bool {
        let changed = self.store.set_value(name, value, source, now);
        if changed {
            self.validation.on_value_changed(name, now);
            self.suggestions.on_value_changed(name);
        }
        changed
    }

    // ------------------------------------------------------------------
    // Timed work
    // ------------------------------------------------------------------

    /// Runs every debounced remote validation and queued suggestion request
    /// whose time has come.
    pub async fn flush_due(&self, now: Timestamp) {
        self.validation.flush_due(now).await;
        self.suggestions.flush(now).await;
    }

    /// Clears lapsed suggestions.
    pub fn sweep(&self, now: Timestamp) -> Vec<FieldName> {
        self.suggestions.sweep(now)
    }

    /// Polls the active background job once. Returns true when polling
    /// should continue.
    pub async fn poll_job(&self, now: Timestamp) -> bool {
        self.jobs.poll_once(now).await
    }

    /// Saves a draft when the form is dirty and anything changed since the
    /// last checkpoint, then marks the checkpoint.
    pub async fn autosave(&self, now: Timestamp) {
        if !self.store.is_dirty() {
            return;
        }
        let changes = self.store.changes();
        if changes.is_empty() {
            return;
        }
        let values = self.store.values();
        match self.collaborators.drafts.save(&values, &changes).await {
            Ok(()) => self.store.mark_clean(now),
            Err(error) => {
                self.collaborators.events.record(&EngineEvent::DraftSaveFailed {
                    message: error.to_string(),
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Bulk suggestions and jobs
    // ------------------------------------------------------------------

    /// Requests bulk suggestions; immediate results apply at once and a
    /// returned job is tracked with its fields marked expecting.
    ///
    /// Returns the tracked job identifier, if a job was spawned.
    pub async fn request_bulk_suggestions(
        &self,
        attachments: Vec<Value>,
        now: Timestamp,
    ) -> Option<JobId> {
        let descriptor = self.suggestions.bulk(attachments, now).await?;
        let job_id = descriptor.job_id.clone();
        self.jobs.start(descriptor, now);
        Some(job_id)
    }

    /// Cancels a background job; a thin pass-through kept on the unified
    /// state object because hosts interact with one session.
    pub async fn cancel_job(&self, job_id: &JobId) {
        self.jobs.cancel(job_id).await;
    }

    /// Resumes a job known from a previous session, when still active.
    pub async fn resume_job(&self, job_id: JobId, now: Timestamp) -> bool {
        self.jobs.resume(job_id, now).await
    }

    // ------------------------------------------------------------------
    // Navigation and submission
    // ------------------------------------------------------------------

    /// Attempts to advance past the current page.
    pub async fn next(&self, now: Timestamp) -> NavigationOutcome {
        self.navigator.next(now).await
    }

    /// Moves back to the previous visible page.
    pub fn previous(&self) -> usize {
        self.navigator.previous()
    }

    /// Validates everything and submits through the submission sink.
    pub async fn submit(&self, now: Timestamp) -> SubmitOutcome {
        self.navigator.submit(now).await
    }

    /// Assembles the presentation-agnostic view of the current page.
    #[must_use]
    pub fn page_view(&self) -> Option<PageView> {
        self.navigator.page_view()
    }

    // ------------------------------------------------------------------
    // Store conveniences
    // ------------------------------------------------------------------

    /// Returns the current value for a field.
    #[must_use]
    pub fn value(&self, name: &FieldName) -> Option<Value> {
        self.store.value(name)
    }

    /// Returns true when any field differs from its mount value.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    /// Returns true when no stored outcome is a blocking failure.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.store.is_valid()
    }

    /// Accepts the field's suggestion.
    pub fn accept_suggestion(&self, name: &FieldName, now: Timestamp) -> bool {
        self.store.accept_suggestion(name, now)
    }

    /// Dismisses the field's suggestion.
    pub fn dismiss_suggestion(&self, name: &FieldName, now: Timestamp) -> bool {
        self.store.dismiss_suggestion(name, now)
    }

    /// Flips the field's dual-value selector.
    pub fn toggle_value(&self, name: &FieldName, now: Timestamp) -> bool {
        self.store.toggle_value(name, now)
    }

    /// Accepts every reviewable suggestion in the form.
    pub fn accept_all_suggestions(&self, now: Timestamp) -> usize {
        self.store.accept_all_suggestions(now)
    }

    /// Accepts every reviewable suggestion on one page.
    pub fn accept_all_on_page(&self, page_id: &PageId, now: Timestamp) -> usize {
        self.store.accept_all_on_page(page_id, now)
    }

    /// Dismisses every reviewable suggestion on one page.
    pub fn dismiss_all_on_page(&self, page_id: &PageId, now: Timestamp) -> usize {
        self.store.dismiss_all_on_page(page_id, now)
    }

    /// Moves the history cursor back one entry.
    pub fn undo(&self) -> bool {
        self.store.undo()
    }

    /// Moves the history cursor forward one entry.
    pub fn redo(&self) -> bool {
        self.store.redo()
    }

    /// Restores mount state.
    pub fn reset(&self) {
        self.store.reset();
    }

    /// Returns the deltas since the last save checkpoint.
    #[must_use]
    pub fn changes(&self) -> Vec<FieldChange> {
        self.store.changes()
    }
}
