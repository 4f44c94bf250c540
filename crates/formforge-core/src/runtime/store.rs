// crates/formforge-core/src/runtime/store.rs
// ============================================================================
// Module: FormForge State Store
// Description: Single-owner mutable state for values, suggestions, history.
// Purpose: Route every mutation through one API with history and notifications.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! The form state store is the single source of truth for field values,
//! dirty tracking, validation outcomes, suggestion states, history, session
//! metadata, and the background job shown to hosts. Every other runtime
//! component requests mutations through this API; none holds a private copy
//! of authoritative state.
//!
//! All operations are synchronous and side-effect-only. There are no error
//! returns: unknown field names are tolerated as no-ops so a live-edited
//! schema and a momentarily stale host UI cannot crash the session.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use serde_json::Value;

use crate::core::ActiveValue;
use crate::core::BackgroundJob;
use crate::core::EngineConfig;
use crate::core::FieldChange;
use crate::core::FieldName;
use crate::core::FormMetadata;
use crate::core::HistoryEntry;
use crate::core::HistoryKind;
use crate::core::PageId;
use crate::core::Schema;
use crate::core::SuggestionState;
use crate::core::SuggestionStatus;
use crate::core::Timestamp;
use crate::core::ValidationOutcome;
use crate::core::ValueSource;
use crate::interfaces::StateObserver;

// ============================================================================
// SECTION: Internal State
// ============================================================================

/// Pending observer notification collected while the lock is held.
enum Notice {
    /// The dirty set changed; payload is the current form-level flag.
    Dirty(bool),
    /// A field value changed.
    Value(FieldName, Value),
}

/// Authoritative mutable session state.
struct StoreState {
    /// Current active values.
    values: BTreeMap<FieldName, Value>,
    /// Values at mount; the dirty baseline.
    initial_values: BTreeMap<FieldName, Value>,
    /// Values at the last save checkpoint.
    checkpoint_values: BTreeMap<FieldName, Value>,
    /// Stored validation outcomes.
    validations: BTreeMap<FieldName, ValidationOutcome>,
    /// Stored suggestion states.
    suggestions: BTreeMap<FieldName, SuggestionState>,
    /// Bounded history log.
    history: Vec<HistoryEntry>,
    /// History cursor; entries before it are applied.
    cursor: usize,
    /// Session metadata.
    metadata: FormMetadata,
    /// Background job shown to hosts, when one is active.
    job: Option<BackgroundJob>,
}

impl StoreState {
    /// Returns true when the field's value differs from its mount value.
    fn is_field_dirty(&self, name: &FieldName) -> bool {
        self.values.get(name) != self.initial_values.get(name)
    }

    /// Returns true when any field is dirty.
    fn is_dirty(&self) -> bool {
        let names: BTreeSet<&FieldName> =
            self.values.keys().chain(self.initial_values.keys()).collect();
        names.into_iter().any(|name| self.is_field_dirty(name))
    }

    /// Applies one value write, updating metadata, suggestion bookkeeping,
    /// and notifications. Returns false for a same-value no-op.
    fn write_value(
        &mut self,
        name: &FieldName,
        value: Value,
        source: ValueSource,
        notices: &mut Vec<Notice>,
    ) -> bool {
        if self.values.get(name) == Some(&value) {
            return false;
        }
        let field_was_dirty = self.is_field_dirty(name);
        self.values.insert(name.clone(), value.clone());

        match source {
            ValueSource::User => {
                self.metadata.user_edited_fields.insert(name.clone());
                if let Some(suggestion) = self.suggestions.get_mut(name) {
                    if suggestion.active == ActiveValue::Suggested {
                        // Hand edit of the live proposal: the original stays
                        // untouched as the revert target.
                        suggestion.suggested_value = Some(value.clone());
                        suggestion.suggested_value_modified = true;
                    } else {
                        suggestion.user_value = Some(value.clone());
                    }
                }
            }
            ValueSource::Suggested => {
                self.metadata.ai_assisted_fields.insert(name.clone());
            }
            ValueSource::System => {}
        }

        notices.push(Notice::Value(name.clone(), value));
        if self.is_field_dirty(name) != field_was_dirty {
            notices.push(Notice::Dirty(self.is_dirty()));
        }
        true
    }

    /// Appends a history entry at the cursor, truncating any redo tail and
    /// pruning the log to the configured bound.
    fn push_history(
        &mut self,
        kind: HistoryKind,
        fields: Vec<FieldName>,
        description: String,
        at: Timestamp,
        limit: usize,
    ) {
        self.history.truncate(self.cursor);
        self.history.push(HistoryEntry {
            at,
            kind,
            fields,
            description,
            snapshot: self.values.clone(),
        });
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(.. excess);
        }
        self.cursor = self.history.len();
    }

    /// Replaces the values map with a snapshot, emitting notifications for
    /// every field that changed.
    fn restore_snapshot(&mut self, snapshot: BTreeMap<FieldName, Value>, notices: &mut Vec<Notice>) {
        let was_dirty = self.is_dirty();
        let names: BTreeSet<FieldName> =
            self.values.keys().chain(snapshot.keys()).cloned().collect();
        for name in names {
            if self.values.get(&name) != snapshot.get(&name) {
                let value = snapshot.get(&name).cloned().unwrap_or(Value::Null);
                notices.push(Notice::Value(name, value));
            }
        }
        self.values = snapshot;
        if self.is_dirty() != was_dirty {
            notices.push(Notice::Dirty(self.is_dirty()));
        }
    }

    /// Applies acceptance mechanics to one suggestion. Returns false when the
    /// field has nothing to accept.
    fn accept_mechanics(
        &mut self,
        name: &FieldName,
        expires_at: Timestamp,
        now: Timestamp,
        notices: &mut Vec<Notice>,
    ) -> bool {
        let Some(suggestion) = self.suggestions.get_mut(name) else {
            return false;
        };
        let Some(value) = suggestion.suggested_value.clone() else {
            return false;
        };
        if suggestion.user_value.is_none() {
            suggestion.user_value = self.values.get(name).cloned();
        }
        suggestion.active = ActiveValue::Suggested;
        suggestion.status = SuggestionStatus::Accepted;
        suggestion.expires_at = Some(expires_at);
        suggestion.updated_at = Some(now);
        self.write_value(name, value, ValueSource::Suggested, notices);
        true
    }

    /// Applies dismissal mechanics to one suggestion. Returns false when the
    /// field has no suggestion.
    fn dismiss_mechanics(
        &mut self,
        name: &FieldName,
        now: Timestamp,
        notices: &mut Vec<Notice>,
    ) -> bool {
        let Some(suggestion) = self.suggestions.get_mut(name) else {
            return false;
        };
        let restore =
            (suggestion.active == ActiveValue::Suggested).then(|| suggestion.user_value.clone());
        suggestion.status = SuggestionStatus::Dismissed;
        suggestion.active = ActiveValue::User;
        suggestion.updated_at = Some(now);
        if let Some(Some(user_value)) = restore {
            self.write_value(name, user_value, ValueSource::User, notices);
        }
        true
    }
}

// ============================================================================
// SECTION: Form State Store
// ============================================================================

/// Single-owner store for all mutable session state.
///
/// # Invariants
/// - The dirty set is derived from `value != initial_value` on every read,
///   never trusted from a prior snapshot.
/// - Same-value writes are complete no-ops: no history entry, no
///   notification.
/// - Unknown field names are ignored rather than rejected.
pub struct FormStateStore {
    /// Immutable session schema.
    schema: Arc<Schema>,
    /// Engine configuration.
    config: EngineConfig,
    /// Injected state observer.
    observer: Arc<dyn StateObserver>,
    /// Authoritative state behind a lock for interior mutability.
    state: Mutex<StoreState>,
}

impl FormStateStore {
    /// Creates a store from a schema and caller-supplied initial values.
    ///
    /// Mount values are schema defaults overlaid with the caller's initial
    /// values; keys not naming a schema field are dropped.
    #[must_use]
    pub fn new(
        schema: Arc<Schema>,
        initial: BTreeMap<FieldName, Value>,
        config: EngineConfig,
        observer: Arc<dyn StateObserver>,
    ) -> Self {
        let mut values = BTreeMap::new();
        for field in schema.fields() {
            if let Some(value) = initial.get(&field.name) {
                values.insert(field.name.clone(), value.clone());
            } else if let Some(default) = &field.default_value {
                values.insert(field.name.clone(), default.clone());
            }
        }
        let state = StoreState {
            initial_values: values.clone(),
            checkpoint_values: values.clone(),
            values,
            validations: BTreeMap::new(),
            suggestions: BTreeMap::new(),
            history: Vec::new(),
            cursor: 0,
            metadata: FormMetadata::default(),
            job: None,
        };
        Self {
            schema,
            config,
            observer,
            state: Mutex::new(state),
        }
    }

    /// Returns the session schema.
    #[must_use]
    pub fn schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Locks the state, recovering from a poisoned lock.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers collected notifications outside the lock.
    fn notify(&self, notices: Vec<Notice>) {
        for notice in notices {
            match notice {
                Notice::Dirty(dirty) => self.observer.dirty_changed(dirty),
                Notice::Value(field, value) => self.observer.value_changed(&field, &value),
            }
        }
    }

    // ------------------------------------------------------------------
    // Values and dirty tracking
    // ------------------------------------------------------------------

    /// Returns the current value for a field.
    #[must_use]
    pub fn value(&self, name: &FieldName) -> Option<Value> {
        self.lock().values.get(name).cloned()
    }

    /// Returns the mount value for a field.
    #[must_use]
    pub fn initial_value(&self, name: &FieldName) -> Option<Value> {
        self.lock().initial_values.get(name).cloned()
    }

    /// Returns a snapshot of all current values.
    #[must_use]
    pub fn values(&self) -> BTreeMap<FieldName, Value> {
        self.lock().values.clone()
    }

    /// Writes a value with the given source tag.
    ///
    /// Returns true when the write was effective. Unknown field names and
    /// same-value writes are no-ops.
    pub fn set_value(
        &self,
        name: &FieldName,
        value: Value,
        source: ValueSource,
        now: Timestamp,
    ) -> bool {
        let Some(field) = self.schema.field(name) else {
            return false;
        };
        let label = field.label.clone();
        let mut notices = Vec::new();
        let changed = {
            let mut state = self.lock();
            let changed = state.write_value(name, value, source, &mut notices);
            if changed {
                state.push_history(
                    HistoryKind::FieldEdit,
                    vec![name.clone()],
                    format!("Edited {label}"),
                    now,
                    self.config.history_limit,
                );
            }
            changed
        };
        self.notify(notices);
        changed
    }

    /// Returns the set of fields whose value differs from mount.
    #[must_use]
    pub fn dirty_fields(&self) -> BTreeSet<FieldName> {
        let state = self.lock();
        let names: BTreeSet<FieldName> =
            state.values.keys().chain(state.initial_values.keys()).cloned().collect();
        names.into_iter().filter(|name| state.is_field_dirty(name)).collect()
    }

    /// Returns true when any field is dirty.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.lock().is_dirty()
    }

    // ------------------------------------------------------------------
    // Validation outcomes
    // ------------------------------------------------------------------

    /// Returns the stored validation outcome for a field.
    #[must_use]
    pub fn outcome(&self, name: &FieldName) -> Option<ValidationOutcome> {
        self.lock().validations.get(name).cloned()
    }

    /// Returns a snapshot of all stored validation outcomes.
    #[must_use]
    pub fn outcomes(&self) -> BTreeMap<FieldName, ValidationOutcome> {
        self.lock().validations.clone()
    }

    /// Stores a validation outcome for a field.
    pub fn set_outcome(&self, name: &FieldName, outcome: ValidationOutcome) {
        if self.schema.field(name).is_none() {
            return;
        }
        self.lock().validations.insert(name.clone(), outcome);
    }

    /// Removes the stored validation outcome for a field.
    pub fn clear_outcome(&self, name: &FieldName) {
        self.lock().validations.remove(name);
    }

    /// Returns true when no stored outcome is a blocking failure.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lock().validations.values().all(|outcome| !outcome.is_blocking_failure())
    }

    /// Returns every stored blocking failure.
    #[must_use]
    pub fn blocking_errors(&self) -> BTreeMap<FieldName, ValidationOutcome> {
        self.lock()
            .validations
            .iter()
            .filter(|(_, outcome)| outcome.is_blocking_failure())
            .map(|(name, outcome)| (name.clone(), outcome.clone()))
            .collect()
    }

    // ------------------------------------------------------------------
    // Suggestion state
    // ------------------------------------------------------------------

    /// Returns the suggestion state for a field.
    #[must_use]
    pub fn suggestion(&self, name: &FieldName) -> Option<SuggestionState> {
        self.lock().suggestions.get(name).cloned()
    }

    /// Returns a snapshot of all suggestion states.
    #[must_use]
    pub fn suggestions(&self) -> BTreeMap<FieldName, SuggestionState> {
        self.lock().suggestions.clone()
    }

    /// Stores a suggestion state for a field.
    pub fn set_suggestion(&self, name: &FieldName, suggestion: SuggestionState) {
        if self.schema.field(name).is_none() {
            return;
        }
        self.lock().suggestions.insert(name.clone(), suggestion);
    }

    /// Removes the suggestion state for a field.
    pub fn clear_suggestion(&self, name: &FieldName) {
        self.lock().suggestions.remove(name);
    }

    /// Accepts the field's suggestion: the proposal becomes the live value
    /// through a suggested-sourced write and the status is stamped accepted.
    ///
    /// Returns false when the field has no proposal to accept.
    pub fn accept_suggestion(&self, name: &FieldName, now: Timestamp) -> bool {
        let Some(field) = self.schema.field(name) else {
            return false;
        };
        let label = field.label.clone();
        let expires_at = now.plus_millis(self.suggestion_ttl_ms(name));
        let mut notices = Vec::new();
        let accepted = {
            let mut state = self.lock();
            let accepted = state.accept_mechanics(name, expires_at, now, &mut notices);
            if accepted {
                state.push_history(
                    HistoryKind::AcceptSuggestion,
                    vec![name.clone()],
                    format!("Accepted suggestion for {label}"),
                    now,
                    self.config.history_limit,
                );
            }
            accepted
        };
        self.notify(notices);
        accepted
    }

    /// Dismisses the field's suggestion, leaving the user value live.
    ///
    /// Returns false when the field has no suggestion.
    pub fn dismiss_suggestion(&self, name: &FieldName, now: Timestamp) -> bool {
        let Some(field) = self.schema.field(name) else {
            return false;
        };
        let label = field.label.clone();
        let mut notices = Vec::new();
        let dismissed = {
            let mut state = self.lock();
            let dismissed = state.dismiss_mechanics(name, now, &mut notices);
            if dismissed {
                state.push_history(
                    HistoryKind::DismissSuggestion,
                    vec![name.clone()],
                    format!("Dismissed suggestion for {label}"),
                    now,
                    self.config.history_limit,
                );
            }
            dismissed
        };
        self.notify(notices);
        dismissed
    }

    /// Flips the dual-value selector and re-applies the newly live side
    /// through a value write with the matching source tag.
    ///
    /// Returns false when the target side holds no value.
    pub fn toggle_value(&self, name: &FieldName, now: Timestamp) -> bool {
        let Some(field) = self.schema.field(name) else {
            return false;
        };
        let label = field.label.clone();
        let mut notices = Vec::new();
        let toggled = {
            let mut state = self.lock();
            let Some(suggestion) = state.suggestions.get_mut(name) else {
                return false;
            };
            let target = suggestion.active.flipped();
            let (value, source) = match target {
                ActiveValue::User => (suggestion.user_value.clone(), ValueSource::User),
                ActiveValue::Suggested => {
                    (suggestion.suggested_value.clone(), ValueSource::Suggested)
                }
            };
            let Some(value) = value else {
                return false;
            };
            suggestion.active = target;
            suggestion.updated_at = Some(now);
            state.write_value(name, value, source, &mut notices);
            state.push_history(
                HistoryKind::ToggleValue,
                vec![name.clone()],
                format!("Toggled value for {label}"),
                now,
                self.config.history_limit,
            );
            true
        };
        self.notify(notices);
        toggled
    }

    /// Marks an available suggestion as being reviewed.
    pub fn mark_reviewed(&self, name: &FieldName) -> bool {
        let mut state = self.lock();
        match state.suggestions.get_mut(name) {
            Some(suggestion) if suggestion.status == SuggestionStatus::Available => {
                suggestion.status = SuggestionStatus::Reviewing;
                true
            }
            _ => false,
        }
    }

    /// Restores the proposal as originally delivered, discarding hand edits.
    ///
    /// Returns false when the field has no original proposal.
    pub fn reset_to_original_suggestion(&self, name: &FieldName, now: Timestamp) -> bool {
        let Some(field) = self.schema.field(name) else {
            return false;
        };
        let label = field.label.clone();
        let mut notices = Vec::new();
        let restored = {
            let mut state = self.lock();
            let Some(suggestion) = state.suggestions.get_mut(name) else {
                return false;
            };
            let Some(original) = suggestion.original_suggested_value.clone() else {
                return false;
            };
            suggestion.suggested_value = Some(original.clone());
            suggestion.suggested_value_modified = false;
            suggestion.updated_at = Some(now);
            let live = suggestion.active == ActiveValue::Suggested;
            if live {
                state.write_value(name, original, ValueSource::Suggested, &mut notices);
            }
            state.push_history(
                HistoryKind::FieldEdit,
                vec![name.clone()],
                format!("Restored original suggestion for {label}"),
                now,
                self.config.history_limit,
            );
            true
        };
        self.notify(notices);
        restored
    }

    /// Accepts every reviewable suggestion in the form. Returns the count.
    pub fn accept_all_suggestions(&self, now: Timestamp) -> usize {
        let names: Vec<FieldName> = self.schema.fields().map(|field| field.name.clone()).collect();
        self.accept_bulk(&names, now)
    }

    /// Accepts every reviewable suggestion on one page. Returns the count.
    pub fn accept_all_on_page(&self, page_id: &PageId, now: Timestamp) -> usize {
        let names = self.page_field_names(page_id);
        self.accept_bulk(&names, now)
    }

    /// Dismisses every reviewable suggestion on one page. Returns the count.
    pub fn dismiss_all_on_page(&self, page_id: &PageId, now: Timestamp) -> usize {
        let names = self.page_field_names(page_id);
        let mut notices = Vec::new();
        let affected = {
            let mut state = self.lock();
            let mut affected = Vec::new();
            for name in &names {
                let reviewable = state.suggestions.get(name).is_some_and(|suggestion| {
                    matches!(
                        suggestion.status,
                        SuggestionStatus::Available | SuggestionStatus::Reviewing
                    )
                });
                if reviewable && state.dismiss_mechanics(name, now, &mut notices) {
                    affected.push(name.clone());
                }
            }
            if !affected.is_empty() {
                state.push_history(
                    HistoryKind::DismissSuggestion,
                    affected.clone(),
                    format!("Dismissed {} suggestions", affected.len()),
                    now,
                    self.config.history_limit,
                );
            }
            affected
        };
        self.notify(notices);
        affected.len()
    }

    /// Shared bulk-accept mechanics over a candidate name list.
    fn accept_bulk(&self, names: &[FieldName], now: Timestamp) -> usize {
        let mut notices = Vec::new();
        let affected = {
            let mut state = self.lock();
            let mut affected = Vec::new();
            for name in names {
                let reviewable = state.suggestions.get(name).is_some_and(|suggestion| {
                    matches!(
                        suggestion.status,
                        SuggestionStatus::Available | SuggestionStatus::Reviewing
                    )
                });
                if !reviewable {
                    continue;
                }
                let expires_at = now.plus_millis(self.suggestion_ttl_ms(name));
                if state.accept_mechanics(name, expires_at, now, &mut notices) {
                    affected.push(name.clone());
                }
            }
            if !affected.is_empty() {
                state.push_history(
                    HistoryKind::BulkAccept,
                    affected.clone(),
                    format!("Accepted {} suggestions", affected.len()),
                    now,
                    self.config.history_limit,
                );
            }
            affected
        };
        self.notify(notices);
        affected.len()
    }

    /// Resolves the accepted-suggestion lifetime for a field in milliseconds.
    fn suggestion_ttl_ms(&self, name: &FieldName) -> i64 {
        self.schema
            .field(name)
            .and_then(|field| field.suggest.as_ref())
            .and_then(|spec| spec.ttl_secs)
            .map_or(self.config.suggestion_ttl_ms, |secs| secs.saturating_mul(1_000))
    }

    /// Returns the field names on one page.
    fn page_field_names(&self, page_id: &PageId) -> Vec<FieldName> {
        self.schema
            .pages
            .iter()
            .filter(|page| page.page_id == *page_id)
            .flat_map(|page| page.fields.iter().map(|field| field.name.clone()))
            .collect()
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Moves the cursor back one entry and restores the preceding snapshot.
    pub fn undo(&self) -> bool {
        let mut notices = Vec::new();
        let undone = {
            let mut state = self.lock();
            if state.cursor == 0 {
                false
            } else {
                state.cursor -= 1;
                let snapshot = if state.cursor == 0 {
                    state.initial_values.clone()
                } else {
                    state.history[state.cursor - 1].snapshot.clone()
                };
                state.restore_snapshot(snapshot, &mut notices);
                true
            }
        };
        self.notify(notices);
        undone
    }

    /// Moves the cursor forward one entry and re-applies its snapshot.
    pub fn redo(&self) -> bool {
        let mut notices = Vec::new();
        let redone = {
            let mut state = self.lock();
            if state.cursor >= state.history.len() {
                false
            } else {
                let snapshot = state.history[state.cursor].snapshot.clone();
                state.cursor += 1;
                state.restore_snapshot(snapshot, &mut notices);
                true
            }
        };
        self.notify(notices);
        redone
    }

    /// Returns a snapshot of the history log.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock().history.clone()
    }

    /// Returns the history cursor.
    #[must_use]
    pub fn history_cursor(&self) -> usize {
        self.lock().cursor
    }

    // ------------------------------------------------------------------
    // Reset and checkpoints
    // ------------------------------------------------------------------

    /// Restores mount values and clears validations, suggestions, history,
    /// and metadata.
    pub fn reset(&self) {
        let mut notices = Vec::new();
        {
            let mut state = self.lock();
            let snapshot = state.initial_values.clone();
            state.restore_snapshot(snapshot, &mut notices);
            state.checkpoint_values = state.initial_values.clone();
            state.validations.clear();
            state.suggestions.clear();
            state.history.clear();
            state.cursor = 0;
            state.metadata = FormMetadata::default();
        }
        self.notify(notices);
    }

    /// Records a save checkpoint for delta reporting.
    pub fn mark_clean(&self, now: Timestamp) {
        let mut state = self.lock();
        state.checkpoint_values = state.values.clone();
        state.metadata.last_saved_at = Some(now);
        state.metadata.draft_saved = true;
    }

    /// Returns when the draft was last checkpointed.
    #[must_use]
    pub fn last_saved_at(&self) -> Option<Timestamp> {
        self.lock().metadata.last_saved_at
    }

    /// Returns true when a draft checkpoint exists.
    #[must_use]
    pub fn is_draft_saved(&self) -> bool {
        self.lock().metadata.draft_saved
    }

    /// Returns the deltas since the last checkpoint (or since mount when
    /// never saved).
    #[must_use]
    pub fn changes(&self) -> Vec<FieldChange> {
        let state = self.lock();
        let names: BTreeSet<FieldName> =
            state.values.keys().chain(state.checkpoint_values.keys()).cloned().collect();
        names
            .into_iter()
            .filter(|name| state.values.get(name) != state.checkpoint_values.get(name))
            .map(|name| FieldChange {
                previous: state.checkpoint_values.get(&name).cloned(),
                current: state.values.get(&name).cloned(),
                field: name,
            })
            .collect()
    }

    /// Returns a snapshot of the session metadata.
    #[must_use]
    pub fn metadata(&self) -> FormMetadata {
        self.lock().metadata.clone()
    }

    // ------------------------------------------------------------------
    // Background job display state
    // ------------------------------------------------------------------

    /// Stores the background job shown to hosts.
    pub fn set_job(&self, job: BackgroundJob) {
        self.lock().job = Some(job);
    }

    /// Returns the background job shown to hosts.
    #[must_use]
    pub fn job(&self) -> Option<BackgroundJob> {
        self.lock().job.clone()
    }

    /// Clears the background job display state.
    pub fn clear_job(&self) {
        self.lock().job = None;
    }
}
