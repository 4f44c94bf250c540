// crates/formforge-core/src/runtime/suggest.rs
// ============================================================================
// Module: FormForge Suggestion Engine
// Description: Suggestion requests, confidence gating, expiry, and cascades.
// Purpose: Offer alternative values without overwriting what the user typed.
// Dependencies: crate::{core, interfaces, runtime}, futures, when-logic
// ============================================================================

//! ## Overview
//! The suggestion engine requests proposals from the injected provider and
//! writes dual-value suggestion states into the store. A request fires only
//! when the field opts in, carries a non-empty value, has no request pending,
//! and holds no fresh suggestion already. Proposals below the field's
//! confidence threshold are discarded before they are ever stored, and a
//! periodic sweep clears accepted suggestions whose lifetime lapsed.
//!
//! Provider failures degrade to "no suggestion available" with a diagnostic
//! event; they never surface as form errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use serde_json::Value;
use when_logic::is_empty_value;

use crate::core::ActiveValue;
use crate::core::EngineConfig;
use crate::core::EngineEvent;
use crate::core::FieldName;
use crate::core::JobDescriptor;
use crate::core::SuggestionResult;
use crate::core::SuggestionState;
use crate::core::SuggestionStatus;
use crate::core::Timestamp;
use crate::interfaces::BulkSuggestRequest;
use crate::interfaces::CallContext;
use crate::interfaces::EventSink;
use crate::interfaces::SuggestionProvider;
use crate::runtime::store::FormStateStore;

// ============================================================================
// SECTION: Suggestion Engine
// ============================================================================

/// Suggestion orchestration over the shared store.
pub struct SuggestionEngine {
    /// Shared state store.
    store: Arc<FormStateStore>,
    /// Injected suggestion provider.
    provider: Arc<dyn SuggestionProvider>,
    /// Injected diagnostic sink.
    events: Arc<dyn EventSink>,
    /// Engine configuration.
    config: EngineConfig,
    /// Reverse dependency map derived from the schema.
    dependents: BTreeMap<FieldName, Vec<FieldName>>,
    /// Fields queued for a suggestion request.
    pending: Mutex<BTreeSet<FieldName>>,
}

impl SuggestionEngine {
    /// Creates a suggestion engine over the store.
    #[must_use]
    pub fn new(
        store: Arc<FormStateStore>,
        provider: Arc<dyn SuggestionProvider>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let config = *store.config();
        let dependents = store.schema().dependents();
        Self {
            store,
            provider,
            events,
            config,
            dependents,
            pending: Mutex::new(BTreeSet::new()),
        }
    }

    /// Locks the pending set, recovering from a poisoned lock.
    fn lock_pending(&self) -> MutexGuard<'_, BTreeSet<FieldName>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds the provider call context for a field.
    fn context(&self, name: &FieldName) -> CallContext {
        CallContext {
            field: name.clone(),
            values: self.store.values(),
            schema: self.store.schema(),
        }
    }

    /// Resolves the confidence threshold for a field.
    fn threshold(&self, name: &FieldName) -> f64 {
        self.store
            .schema()
            .field(name)
            .and_then(|field| field.suggest.as_ref())
            .and_then(|spec| spec.min_confidence)
            .unwrap_or(self.config.min_confidence)
    }

    // ------------------------------------------------------------------
    // Request gating
    // ------------------------------------------------------------------

    /// Returns true when a fresh suggestion request may fire for the field.
    ///
    /// The gate requires a `suggest` spec, a non-empty current value, no
    /// request pending, and no existing suggestion that is still fresh.
    #[must_use]
    pub fn request_allowed(&self, name: &FieldName, now: Timestamp) -> bool {
        let schema = self.store.schema();
        let Some(field) = schema.field(name) else {
            return false;
        };
        if field.suggest.is_none() {
            return false;
        }
        let has_value = self.store.value(name).is_some_and(|value| !is_empty_value(&value));
        if !has_value {
            return false;
        }
        match self.store.suggestion(name) {
            None => true,
            Some(state) if state.status == SuggestionStatus::None => true,
            Some(state) if state.status.is_pending() => false,
            Some(state) => state.is_expired(now),
        }
    }

    /// Queues a suggestion request for the field; the gate is re-checked at
    /// flush time.
    pub fn queue(&self, name: &FieldName) {
        self.lock_pending().insert(name.clone());
    }

    /// Reacts to a value change: queues the field itself and cascades through
    /// declared dependents, invalidating their existing suggestions so fresh
    /// ones are requested.
    ///
    /// The cascade carries a visited set per root trigger so dependency
    /// cycles settle instead of recursing.
    pub fn on_value_changed(&self, name: &FieldName) {
        let mut visited: BTreeSet<FieldName> = BTreeSet::new();
        let mut queue: VecDeque<FieldName> = VecDeque::from([name.clone()]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if current != *name {
                self.store.clear_suggestion(&current);
            }
            self.queue(&current);
            if let Some(dependents) = self.dependents.get(&current) {
                for dependent in dependents {
                    if !visited.contains(dependent) {
                        queue.push_back(dependent.clone());
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Request execution
    // ------------------------------------------------------------------

    /// Executes every queued request whose gate still holds.
    ///
    /// Returns the fields for which a suggestion became available.
    pub async fn flush(&self, now: Timestamp) -> Vec<FieldName> {
        let queued: Vec<FieldName> = {
            let mut pending = self.lock_pending();
            let drained: Vec<FieldName> = pending.iter().cloned().collect();
            pending.clear();
            drained
        };
        let runs = queued.iter().map(|name| self.request_one(name, now));
        let results = futures::future::join_all(runs).await;
        queued
            .into_iter()
            .zip(results)
            .filter_map(|(name, applied)| applied.then_some(name))
            .collect()
    }

    /// Runs one gated suggestion request. Returns true when a proposal was
    /// stored.
    async fn request_one(&self, name: &FieldName, now: Timestamp) -> bool {
        if !self.request_allowed(name, now) {
            return false;
        }
        let Some(requested_value) = self.store.value(name) else {
            return false;
        };

        self.store.set_suggestion(name, SuggestionState {
            status: SuggestionStatus::Loading,
            user_value: Some(requested_value.clone()),
            updated_at: Some(now),
            ..SuggestionState::default()
        });

        let ctx = self.context(name);
        match self.provider.suggest(&requested_value, &ctx).await {
            Ok(Some(result)) => {
                if self.store.value(name).as_ref() != Some(&requested_value) {
                    self.events.record(&EngineEvent::StaleResultDiscarded {
                        field: name.clone(),
                    });
                    self.store.clear_suggestion(name);
                    return false;
                }
                self.apply_result(name, &requested_value, result, now)
            }
            Ok(None) => {
                self.store.clear_suggestion(name);
                false
            }
            Err(error) => {
                self.events.record(&EngineEvent::SuggestionFailed {
                    field: name.clone(),
                    message: error.to_string(),
                });
                self.store.clear_suggestion(name);
                false
            }
        }
    }

    /// Applies one proposal through the confidence gate. Returns true when
    /// it was stored.
    fn apply_result(
        &self,
        name: &FieldName,
        user_value: &Value,
        result: SuggestionResult,
        now: Timestamp,
    ) -> bool {
        let threshold = self.threshold(name);
        if result.confidence < threshold {
            self.events.record(&EngineEvent::SuggestionBelowThreshold {
                field: name.clone(),
                confidence: result.confidence,
                threshold,
            });
            self.store.clear_suggestion(name);
            return false;
        }
        self.store.set_suggestion(name, SuggestionState {
            status: SuggestionStatus::Available,
            user_value: Some(user_value.clone()),
            suggested_value: Some(result.value.clone()),
            original_suggested_value: Some(result.value),
            active: ActiveValue::User,
            suggested_value_modified: false,
            confidence: Some(result.confidence),
            reason: result.reason,
            updated_at: Some(now),
            expires_at: None,
            source: result.source,
            error: None,
        });
        true
    }

    // ------------------------------------------------------------------
    // Bulk requests
    // ------------------------------------------------------------------

    /// Requests suggestions for many fields at once.
    ///
    /// Immediate results are applied through the confidence gate; a returned
    /// job descriptor is handed back for the job tracker to own.
    pub async fn bulk(&self, attachments: Vec<Value>, now: Timestamp) -> Option<JobDescriptor> {
        let request = BulkSuggestRequest {
            attachments,
            schema: self.store.schema(),
            values: self.store.values(),
        };
        match self.provider.bulk_suggest(&request).await {
            Ok(response) => {
                for (name, result) in response.immediate {
                    let user_value = self.store.value(&name).unwrap_or(Value::Null);
                    self.apply_result(&name, &user_value, result, now);
                }
                response.job
            }
            Err(error) => {
                self.events.record(&EngineEvent::BulkSuggestFailed {
                    message: error.to_string(),
                });
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Expiry sweep
    // ------------------------------------------------------------------

    /// Clears every suggestion whose lifetime lapsed, reverting its status.
    ///
    /// Returns the affected fields.
    pub fn sweep(&self, now: Timestamp) -> Vec<FieldName> {
        let expired: Vec<FieldName> = self
            .store
            .suggestions()
            .into_iter()
            .filter(|(_, state)| state.is_expired(now))
            .map(|(name, _)| name)
            .collect();
        for name in &expired {
            self.store.clear_suggestion(name);
        }
        if !expired.is_empty() {
            self.events.record(&EngineEvent::SuggestionsExpired {
                fields: expired.clone(),
            });
        }
        expired
    }
}
