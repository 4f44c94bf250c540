// crates/formforge-core/src/runtime/validate.rs
// ============================================================================
// Module: FormForge Validation Engine
// Description: Synchronous pipeline, remote checks, caching, and cascades.
// Purpose: Decide per field and per gate whether a value is acceptable.
// Dependencies: crate::{core, interfaces, runtime}, bigdecimal, futures,
//               regex, tokio, url, when-logic
// ============================================================================

//! ## Overview
//! The validation engine runs a fixed synchronous pipeline per field
//! (required, length, range, pattern, email, URL, phone, named custom check;
//! first failure wins) and, only when every synchronous check passes, an
//! optional remote check through the injected validator.
//!
//! Remote checks are debounced per field through a due-time queue, cached per
//! (field, exact value) pair with a TTL, and coalesced so concurrent
//! identical requests share one provider call. A resolved result is applied
//! to the store only when the field still holds the value the check was
//! issued for; stale results are discarded with a diagnostic event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use bigdecimal::BigDecimal;
use regex::Regex;
use serde_json::Value;
use tokio::sync::watch;
use url::Url;

use crate::core::EngineConfig;
use crate::core::EngineEvent;
use crate::core::FieldName;
use crate::core::FieldSpec;
use crate::core::Timestamp;
use crate::core::ValidationOutcome;
use crate::interfaces::CallContext;
use crate::interfaces::EventSink;
use crate::interfaces::RemoteValidator;
use crate::runtime::registry::CustomCheckRegistry;
use crate::runtime::registry::FieldTypeRegistry;
use crate::runtime::store::FormStateStore;
use crate::runtime::visibility::ValuesLookup;
use crate::runtime::visibility::page_visible;
use crate::runtime::visibility::visible_fields;

// ============================================================================
// SECTION: Internal State
// ============================================================================

/// Cache key: field plus the exact value rendered canonically.
type CacheKey = (FieldName, String);

/// One cached remote outcome.
struct CacheEntry {
    /// Cached outcome.
    outcome: ValidationOutcome,
    /// When the outcome was stored.
    stored_at: Timestamp,
}

/// Mutable engine bookkeeping.
struct EngineState {
    /// Remote outcome cache keyed by (field, exact value).
    cache: BTreeMap<CacheKey, CacheEntry>,
    /// Debounce queue: field to due time.
    pending: BTreeMap<FieldName, Timestamp>,
    /// In-flight remote calls shared by concurrent identical requests.
    in_flight: BTreeMap<CacheKey, watch::Receiver<Option<ValidationOutcome>>>,
    /// Compiled pattern cache; `None` marks a pattern that failed to compile.
    patterns: BTreeMap<String, Option<Regex>>,
}

/// Path chosen for one remote check request.
enum RemotePath {
    /// A fresh cached outcome exists.
    Cached(ValidationOutcome),
    /// An identical request is in flight; share its result.
    Subscribe(watch::Receiver<Option<ValidationOutcome>>),
    /// This caller owns the provider call.
    Call(watch::Sender<Option<ValidationOutcome>>),
}

// ============================================================================
// SECTION: Validation Engine
// ============================================================================

/// Per-field and per-gate validation over the shared store.
pub struct ValidationEngine {
    /// Shared state store.
    store: Arc<FormStateStore>,
    /// Injected remote validator.
    validator: Arc<dyn RemoteValidator>,
    /// Injected diagnostic sink.
    events: Arc<dyn EventSink>,
    /// Field type registry.
    types: Arc<FieldTypeRegistry>,
    /// Named custom check registry.
    checks: Arc<CustomCheckRegistry>,
    /// Engine configuration.
    config: EngineConfig,
    /// Reverse dependency map derived from the schema.
    dependents: BTreeMap<FieldName, Vec<FieldName>>,
    /// Mutable bookkeeping.
    inner: Mutex<EngineState>,
}

impl ValidationEngine {
    /// Creates a validation engine over the store.
    #[must_use]
    pub fn new(
        store: Arc<FormStateStore>,
        validator: Arc<dyn RemoteValidator>,
        events: Arc<dyn EventSink>,
        types: Arc<FieldTypeRegistry>,
        checks: Arc<CustomCheckRegistry>,
    ) -> Self {
        let config = *store.config();
        let dependents = store.schema().dependents();
        Self {
            store,
            validator,
            events,
            types,
            checks,
            config,
            dependents,
            inner: Mutex::new(EngineState {
                cache: BTreeMap::new(),
                pending: BTreeMap::new(),
                in_flight: BTreeMap::new(),
                patterns: BTreeMap::new(),
            }),
        }
    }

    /// Locks the bookkeeping, recovering from a poisoned lock.
    fn lock_inner(&self) -> MutexGuard<'_, EngineState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds the provider call context for a field.
    fn context(&self, name: &FieldName) -> CallContext {
        CallContext {
            field: name.clone(),
            values: self.store.values(),
            schema: self.store.schema(),
        }
    }

    /// Renders a value into its canonical cache form.
    fn canon(value: &Value) -> String {
        serde_json::to_string(value).unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Synchronous pipeline
    // ------------------------------------------------------------------

    /// Runs the synchronous pipeline for a field value.
    ///
    /// Checks apply in fixed order and the first failure wins. Empty optional
    /// values pass: only the required check judges absence.
    #[must_use]
    pub fn sync_outcome(
        &self,
        field: &FieldSpec,
        value: Option<&Value>,
        ctx: &CallContext,
    ) -> ValidationOutcome {
        let handler = self.types.handler(&field.field_type);
        let empty = value.is_none_or(|value| handler.is_empty(value));
        if field.required && empty {
            return ValidationOutcome::error(format!("{} is required", field.label));
        }
        if empty {
            return ValidationOutcome::ok();
        }
        let Some(value) = value else {
            return ValidationOutcome::ok();
        };
        let Some(spec) = &field.validation else {
            return ValidationOutcome::ok();
        };

        if let Some(text) = value.as_str() {
            let length = text.chars().count();
            if let Some(min) = spec.min_length
                && length < min
            {
                return ValidationOutcome::error(format!(
                    "{} must be at least {min} characters",
                    field.label
                ));
            }
            if let Some(max) = spec.max_length
                && length > max
            {
                return ValidationOutcome::error(format!(
                    "{} must be at most {max} characters",
                    field.label
                ));
            }
        }

        if handler.numeric() && coerce_decimal(value).is_none() {
            return ValidationOutcome::error(format!("{} must be a number", field.label));
        }

        if spec.min.is_some() || spec.max.is_some() {
            let Some(number) = coerce_decimal(value) else {
                return ValidationOutcome::error(format!("{} must be a number", field.label));
            };
            if let Some(min) = spec.min.as_ref().and_then(coerce_decimal)
                && number < min
            {
                return ValidationOutcome::error(format!(
                    "{} must be at least {min}",
                    field.label
                ));
            }
            if let Some(max) = spec.max.as_ref().and_then(coerce_decimal)
                && number > max
            {
                return ValidationOutcome::error(format!("{} must be at most {max}", field.label));
            }
        }

        if let Some(pattern) = &spec.pattern
            && let Some(text) = value.as_str()
        {
            match self.compiled_pattern(&field.name, pattern) {
                Some(regex) if !regex.is_match(text) => {
                    return ValidationOutcome::error(format!(
                        "{} is not in the expected format",
                        field.label
                    ));
                }
                _ => {}
            }
        }

        if spec.email
            && let Some(text) = value.as_str()
            && !looks_like_email(text)
        {
            return ValidationOutcome::error(format!(
                "{} must be a valid email address",
                field.label
            ));
        }

        if spec.url
            && let Some(text) = value.as_str()
            && Url::parse(text).is_err()
        {
            return ValidationOutcome::error(format!("{} must be a valid URL", field.label));
        }

        if spec.phone
            && let Some(text) = value.as_str()
        {
            let digits = text.chars().filter(char::is_ascii_digit).count();
            if digits < 10 {
                return ValidationOutcome::error(format!(
                    "{} must be a valid phone number",
                    field.label
                ));
            }
        }

        if let Some(check_name) = &spec.custom {
            match self.checks.get(check_name) {
                Some(check) => {
                    if let Err(message) = (*check)(value, ctx) {
                        return ValidationOutcome::error(message);
                    }
                }
                None => {
                    self.events.record(&EngineEvent::UnknownCustomCheck {
                        field: field.name.clone(),
                        check: check_name.clone(),
                    });
                }
            }
        }

        ValidationOutcome::ok()
    }

    /// Resolves a compiled pattern, caching compilation failures.
    fn compiled_pattern(&self, field: &FieldName, pattern: &str) -> Option<Regex> {
        let (compiled, first_failure) = {
            let mut inner = self.lock_inner();
            match inner.patterns.get(pattern) {
                Some(compiled) => (compiled.clone(), false),
                None => {
                    let compiled = Regex::new(pattern).ok();
                    inner.patterns.insert(pattern.to_string(), compiled.clone());
                    let failed = compiled.is_none();
                    (compiled, failed)
                }
            }
        };
        if first_failure {
            self.events.record(&EngineEvent::InvalidPattern {
                field: field.clone(),
                pattern: pattern.to_string(),
            });
        }
        compiled
    }

    // ------------------------------------------------------------------
    // Full pipeline
    // ------------------------------------------------------------------

    /// Runs the full pipeline (synchronous stage, then remote stage when
    /// configured) and stores the outcome.
    ///
    /// Returns `None` for unknown fields.
    pub async fn validate_field(
        &self,
        name: &FieldName,
        now: Timestamp,
    ) -> Option<ValidationOutcome> {
        let schema = self.store.schema();
        let field = schema.field(name)?.clone();
        let ctx = self.context(name);
        let value = self.store.value(name);

        let sync = self.sync_outcome(&field, value.as_ref(), &ctx);
        if !sync.valid {
            self.store.set_outcome(name, sync.clone());
            return Some(sync);
        }

        let has_remote = field.validation.as_ref().is_some_and(|spec| spec.remote.is_some());
        let handler = self.types.handler(&field.field_type);
        match value {
            Some(value) if has_remote && !handler.is_empty(&value) => {
                self.lock_inner().pending.remove(name);
                Some(self.remote_check(&field, &value, &ctx, now).await)
            }
            _ => {
                self.store.set_outcome(name, sync.clone());
                Some(sync)
            }
        }
    }

    /// Runs the remote stage with caching, coalescing, and staleness checks.
    async fn remote_check(
        &self,
        field: &FieldSpec,
        value: &Value,
        ctx: &CallContext,
        now: Timestamp,
    ) -> ValidationOutcome {
        let key: CacheKey = (field.name.clone(), Self::canon(value));
        let path = {
            let mut inner = self.lock_inner();
            if let Some(entry) = inner.cache.get(&key) {
                if now.millis_since(entry.stored_at) <= self.config.validation_cache_ttl_ms {
                    RemotePath::Cached(entry.outcome.clone())
                } else {
                    inner.cache.remove(&key);
                    let (tx, rx) = watch::channel(None);
                    inner.in_flight.insert(key.clone(), rx);
                    RemotePath::Call(tx)
                }
            } else if let Some(rx) = inner.in_flight.get(&key) {
                RemotePath::Subscribe(rx.clone())
            } else {
                let (tx, rx) = watch::channel(None);
                inner.in_flight.insert(key.clone(), rx);
                RemotePath::Call(tx)
            }
        };

        match path {
            RemotePath::Cached(outcome) => {
                self.apply_if_fresh(&field.name, value, outcome.clone());
                outcome
            }
            RemotePath::Subscribe(mut rx) => {
                loop {
                    if rx.borrow().is_some() {
                        break;
                    }
                    if rx.changed().await.is_err() {
                        break;
                    }
                }
                let shared = rx.borrow().clone();
                shared.unwrap_or_else(ValidationOutcome::ok)
            }
            RemotePath::Call(tx) => {
                let outcome = match field.validation.as_ref().and_then(|spec| spec.remote.as_ref())
                {
                    Some(remote) => {
                        match self.validator.check(&remote.check_id, value, ctx).await {
                            Ok(result) => result.into_outcome(),
                            Err(error) => {
                                self.events.record(&EngineEvent::RemoteValidationFailed {
                                    field: field.name.clone(),
                                    message: error.to_string(),
                                });
                                ValidationOutcome::error("Validation error")
                            }
                        }
                    }
                    None => ValidationOutcome::ok(),
                };
                {
                    let mut inner = self.lock_inner();
                    inner.in_flight.remove(&key);
                    inner.cache.insert(key, CacheEntry {
                        outcome: outcome.clone(),
                        stored_at: now,
                    });
                }
                let _ = tx.send(Some(outcome.clone()));
                self.apply_if_fresh(&field.name, value, outcome.clone());
                outcome
            }
        }
    }

    /// Stores a resolved outcome only when the field still holds the value
    /// the check was issued for.
    fn apply_if_fresh(&self, name: &FieldName, requested: &Value, outcome: ValidationOutcome) {
        if self.store.value(name).as_ref() == Some(requested) {
            self.store.set_outcome(name, outcome);
        } else {
            self.events.record(&EngineEvent::StaleResultDiscarded {
                field: name.clone(),
            });
        }
    }

    // ------------------------------------------------------------------
    // Debounce queue
    // ------------------------------------------------------------------

    /// Schedules the field's remote check after its debounce window.
    ///
    /// Re-queuing while pending pushes the due time out, collapsing a rapid
    /// keystroke burst into one call against the settled value.
    pub fn queue_remote(&self, name: &FieldName, now: Timestamp) {
        let schema = self.store.schema();
        let Some(field) = schema.field(name) else {
            return;
        };
        let Some(remote) = field.validation.as_ref().and_then(|spec| spec.remote.as_ref()) else {
            return;
        };
        let debounce = remote.debounce_ms.unwrap_or(self.config.remote_debounce_ms);
        self.lock_inner().pending.insert(name.clone(), now.plus_millis(debounce));
    }

    /// Runs the full pipeline for every field whose debounce window elapsed.
    pub async fn flush_due(&self, now: Timestamp) -> Vec<FieldName> {
        let due: Vec<FieldName> = {
            let mut inner = self.lock_inner();
            let due: Vec<FieldName> = inner
                .pending
                .iter()
                .filter(|(_, at)| !now.is_before(**at))
                .map(|(name, _)| name.clone())
                .collect();
            for name in &due {
                inner.pending.remove(name);
            }
            due
        };
        let runs = due.iter().map(|name| self.validate_field(name, now));
        futures::future::join_all(runs).await;
        due
    }

    /// Returns true when a remote check is queued or in flight for the field.
    #[must_use]
    pub fn is_pending(&self, name: &FieldName) -> bool {
        let inner = self.lock_inner();
        inner.pending.contains_key(name)
            || inner.in_flight.keys().any(|(field, _)| field == name)
    }

    /// Drops every cached outcome for a field.
    pub fn invalidate(&self, name: &FieldName) {
        self.lock_inner().cache.retain(|(field, _), _| field != name);
    }

    // ------------------------------------------------------------------
    // Dependency cascade
    // ------------------------------------------------------------------

    /// Reacts to a value change: revalidates the field synchronously, queues
    /// its remote check, and cascades through declared dependents.
    ///
    /// The cascade carries a visited set per root trigger so dependency
    /// cycles settle instead of recursing.
    pub fn on_value_changed(&self, name: &FieldName, now: Timestamp) -> Vec<FieldName> {
        let mut visited: BTreeSet<FieldName> = BTreeSet::new();
        let mut queue: VecDeque<FieldName> = VecDeque::from([name.clone()]);
        let mut affected = Vec::new();
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if current != *name {
                self.invalidate(&current);
            }
            self.revalidate_sync(&current, now);
            affected.push(current.clone());
            if let Some(dependents) = self.dependents.get(&current) {
                for dependent in dependents {
                    if !visited.contains(dependent) {
                        queue.push_back(dependent.clone());
                    }
                }
            }
        }
        affected
    }

    /// Stores the synchronous outcome for a field and queues its remote
    /// check when eligible.
    fn revalidate_sync(&self, name: &FieldName, now: Timestamp) {
        let schema = self.store.schema();
        let Some(field) = schema.field(name) else {
            return;
        };
        let ctx = self.context(name);
        let value = self.store.value(name);
        let sync = self.sync_outcome(field, value.as_ref(), &ctx);
        let passed = sync.valid;
        self.store.set_outcome(name, sync);
        if passed
            && let Some(value) = value
            && !self.types.handler(&field.field_type).is_empty(&value)
        {
            self.queue_remote(name, now);
        }
    }

    // ------------------------------------------------------------------
    // Gates
    // ------------------------------------------------------------------

    /// Validates every visible field on one page concurrently.
    ///
    /// Hidden pages and hidden fields contribute nothing to the gate.
    pub async fn validate_page(
        &self,
        page_index: usize,
        now: Timestamp,
    ) -> BTreeMap<FieldName, ValidationOutcome> {
        let schema = self.store.schema();
        let Some(page) = schema.pages.get(page_index) else {
            return BTreeMap::new();
        };
        let values = self.store.values();
        if !page_visible(page, &values) {
            return BTreeMap::new();
        }
        let names: Vec<FieldName> =
            visible_fields(page, &values).into_iter().map(|field| field.name.clone()).collect();
        self.validate_names(&names, now).await
    }

    /// Validates every visible field on every visible page, then applies
    /// cross-field rules.
    pub async fn validate_all(&self, now: Timestamp) -> BTreeMap<FieldName, ValidationOutcome> {
        let schema = self.store.schema();
        let values = self.store.values();
        let names: Vec<FieldName> = schema
            .pages
            .iter()
            .filter(|page| page_visible(page, &values))
            .flat_map(|page| {
                visible_fields(page, &values).into_iter().map(|field| field.name.clone())
            })
            .collect();
        let mut results = self.validate_names(&names, now).await;
        for (name, outcome) in self.validate_cross() {
            match results.get(&name) {
                Some(existing) if !existing.valid => {}
                _ => {
                    results.insert(name, outcome);
                }
            }
        }
        results
    }

    /// Runs the full pipeline for a list of fields concurrently.
    async fn validate_names(
        &self,
        names: &[FieldName],
        now: Timestamp,
    ) -> BTreeMap<FieldName, ValidationOutcome> {
        let runs = names.iter().map(|name| self.validate_field(name, now));
        let outcomes = futures::future::join_all(runs).await;
        names
            .iter()
            .cloned()
            .zip(outcomes)
            .filter_map(|(name, outcome)| outcome.map(|outcome| (name, outcome)))
            .collect()
    }

    /// Evaluates every cross-field rule against current values.
    ///
    /// A failing rule's outcome attaches to every participating field, in
    /// the returned map and in the store; a field's own failing outcome is
    /// never overwritten by a cross-field result.
    #[must_use]
    pub fn validate_cross(&self) -> BTreeMap<FieldName, ValidationOutcome> {
        let schema = self.store.schema();
        let values = self.store.values();
        let lookup = ValuesLookup::new(&values);
        let mut failures = BTreeMap::new();
        for rule in &schema.cross_rules {
            if rule.expect.eval(&lookup).is_false() {
                let outcome =
                    ValidationOutcome::failed(rule.message.clone(), rule.severity, rule.blocking);
                for name in &rule.fields {
                    failures.insert(name.clone(), outcome.clone());
                    let keep_own =
                        self.store.outcome(name).is_some_and(|existing| !existing.valid);
                    if !keep_own {
                        self.store.set_outcome(name, outcome.clone());
                    }
                }
            }
        }
        failures
    }
}

// ============================================================================
// SECTION: Value Coercion
// ============================================================================

/// Coerces a JSON value into a decimal for range checks.
fn coerce_decimal(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(number) => BigDecimal::from_str(&number.to_string()).ok(),
        Value::String(text) => BigDecimal::from_str(text.trim()).ok(),
        _ => None,
    }
}

/// Loose structural email check: one `@`, dotted domain, no whitespace.
fn looks_like_email(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = text.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
