// crates/formforge-core/src/runtime/navigator.rs
// ============================================================================
// Module: FormForge Page Navigator
// Description: Gated page traversal, submission, and render view assembly.
// Purpose: Drive wizard navigation with validation gates and build the
//          presentation-agnostic page view.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The navigator owns the current page index and the traversal rules:
//! forward navigation is gated on the departing page having no blocking
//! failures among its visible fields, backward navigation is always allowed,
//! and submission gates on the whole form plus cross-field rules. A refused
//! move changes nothing beyond the validation outcomes it populated for
//! display.
//!
//! Rendering stays outside the engine: `page_view` assembles plain data
//! (field definition, current value, validation outcome, suggestion badge,
//! loading flags, progress) for host renderers to draw.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use serde_json::Value;

use crate::core::EngineEvent;
use crate::core::FieldName;
use crate::core::FieldSpec;
use crate::core::PageId;
use crate::core::SuggestionState;
use crate::core::Timestamp;
use crate::core::ValidationOutcome;
use crate::interfaces::EventSink;
use crate::interfaces::SubmissionSink;
use crate::runtime::registry::FieldTypeRegistry;
use crate::runtime::store::FormStateStore;
use crate::runtime::validate::ValidationEngine;
use crate::runtime::visibility::page_visible;
use crate::runtime::visibility::visible_fields;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of a forward navigation attempt.
///
/// # Invariants
/// - `Refused` leaves the page index unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    /// Navigation advanced to the page at the given index.
    Advanced {
        /// New page index.
        page: usize,
    },
    /// Navigation was vetoed by blocking failures on the departing page.
    Refused {
        /// Blocking failures by field.
        errors: BTreeMap<FieldName, ValidationOutcome>,
    },
    /// The current page is the last visible page; submission is next.
    AtEnd,
}

/// Result of a submission attempt.
///
/// # Invariants
/// - `Refused` and `Failed` leave engine state untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The submission sink accepted the values snapshot.
    Submitted,
    /// Submission was vetoed by blocking failures somewhere in the form.
    Refused {
        /// Blocking failures by field.
        errors: BTreeMap<FieldName, ValidationOutcome>,
    },
    /// The submission sink rejected the payload.
    Failed {
        /// Sink error description.
        message: String,
    },
}

// ============================================================================
// SECTION: Render View
// ============================================================================

/// Presentation-agnostic view of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    /// Field definition from the schema.
    pub field: FieldSpec,
    /// Current active value.
    pub value: Option<Value>,
    /// Stored validation outcome.
    pub validation: Option<ValidationOutcome>,
    /// Stored suggestion state.
    pub suggestion: Option<SuggestionState>,
    /// True while a remote check is queued or in flight.
    pub validating: bool,
    /// False when the field type has no registered handler; renderers should
    /// skip the widget and warn instead of failing the form.
    pub supported: bool,
}

/// Completion progress over visible required fields.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FormProgress {
    /// Visible required fields holding a non-empty value.
    pub answered_required: usize,
    /// Visible required fields in total.
    pub total_required: usize,
}

impl FormProgress {
    /// Returns the completion ratio in `[0, 1]`; an empty form counts as
    /// complete.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total_required == 0 {
            1.0
        } else {
            let answered = u32::try_from(self.answered_required).unwrap_or(u32::MAX);
            let total = u32::try_from(self.total_required).unwrap_or(u32::MAX);
            f64::from(answered) / f64::from(total)
        }
    }
}

/// Presentation-agnostic view of the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    /// Page identifier.
    pub page_id: PageId,
    /// Page index.
    pub index: usize,
    /// Optional page title.
    pub title: Option<String>,
    /// Optional page description.
    pub description: Option<String>,
    /// Visible fields in presentation order.
    pub fields: Vec<FieldView>,
    /// True when a previous visible page exists.
    pub can_go_back: bool,
    /// True when this is the last visible page and submit replaces next.
    pub is_last: bool,
    /// Completion progress over the whole form.
    pub progress: FormProgress,
}

// ============================================================================
// SECTION: Navigator
// ============================================================================

/// Page traversal and submission over the shared store.
pub struct FormNavigator {
    /// Shared state store.
    store: Arc<FormStateStore>,
    /// Validation engine used for gates.
    validation: Arc<ValidationEngine>,
    /// Field type registry for render views.
    types: Arc<FieldTypeRegistry>,
    /// Injected submission sink.
    submission: Arc<dyn SubmissionSink>,
    /// Injected diagnostic sink.
    events: Arc<dyn EventSink>,
    /// Current page index over the raw page list.
    index: Mutex<usize>,
}

impl FormNavigator {
    /// Creates a navigator starting at the first page.
    #[must_use]
    pub fn new(
        store: Arc<FormStateStore>,
        validation: Arc<ValidationEngine>,
        types: Arc<FieldTypeRegistry>,
        submission: Arc<dyn SubmissionSink>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            validation,
            types,
            submission,
            events,
            index: Mutex::new(0),
        }
    }

    /// Locks the index, recovering from a poisoned lock.
    fn lock_index(&self) -> MutexGuard<'_, usize> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current page index.
    #[must_use]
    pub fn current_page_index(&self) -> usize {
        *self.lock_index()
    }

    /// Returns the indices of the currently visible pages, evaluated fresh
    /// against current values.
    #[must_use]
    pub fn visible_page_indices(&self) -> Vec<usize> {
        let schema = self.store.schema();
        let values = self.store.values();
        schema
            .pages
            .iter()
            .enumerate()
            .filter(|(_, page)| page_visible(page, &values))
            .map(|(index, _)| index)
            .collect()
    }

    /// Returns true when no later visible page exists.
    #[must_use]
    pub fn is_last_page(&self) -> bool {
        let current = self.current_page_index();
        !self.visible_page_indices().into_iter().any(|index| index > current)
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Attempts to advance past the current page.
    ///
    /// The departing page's visible fields run the full validation pipeline;
    /// any blocking failure refuses the move with the index unchanged.
    pub async fn next(&self, now: Timestamp) -> NavigationOutcome {
        let current = self.current_page_index();
        let results = self.validation.validate_page(current, now).await;
        let errors: BTreeMap<FieldName, ValidationOutcome> = results
            .into_iter()
            .filter(|(_, outcome)| outcome.is_blocking_failure())
            .collect();
        if !errors.is_empty() {
            return NavigationOutcome::Refused {
                errors,
            };
        }

        let Some(target) =
            self.visible_page_indices().into_iter().find(|index| *index > current)
        else {
            return NavigationOutcome::AtEnd;
        };
        *self.lock_index() = target;
        NavigationOutcome::Advanced {
            page: target,
        }
    }

    /// Moves back to the previous visible page; always allowed, floored at
    /// the first visible page.
    pub fn previous(&self) -> usize {
        let current = self.current_page_index();
        let target = self
            .visible_page_indices()
            .into_iter()
            .filter(|index| *index < current)
            .next_back()
            .unwrap_or(current);
        *self.lock_index() = target;
        target
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Validates the whole form plus cross-field rules and, when nothing
    /// blocks, hands the values snapshot to the submission sink.
    ///
    /// The engine does not mutate its own state on success.
    pub async fn submit(&self, now: Timestamp) -> SubmitOutcome {
        let results = self.validation.validate_all(now).await;
        let errors: BTreeMap<FieldName, ValidationOutcome> = results
            .into_iter()
            .filter(|(_, outcome)| outcome.is_blocking_failure())
            .collect();
        if !errors.is_empty() {
            return SubmitOutcome::Refused {
                errors,
            };
        }

        let values = self.store.values();
        match self.submission.submit(&values).await {
            Ok(()) => SubmitOutcome::Submitted,
            Err(error) => {
                let message = error.to_string();
                self.events.record(&EngineEvent::SubmitFailed {
                    message: message.clone(),
                });
                SubmitOutcome::Failed {
                    message,
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Render view
    // ------------------------------------------------------------------

    /// Assembles the presentation-agnostic view of the current page.
    ///
    /// Returns `None` when the current page is hidden by its visibility
    /// condition; hosts should advance or re-derive the page list.
    #[must_use]
    pub fn page_view(&self) -> Option<PageView> {
        let schema = self.store.schema();
        let values = self.store.values();
        let index = self.current_page_index();
        let page = schema.pages.get(index)?;
        if !page_visible(page, &values) {
            return None;
        }

        let fields = visible_fields(page, &values)
            .into_iter()
            .map(|field| FieldView {
                value: values.get(&field.name).cloned(),
                validation: self.store.outcome(&field.name),
                suggestion: self.store.suggestion(&field.name),
                validating: self.validation.is_pending(&field.name),
                supported: self.types.is_known(&field.field_type),
                field: field.clone(),
            })
            .collect();

        let can_go_back =
            self.visible_page_indices().into_iter().any(|visible| visible < index);

        Some(PageView {
            page_id: page.page_id.clone(),
            index,
            title: page.title.clone(),
            description: page.description.clone(),
            fields,
            can_go_back,
            is_last: self.is_last_page(),
            progress: self.progress(),
        })
    }

    /// Computes completion progress over every visible required field.
    #[must_use]
    pub fn progress(&self) -> FormProgress {
        let schema = self.store.schema();
        let values = self.store.values();
        let mut progress = FormProgress::default();
        for page in schema.pages.iter().filter(|page| page_visible(page, &values)) {
            for field in visible_fields(page, &values) {
                if !field.required {
                    continue;
                }
                progress.total_required += 1;
                let answered = values
                    .get(&field.name)
                    .is_some_and(|value| !self.types.handler(&field.field_type).is_empty(value));
                if answered {
                    progress.answered_required += 1;
                }
            }
        }
        progress
    }
}
