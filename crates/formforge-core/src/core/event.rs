// crates/formforge-core/src/core/event.rs
// ============================================================================
// Module: FormForge Engine Events
// Description: Structured diagnostic records emitted by the engine.
// Purpose: Surface provider failures and discarded work without a global logger.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! The engine never installs a logger and never lets a provider failure
//! escape as a panic or an unhandled rejection. Everything worth knowing
//! about is emitted as a structured event through the injected event sink;
//! hosts decide whether to log, count, or ignore them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::FieldName;
use crate::core::identifiers::JobId;

// ============================================================================
// SECTION: Engine Events
// ============================================================================

/// Structured diagnostic record.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - Events are informational; the engine has already applied its fallback
///   behavior by the time one is emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A remote validation call failed and was converted into a blocking
    /// outcome.
    RemoteValidationFailed {
        /// Field being validated.
        field: FieldName,
        /// Provider error description.
        message: String,
    },
    /// A resolved result no longer matched the field's current value and was
    /// discarded.
    StaleResultDiscarded {
        /// Field whose result was discarded.
        field: FieldName,
    },
    /// A validation spec carried a pattern that failed to compile; the check
    /// was skipped.
    InvalidPattern {
        /// Field carrying the pattern.
        field: FieldName,
        /// The rejected pattern source.
        pattern: String,
    },
    /// A validation spec named a custom check that is not registered; the
    /// check was skipped.
    UnknownCustomCheck {
        /// Field naming the check.
        field: FieldName,
        /// The unresolved check name.
        check: String,
    },
    /// A suggestion call failed; the field degrades to "no suggestion".
    SuggestionFailed {
        /// Field being suggested.
        field: FieldName,
        /// Provider error description.
        message: String,
    },
    /// A bulk suggestion call failed; no fields were touched.
    BulkSuggestFailed {
        /// Provider error description.
        message: String,
    },
    /// A proposal arrived below the field's confidence threshold and was
    /// discarded.
    SuggestionBelowThreshold {
        /// Field being suggested.
        field: FieldName,
        /// Provider confidence.
        confidence: f64,
        /// Required threshold.
        threshold: f64,
    },
    /// The periodic sweep cleared lapsed suggestions.
    SuggestionsExpired {
        /// Fields whose suggestions were cleared.
        fields: Vec<FieldName>,
    },
    /// A background job finished without success.
    JobFailed {
        /// Job identifier.
        job_id: JobId,
        /// Job-level error description.
        message: String,
    },
    /// The remote cancellation call failed; local state was unblocked
    /// regardless.
    JobCancelFailed {
        /// Job identifier.
        job_id: JobId,
        /// Provider error description.
        message: String,
    },
    /// A status poll failed; polling continues.
    JobPollFailed {
        /// Job identifier.
        job_id: JobId,
        /// Provider error description.
        message: String,
    },
    /// A draft save attempt failed; the dirty state is retained.
    DraftSaveFailed {
        /// Sink error description.
        message: String,
    },
    /// The submission sink rejected the payload.
    SubmitFailed {
        /// Sink error description.
        message: String,
    },
}
