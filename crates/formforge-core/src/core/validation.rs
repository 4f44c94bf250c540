// crates/formforge-core/src/core/validation.rs
// ============================================================================
// Module: FormForge Validation Results
// Description: Per-field validation outcomes and severities.
// Purpose: Provide stable, serializable validation result types.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Validation outcomes are transient per-field records produced by the
//! validation engine and stored in the form state store. Severity controls
//! the default blocking behavior: errors block navigation and submission,
//! warnings and infos never do.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Severity
// ============================================================================

/// Validation outcome severity.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Failure severe enough to block navigation and submission by default.
    #[default]
    Error,
    /// Advisory failure shown to the user without blocking progress.
    Warning,
    /// Informational note.
    Info,
}

impl Severity {
    /// Returns the default blocking behavior for this severity.
    #[must_use]
    pub const fn blocks_by_default(self) -> bool {
        matches!(self, Self::Error)
    }
}

// ============================================================================
// SECTION: Validation Outcome
// ============================================================================

/// Per-field validation outcome.
///
/// # Invariants
/// - `blocking` is meaningful only when `valid` is false.
/// - Cross-field rule failures produce identical outcomes on every
///   participating field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Whether the value is acceptable.
    pub valid: bool,
    /// Optional user-facing message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Outcome severity.
    #[serde(default)]
    pub severity: Severity,
    /// Whether the outcome vetoes navigation and submission.
    pub blocking: bool,
    /// Optional suggested replacement value that would pass the failed check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_fix: Option<Value>,
}

impl ValidationOutcome {
    /// Builds a passing outcome.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            valid: true,
            message: None,
            severity: Severity::Error,
            blocking: false,
            auto_fix: None,
        }
    }

    /// Builds a blocking error outcome with a message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
            severity: Severity::Error,
            blocking: true,
            auto_fix: None,
        }
    }

    /// Builds a failing outcome with an explicit severity.
    ///
    /// Blocking defaults to the severity's blocking behavior.
    #[must_use]
    pub fn failed(message: impl Into<String>, severity: Severity, blocking: Option<bool>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
            severity,
            blocking: blocking.unwrap_or_else(|| severity.blocks_by_default()),
            auto_fix: None,
        }
    }

    /// Returns true when this outcome vetoes forward progress.
    #[must_use]
    pub const fn is_blocking_failure(&self) -> bool {
        !self.valid && self.blocking
    }
}

// ============================================================================
// SECTION: Remote Outcome
// ============================================================================

/// Tri-state result contract for remote (asynchronous) checks.
///
/// # Invariants
/// - Variants are stable for programmatic handling across provider
///   implementations.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome {
    /// Value accepted.
    Valid,
    /// Value rejected with a plain message (severity error, blocking).
    Message(String),
    /// Fully structured outcome supplied by the provider.
    Outcome(ValidationOutcome),
}

impl RemoteOutcome {
    /// Converts the provider contract into a stored outcome.
    #[must_use]
    pub fn into_outcome(self) -> ValidationOutcome {
        match self {
            Self::Valid => ValidationOutcome::ok(),
            Self::Message(message) => ValidationOutcome::error(message),
            Self::Outcome(outcome) => outcome,
        }
    }
}
