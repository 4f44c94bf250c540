// crates/formforge-core/src/core/suggestion.rs
// ============================================================================
// Module: FormForge Suggestion States
// Description: Dual-value suggestion lifecycle types.
// Purpose: Hold user and suggested values side by side with a stable lifecycle.
// Dependencies: crate::core::time, serde
// ============================================================================

//! ## Overview
//! A suggestion pairs what the user typed with what an external source
//! proposed, plus a selector deciding which side is live. The original
//! proposal is preserved for the whole suggestion cycle so hand edits to the
//! suggested side can always be reverted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

/// Suggestion lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - `Expecting` precedes any value: a background job has promised one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    /// No suggestion activity.
    #[default]
    None,
    /// A background job will deliver a value for this field.
    Expecting,
    /// A direct suggestion request is in flight.
    Loading,
    /// A proposal is available for review.
    Available,
    /// The user is actively comparing the two sides.
    Reviewing,
    /// The user accepted the proposal.
    Accepted,
    /// The user dismissed the proposal.
    Dismissed,
}

impl SuggestionStatus {
    /// Returns true while a value is anticipated or being fetched.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Expecting | Self::Loading)
    }
}

/// Selector deciding which side of the dual value is live.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveValue {
    /// The user-entered value is live.
    #[default]
    User,
    /// The suggested value is live.
    Suggested,
}

impl ActiveValue {
    /// Returns the opposite selector.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::User => Self::Suggested,
            Self::Suggested => Self::User,
        }
    }
}

// ============================================================================
// SECTION: Suggestion State
// ============================================================================

/// Transient per-field suggestion state.
///
/// # Invariants
/// - `original_suggested_value` is never overwritten within one suggestion
///   cycle; it is the revert target for hand-edited proposals.
/// - `expires_at` is set when the suggestion is accepted and drives the
///   periodic expiry sweep.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuggestionState {
    /// Lifecycle status.
    pub status: SuggestionStatus,
    /// What the user actually typed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_value: Option<Value>,
    /// The live proposal, possibly hand-edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<Value>,
    /// The proposal as originally delivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_suggested_value: Option<Value>,
    /// Which side is live in the rendered field.
    #[serde(default)]
    pub active: ActiveValue,
    /// Set when the user hand-edits the live suggested value.
    #[serde(default)]
    pub suggested_value_modified: bool,
    /// Provider confidence in the proposal (0 to 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Provider rationale for the proposal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// When the state last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    /// When the accepted suggestion lapses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
    /// Attribution of the proposing source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Error attached when a background job failed to deliver a value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SuggestionState {
    /// Returns true when the accepted suggestion has lapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expiry| expiry.is_before(now))
    }
}

// ============================================================================
// SECTION: Provider Results
// ============================================================================

/// Proposal returned by a suggestion provider.
///
/// # Invariants
/// - `confidence` is the provider's own estimate; the engine applies the
///   per-field threshold before storing anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResult {
    /// Proposed value.
    pub value: Value,
    /// Provider confidence in the proposal (0 to 1).
    pub confidence: f64,
    /// Provider rationale for the proposal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Attribution of the proposing source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
