// crates/formforge-core/src/core/history.rs
// ============================================================================
// Module: FormForge History Log
// Description: Undo/redo history entries with values snapshots.
// Purpose: Capture state-mutating user actions for linear undo and redo.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! History is a bounded linear log with a cursor. Every state-mutating user
//! action appends one entry carrying a full values snapshot taken after the
//! action; undo restores the preceding snapshot and redo re-applies the
//! entry's own. Writing past the cursor truncates the redo tail.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::FieldName;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: History Entries
// ============================================================================

/// Kind of state-mutating user action recorded in history.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    /// Direct edit of a field value.
    FieldEdit,
    /// Acceptance of one suggestion.
    AcceptSuggestion,
    /// Dismissal of one suggestion.
    DismissSuggestion,
    /// Flip of the dual-value selector.
    ToggleValue,
    /// Bulk acceptance of several suggestions.
    BulkAccept,
}

/// One history entry.
///
/// # Invariants
/// - `snapshot` is the complete values map after the action; restoring it
///   reproduces the post-action state exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the action happened.
    pub at: Timestamp,
    /// Action kind.
    pub kind: HistoryKind,
    /// Fields affected by the action.
    pub fields: Vec<FieldName>,
    /// Human-readable description for history UIs.
    pub description: String,
    /// Full values map after the action.
    pub snapshot: BTreeMap<FieldName, Value>,
}
