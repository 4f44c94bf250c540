// crates/formforge-core/src/core/state.rs
// ============================================================================
// Module: FormForge Session State Records
// Description: Value sources, change deltas, and session metadata.
// Purpose: Provide stable records describing how session state evolved.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! These records describe the session from the outside: who wrote each value,
//! what changed since the last save checkpoint, and which fields were touched
//! by the user versus filled with assistance. The authoritative mutable state
//! itself lives inside the form state store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::FieldName;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Value Sources
// ============================================================================

/// Origin of a value write.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - The source decides which metadata sets the write counts toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// The human typed it.
    User,
    /// An accepted or toggled suggestion supplied it.
    Suggested,
    /// The engine wrote it (defaults, restores, auto-fixes).
    System,
}

// ============================================================================
// SECTION: Change Deltas
// ============================================================================

/// One field's delta since the last save checkpoint.
///
/// # Invariants
/// - `previous` is the checkpointed value (`None` when the field had none).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Field that changed.
    pub field: FieldName,
    /// Value at the checkpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Value>,
    /// Current value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<Value>,
}

// ============================================================================
// SECTION: Session Metadata
// ============================================================================

/// Derived metadata about how the session's values were produced.
///
/// # Invariants
/// - A field can appear in both sets when the user edited an assisted value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormMetadata {
    /// Fields the user edited directly.
    pub user_edited_fields: BTreeSet<FieldName>,
    /// Fields filled through accepted or toggled suggestions.
    pub ai_assisted_fields: BTreeSet<FieldName>,
    /// When the draft was last checkpointed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved_at: Option<Timestamp>,
    /// Whether a draft checkpoint exists for the current state.
    #[serde(default)]
    pub draft_saved: bool,
}
