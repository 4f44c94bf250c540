// crates/formforge-core/src/core/job.rs
// ============================================================================
// Module: FormForge Background Jobs
// Description: Long-running suggestion job model and update records.
// Purpose: Provide stable job state shared between tracker, store, and feeds.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A background job fills several fields' suggestions over time. The job
//! feed returns the full job shape on every poll, carrying only the updates
//! that are new since the previous poll; the tracker applies each update at
//! most once, keyed by field and timestamp.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::FieldName;
use crate::core::identifiers::JobId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Job Status
// ============================================================================

/// Background job lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - `Completed`, `Failed`, `Partial`, and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the provider, not yet running.
    Queued,
    /// Actively producing results.
    Processing,
    /// Finished with every field resolved.
    Completed,
    /// Finished without producing results.
    Failed,
    /// Finished with some fields resolved and some failed.
    Partial,
    /// Stopped at the caller's request.
    Cancelled,
}

impl JobStatus {
    /// Returns true for statuses after which no further updates arrive.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Partial | Self::Cancelled)
    }
}

// ============================================================================
// SECTION: Job Updates
// ============================================================================

/// One incremental field result delivered by a poll.
///
/// # Invariants
/// - `(field, at)` identifies the update for idempotent application; a
///   redelivered update is applied at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    /// Field the value belongs to.
    pub field: FieldName,
    /// Proposed value.
    pub value: Value,
    /// Provider confidence in the value (0 to 1).
    pub confidence: f64,
    /// When the provider produced the value.
    pub at: Timestamp,
}

// ============================================================================
// SECTION: Job State
// ============================================================================

/// Full background job state returned by every poll.
///
/// # Invariants
/// - `new_updates` carries only updates since the previous poll; cumulative
///   results live in `partial_results`.
/// - `progress` is a ratio in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundJob {
    /// Job identifier.
    pub job_id: JobId,
    /// Lifecycle status.
    pub status: JobStatus,
    /// Completion ratio in `[0, 1]`.
    #[serde(default)]
    pub progress: f64,
    /// Cumulative per-field results produced so far.
    #[serde(default)]
    pub partial_results: BTreeMap<FieldName, Value>,
    /// Fields whose results are final.
    #[serde(default)]
    pub completed_fields: Vec<FieldName>,
    /// Fields still awaiting results.
    #[serde(default)]
    pub pending_fields: Vec<FieldName>,
    /// Updates that are new since the previous poll.
    #[serde(default)]
    pub new_updates: Vec<JobUpdate>,
    /// Per-field errors reported by the provider.
    #[serde(default)]
    pub field_errors: BTreeMap<FieldName, String>,
    /// Job-level error for failed jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the job started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// When the provider last changed the job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

// ============================================================================
// SECTION: Job Descriptors
// ============================================================================

/// Descriptor returned when a bulk suggestion request spawns a job.
///
/// # Invariants
/// - `affected_fields` lists every field the job may eventually fill; each
///   is marked expecting as soon as tracking starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Job identifier.
    pub job_id: JobId,
    /// Fields the job may fill.
    pub affected_fields: Vec<FieldName>,
}
