// crates/formforge-core/src/core/config.rs
// ============================================================================
// Module: FormForge Engine Configuration
// Description: Tunable intervals, thresholds, and limits.
// Purpose: Centralize engine defaults in one serializable configuration.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! All engine tunables live here with their documented defaults. Hosts may
//! deserialize a partial document; absent keys fall back to the defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default remote-validation debounce window in milliseconds.
const DEFAULT_REMOTE_DEBOUNCE_MS: i64 = 500;
/// Default validation cache lifetime in milliseconds.
const DEFAULT_VALIDATION_CACHE_TTL_MS: i64 = 300_000;
/// Default minimum confidence required to surface a suggestion.
const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;
/// Default accepted-suggestion lifetime in milliseconds.
const DEFAULT_SUGGESTION_TTL_MS: i64 = 3_600_000;
/// Default expiry sweep interval in milliseconds.
const DEFAULT_SWEEP_INTERVAL_MS: i64 = 60_000;
/// Default job poll interval in milliseconds.
const DEFAULT_POLL_INTERVAL_MS: i64 = 2_000;
/// Default autosave interval in milliseconds.
const DEFAULT_AUTOSAVE_INTERVAL_MS: i64 = 30_000;
/// Default bound on retained history entries.
const DEFAULT_HISTORY_LIMIT: usize = 50;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Engine configuration with spec defaults.
///
/// # Invariants
/// - Intervals are milliseconds; zero disables debouncing or caching but is
///   otherwise honored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Remote-validation debounce window in milliseconds.
    pub remote_debounce_ms: i64,
    /// Validation cache lifetime in milliseconds.
    pub validation_cache_ttl_ms: i64,
    /// Minimum confidence required to surface a suggestion.
    pub min_confidence: f64,
    /// Accepted-suggestion lifetime in milliseconds.
    pub suggestion_ttl_ms: i64,
    /// Expiry sweep interval in milliseconds.
    pub sweep_interval_ms: i64,
    /// Job poll interval in milliseconds.
    pub poll_interval_ms: i64,
    /// Autosave interval in milliseconds.
    pub autosave_interval_ms: i64,
    /// Bound on retained history entries.
    pub history_limit: usize,
    /// When true, hosts should render the form non-interactive while a job
    /// is active; the engine itself keeps answering state queries.
    pub blocking_jobs: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            remote_debounce_ms: DEFAULT_REMOTE_DEBOUNCE_MS,
            validation_cache_ttl_ms: DEFAULT_VALIDATION_CACHE_TTL_MS,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            suggestion_ttl_ms: DEFAULT_SUGGESTION_TTL_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            autosave_interval_ms: DEFAULT_AUTOSAVE_INTERVAL_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            blocking_jobs: false,
        }
    }
}
