// crates/formforge-core/src/core/time.rs
// ============================================================================
// Module: FormForge Time Model
// Description: Canonical timestamp representation for engine operations.
// Purpose: Provide deterministic, replayable time values across engine state.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! FormForge uses explicit time values supplied by callers on every
//! time-sensitive operation. The engine never reads wall-clock time directly;
//! the timer driver is the only component that does, and it passes the value
//! in. This keeps debounce windows, cache TTLs, suggestion expiry, and job
//! polling fully deterministic under test.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp in unix epoch milliseconds.
///
/// # Invariants
/// - Values are explicitly provided by callers; the engine never reads the
///   wall clock.
/// - Monotonicity is a caller responsibility; arithmetic saturates rather
///   than wrapping.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns this timestamp advanced by the given number of milliseconds.
    #[must_use]
    pub const fn plus_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Returns true when this timestamp is strictly before the other.
    #[must_use]
    pub const fn is_before(self, other: Self) -> bool {
        self.0 < other.0
    }

    /// Returns the milliseconds elapsed from `earlier` to this timestamp.
    #[must_use]
    pub const fn millis_since(self, earlier: Self) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}
