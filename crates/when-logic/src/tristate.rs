// crates/when-logic/src/tristate.rs
// ============================================================================
// Module: Tri-State Values
// Description: Three-valued logic primitive with Kleene connectives.
// Purpose: Represent condition outcomes where operands may be missing.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! `TriState` extends boolean outcomes with `Unknown` for conditions whose
//! operands are absent or of an incomparable type. Connectives follow strong
//! Kleene semantics: `False` dominates conjunction, `True` dominates
//! disjunction, and `Unknown` is absorbed only by a dominating operand.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Tri-State
// ============================================================================

/// Three-valued condition outcome.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    /// Condition holds.
    True,
    /// Condition does not hold.
    False,
    /// Condition cannot be decided from the available operands.
    Unknown,
}

impl TriState {
    /// Returns true only for [`TriState::True`].
    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    /// Returns true only for [`TriState::False`].
    #[must_use]
    pub const fn is_false(self) -> bool {
        matches!(self, Self::False)
    }

    /// Kleene conjunction.
    #[must_use]
    pub const fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::True, Self::True) => Self::True,
            _ => Self::Unknown,
        }
    }

    /// Kleene disjunction.
    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::False, Self::False) => Self::False,
            _ => Self::Unknown,
        }
    }

    /// Kleene negation.
    #[must_use]
    pub const fn negate(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
        }
    }

    /// Folds an iterator with conjunction; empty input yields `True`.
    #[must_use]
    pub fn all(outcomes: impl IntoIterator<Item = Self>) -> Self {
        outcomes.into_iter().fold(Self::True, Self::and)
    }

    /// Folds an iterator with disjunction; empty input yields `False`.
    #[must_use]
    pub fn any(outcomes: impl IntoIterator<Item = Self>) -> Self {
        outcomes.into_iter().fold(Self::False, Self::or)
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}
