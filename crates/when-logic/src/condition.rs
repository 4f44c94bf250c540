// crates/when-logic/src/condition.rs
// ============================================================================
// Module: Condition Trees
// Description: Declarative conditions evaluated against a value lookup.
// Purpose: Express visibility predicates and cross-value rules as data.
// Dependencies: crate::{compare, tristate}, serde
// ============================================================================

//! ## Overview
//! Conditions are serializable trees authored alongside a schema. Leaves
//! compare one named value against a literal or against another named value;
//! branches compose with `all`, `any`, and `not`. Evaluation never fails:
//! a missing operand yields [`TriState::Unknown`], which propagates with
//! Kleene semantics. Structural limits are enforced by [`Condition::validate`]
//! so untrusted schema documents cannot smuggle unbounded trees.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::compare::compare_equality;
use crate::compare::compare_ordering;
use crate::compare::contains_value;
use crate::compare::is_empty_value;
use crate::tristate::TriState;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum supported nesting depth for condition trees.
const MAX_CONDITION_NESTING: usize = 32;

// ============================================================================
// SECTION: Value Lookup
// ============================================================================

/// Resolves a named value for condition evaluation.
///
/// Implementations return `None` when the name has no current value; leaves
/// referencing it evaluate to `Unknown` (or to an emptiness outcome for the
/// emptiness checks, where absence counts as empty).
pub trait ValueLookup {
    /// Returns the current value for the given name, if any.
    fn value(&self, name: &str) -> Option<Value>;
}

impl<S: BuildHasher> ValueLookup for HashMap<String, Value, S> {
    fn value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl ValueLookup for BTreeMap<String, Value> {
    fn value(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl<F> ValueLookup for F
where
    F: Fn(&str) -> Option<Value>,
{
    fn value(&self, name: &str) -> Option<Value> {
        (self)(name)
    }
}

// ============================================================================
// SECTION: Operands
// ============================================================================

/// Right-hand operand of a comparison leaf.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Operand {
    /// Literal JSON value.
    Literal(Value),
    /// Reference to another named value resolved through the lookup.
    Field(String),
}

impl Operand {
    /// Resolves the operand against the lookup.
    fn resolve(&self, lookup: &impl ValueLookup) -> Option<Value> {
        match self {
            Self::Literal(value) => Some(value.clone()),
            Self::Field(name) => lookup.value(name),
        }
    }
}

// ============================================================================
// SECTION: Condition Trees
// ============================================================================

/// Declarative condition over named values.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - Trees deeper than the nesting limit fail [`Condition::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    /// Value equals the operand.
    Equals {
        /// Name of the value under test.
        field: String,
        /// Comparison operand.
        operand: Operand,
    },
    /// Value differs from the operand.
    NotEquals {
        /// Name of the value under test.
        field: String,
        /// Comparison operand.
        operand: Operand,
    },
    /// Value contains the operand (substring or array membership).
    Contains {
        /// Name of the value under test.
        field: String,
        /// Comparison operand.
        operand: Operand,
    },
    /// Value orders strictly greater than the operand.
    GreaterThan {
        /// Name of the value under test.
        field: String,
        /// Comparison operand.
        operand: Operand,
    },
    /// Value orders greater than or equal to the operand.
    GreaterOrEqual {
        /// Name of the value under test.
        field: String,
        /// Comparison operand.
        operand: Operand,
    },
    /// Value orders strictly less than the operand.
    LessThan {
        /// Name of the value under test.
        field: String,
        /// Comparison operand.
        operand: Operand,
    },
    /// Value orders less than or equal to the operand.
    LessOrEqual {
        /// Name of the value under test.
        field: String,
        /// Comparison operand.
        operand: Operand,
    },
    /// Value is absent or empty.
    IsEmpty {
        /// Name of the value under test.
        field: String,
    },
    /// Value is present and non-empty.
    NotEmpty {
        /// Name of the value under test.
        field: String,
    },
    /// Every child condition holds.
    All {
        /// Child conditions.
        conditions: Vec<Condition>,
    },
    /// At least one child condition holds.
    Any {
        /// Child conditions.
        conditions: Vec<Condition>,
    },
    /// Child condition does not hold.
    Not {
        /// Negated condition.
        condition: Box<Condition>,
    },
}

impl Condition {
    /// Evaluates the condition against the lookup.
    #[must_use]
    pub fn eval(&self, lookup: &impl ValueLookup) -> TriState {
        match self {
            Self::Equals {
                field,
                operand,
            } => Self::eval_leaf(lookup, field, operand, compare_equality),
            Self::NotEquals {
                field,
                operand,
            } => Self::eval_leaf(lookup, field, operand, compare_equality).negate(),
            Self::Contains {
                field,
                operand,
            } => Self::eval_leaf(lookup, field, operand, contains_value),
            Self::GreaterThan {
                field,
                operand,
            } => Self::eval_ordering(lookup, field, operand, |ordering| ordering.is_gt()),
            Self::GreaterOrEqual {
                field,
                operand,
            } => Self::eval_ordering(lookup, field, operand, |ordering| ordering.is_ge()),
            Self::LessThan {
                field,
                operand,
            } => Self::eval_ordering(lookup, field, operand, |ordering| ordering.is_lt()),
            Self::LessOrEqual {
                field,
                operand,
            } => Self::eval_ordering(lookup, field, operand, |ordering| ordering.is_le()),
            Self::IsEmpty {
                field,
            } => TriState::from(lookup.value(field).is_none_or(|value| is_empty_value(&value))),
            Self::NotEmpty {
                field,
            } => TriState::from(lookup.value(field).is_some_and(|value| !is_empty_value(&value))),
            Self::All {
                conditions,
            } => TriState::all(conditions.iter().map(|condition| condition.eval(lookup))),
            Self::Any {
                conditions,
            } => TriState::any(conditions.iter().map(|condition| condition.eval(lookup))),
            Self::Not {
                condition,
            } => condition.eval(lookup).negate(),
        }
    }

    /// Evaluates a comparison leaf with the given value comparator.
    fn eval_leaf(
        lookup: &impl ValueLookup,
        field: &str,
        operand: &Operand,
        compare: impl Fn(&Value, &Value) -> TriState,
    ) -> TriState {
        let Some(left) = lookup.value(field) else {
            return TriState::Unknown;
        };
        let Some(right) = operand.resolve(lookup) else {
            return TriState::Unknown;
        };
        compare(&left, &right)
    }

    /// Evaluates an ordering leaf with the given ordering predicate.
    fn eval_ordering(
        lookup: &impl ValueLookup,
        field: &str,
        operand: &Operand,
        accept: impl Fn(std::cmp::Ordering) -> bool,
    ) -> TriState {
        let Some(left) = lookup.value(field) else {
            return TriState::Unknown;
        };
        let Some(right) = operand.resolve(lookup) else {
            return TriState::Unknown;
        };
        compare_ordering(&left, &right).map_or(TriState::Unknown, |ordering| {
            TriState::from(accept(ordering))
        })
    }

    /// Collects every value name the condition references.
    #[must_use]
    pub fn referenced_fields(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_fields(&mut names);
        names
    }

    /// Accumulates referenced names into the provided set.
    fn collect_fields(&self, names: &mut BTreeSet<String>) {
        match self {
            Self::Equals {
                field,
                operand,
            }
            | Self::NotEquals {
                field,
                operand,
            }
            | Self::Contains {
                field,
                operand,
            }
            | Self::GreaterThan {
                field,
                operand,
            }
            | Self::GreaterOrEqual {
                field,
                operand,
            }
            | Self::LessThan {
                field,
                operand,
            }
            | Self::LessOrEqual {
                field,
                operand,
            } => {
                names.insert(field.clone());
                if let Operand::Field(name) = operand {
                    names.insert(name.clone());
                }
            }
            Self::IsEmpty {
                field,
            }
            | Self::NotEmpty {
                field,
            } => {
                names.insert(field.clone());
            }
            Self::All {
                conditions,
            }
            | Self::Any {
                conditions,
            } => {
                for condition in conditions {
                    condition.collect_fields(names);
                }
            }
            Self::Not {
                condition,
            } => condition.collect_fields(names),
        }
    }

    /// Validates structural limits on the tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError`] when a group is empty or the tree exceeds
    /// the nesting limit.
    pub fn validate(&self) -> Result<(), ConditionError> {
        self.validate_at_depth(1)
    }

    /// Validates the tree from the given depth.
    fn validate_at_depth(&self, depth: usize) -> Result<(), ConditionError> {
        if depth > MAX_CONDITION_NESTING {
            return Err(ConditionError::NestingTooDeep {
                max_depth: MAX_CONDITION_NESTING,
            });
        }
        match self {
            Self::All {
                conditions,
            }
            | Self::Any {
                conditions,
            } => {
                if conditions.is_empty() {
                    return Err(ConditionError::EmptyGroup);
                }
                for condition in conditions {
                    condition.validate_at_depth(depth + 1)?;
                }
                Ok(())
            }
            Self::Not {
                condition,
            } => condition.validate_at_depth(depth + 1),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Structural validation failures for condition trees.
///
/// # Invariants
/// - None. Variants capture structured validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionError {
    /// An `all`/`any` group has no children.
    EmptyGroup,
    /// The tree exceeds the nesting limit.
    NestingTooDeep {
        /// Maximum allowed nesting depth.
        max_depth: usize,
    },
}

impl fmt::Display for ConditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGroup => write!(f, "condition group has no children"),
            Self::NestingTooDeep {
                max_depth,
            } => {
                write!(f, "condition nesting exceeds limit (max {max_depth})")
            }
        }
    }
}

impl std::error::Error for ConditionError {}
