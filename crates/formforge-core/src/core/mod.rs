// crates/formforge-core/src/core/mod.rs
// ============================================================================
// Module: FormForge Core Types
// Description: Canonical schema, state, and lifecycle structures.
// Purpose: Provide stable, serializable types for the form engine.
// Dependencies: serde, when-logic
// ============================================================================

//! ## Overview
//! FormForge core types define the schema model, field values, validation
//! outcomes, suggestion states, history entries, background jobs, and
//! configuration. These types are the canonical source of truth for any
//! derived host surface.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod config;
pub mod event;
pub mod history;
pub mod identifiers;
pub mod job;
pub mod schema;
pub mod state;
pub mod suggestion;
pub mod time;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::EngineConfig;
pub use event::EngineEvent;
pub use history::HistoryEntry;
pub use history::HistoryKind;
pub use identifiers::CheckId;
pub use identifiers::FieldName;
pub use identifiers::FieldType;
pub use identifiers::JobId;
pub use identifiers::PageId;
pub use identifiers::RuleId;
pub use identifiers::SchemaVersion;
pub use job::BackgroundJob;
pub use job::JobDescriptor;
pub use job::JobStatus;
pub use job::JobUpdate;
pub use schema::CrossFieldRule;
pub use schema::FieldSpec;
pub use schema::PageSpec;
pub use schema::RemoteCheckSpec;
pub use schema::Schema;
pub use schema::SuggestSpec;
pub use schema::ValidationSpec;
pub use state::FieldChange;
pub use state::FormMetadata;
pub use state::ValueSource;
pub use suggestion::ActiveValue;
pub use suggestion::SuggestionResult;
pub use suggestion::SuggestionState;
pub use suggestion::SuggestionStatus;
pub use time::Timestamp;
pub use validation::RemoteOutcome;
pub use validation::Severity;
pub use validation::ValidationOutcome;
