// crates/formforge-core/src/lib.rs
// ============================================================================
// Module: FormForge Core Library
// Description: Public API surface for the FormForge engine.
// Purpose: Expose core types, interfaces, and runtime components.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! FormForge core provides a schema-driven form state and validation engine:
//! a single-owner state store with dirty tracking and undo history, a
//! validation pipeline with debounced and cached remote checks, a dual-value
//! suggestion system with confidence gating and expiry, a background job
//! tracker with anticipatory loading states, and a gated page navigator. It
//! is host-agnostic and integrates through explicit interfaces rather than
//! embedding into a UI framework.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::BulkSuggestRequest;
pub use interfaces::BulkSuggestResponse;
pub use interfaces::CallContext;
pub use interfaces::Collaborators;
pub use interfaces::DraftError;
pub use interfaces::DraftSink;
pub use interfaces::EventSink;
pub use interfaces::JobFeed;
pub use interfaces::JobFeedError;
pub use interfaces::MemoryEventSink;
pub use interfaces::NullDraftSink;
pub use interfaces::NullEventSink;
pub use interfaces::NullJobFeed;
pub use interfaces::NullObserver;
pub use interfaces::NullRemoteValidator;
pub use interfaces::NullSubmissionSink;
pub use interfaces::NullSuggestionProvider;
pub use interfaces::RemoteCheckError;
pub use interfaces::RemoteValidator;
pub use interfaces::StateObserver;
pub use interfaces::SubmissionSink;
pub use interfaces::SubmitError;
pub use interfaces::SuggestError;
pub use interfaces::SuggestionProvider;
pub use runtime::CustomCheckRegistry;
pub use runtime::FieldTypeHandler;
pub use runtime::FieldTypeRegistry;
pub use runtime::FieldView;
pub use runtime::FormNavigator;
pub use runtime::FormProgress;
pub use runtime::FormSession;
pub use runtime::FormStateStore;
pub use runtime::JobTracker;
pub use runtime::NavigationOutcome;
pub use runtime::PageView;
pub use runtime::SubmitOutcome;
pub use runtime::SuggestionEngine;
pub use runtime::TimerDriver;
pub use runtime::ValidationEngine;
pub use runtime::wall_clock;
