// crates/formforge-core/src/runtime/mod.rs
// ============================================================================
// Module: FormForge Runtime
// Description: Store, engines, navigator, registries, and timer driver.
// Purpose: Provide the executable half of the form engine over the core types.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime wires the core types into a working engine: the single-owner
//! state store, the validation and suggestion engines, the background job
//! tracker, the page navigator with render views, the string-keyed
//! registries, and the tokio timer driver. The session facade composes them
//! for hosts that want one object.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod driver;
pub mod jobs;
pub mod navigator;
pub mod registry;
pub mod session;
pub mod store;
pub mod suggest;
pub mod validate;
pub mod visibility;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use driver::TimerDriver;
pub use driver::wall_clock;
pub use jobs::JobTracker;
pub use navigator::FieldView;
pub use navigator::FormNavigator;
pub use navigator::FormProgress;
pub use navigator::NavigationOutcome;
pub use navigator::PageView;
pub use navigator::SubmitOutcome;
pub use registry::CustomCheckRegistry;
pub use registry::FieldTypeHandler;
pub use registry::FieldTypeRegistry;
pub use session::FormSession;
pub use store::FormStateStore;
pub use suggest::SuggestionEngine;
pub use validate::ValidationEngine;
pub use visibility::ValuesLookup;
pub use visibility::field_visible;
pub use visibility::page_visible;
pub use visibility::visible_fields;
