// crates/formforge-core/src/runtime/registry.rs
// ============================================================================
// Module: FormForge Type and Check Registries
// Description: String-keyed dispatch tables for field types and custom checks.
// Purpose: Keep the field type set open while dispatching behavior by key.
// Dependencies: crate::{core, interfaces}, serde_json, when-logic
// ============================================================================

//! ## Overview
//! Field types are open strings, not a closed enum. The type registry maps a
//! type key to a handler supplying type-aware behavior (emptiness, numeric
//! coercion hints); unknown keys resolve to a fallback handler so a schema
//! authored against a newer widget set degrades gracefully instead of
//! failing the whole form. The check registry plays the same role for named
//! synchronous validation callbacks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use when_logic::is_empty_value;

use crate::core::FieldType;
use crate::interfaces::CallContext;

// ============================================================================
// SECTION: Field Type Handlers
// ============================================================================

/// Type-aware behavior for one field type key.
pub trait FieldTypeHandler: Send + Sync {
    /// Returns true when the value counts as unanswered for required checks.
    fn is_empty(&self, value: &Value) -> bool {
        is_empty_value(value)
    }

    /// Returns true when values of this type are numeric and should accept
    /// range checks.
    fn numeric(&self) -> bool {
        false
    }
}

/// Handler for free-text types.
struct TextHandler;

impl FieldTypeHandler for TextHandler {}

/// Handler for numeric types.
struct NumberHandler;

impl FieldTypeHandler for NumberHandler {
    fn numeric(&self) -> bool {
        true
    }
}

/// Handler for checkbox types; an explicit `false` is an answer.
struct CheckboxHandler;

impl FieldTypeHandler for CheckboxHandler {
    fn is_empty(&self, value: &Value) -> bool {
        value.is_null()
    }
}

/// Fallback handler for unknown type keys.
struct OpaqueHandler;

impl FieldTypeHandler for OpaqueHandler {}

// ============================================================================
// SECTION: Field Type Registry
// ============================================================================

/// Dispatch table from type key to handler.
///
/// # Invariants
/// - Lookups never fail; unknown keys resolve to the fallback handler.
pub struct FieldTypeRegistry {
    /// Registered handlers by type key.
    handlers: BTreeMap<String, Arc<dyn FieldTypeHandler>>,
    /// Handler used for unknown keys.
    fallback: Arc<dyn FieldTypeHandler>,
}

impl FieldTypeRegistry {
    /// Creates a registry pre-populated with the built-in widget types.
    #[must_use]
    pub fn new() -> Self {
        let text: Arc<dyn FieldTypeHandler> = Arc::new(TextHandler);
        let number: Arc<dyn FieldTypeHandler> = Arc::new(NumberHandler);
        let checkbox: Arc<dyn FieldTypeHandler> = Arc::new(CheckboxHandler);

        let mut handlers: BTreeMap<String, Arc<dyn FieldTypeHandler>> = BTreeMap::new();
        for key in ["text", "textarea", "email", "phone", "url", "date", "select", "radio", "file"]
        {
            handlers.insert(key.to_string(), Arc::clone(&text));
        }
        for key in ["number", "slider", "rating"] {
            handlers.insert(key.to_string(), Arc::clone(&number));
        }
        handlers.insert("checkbox".to_string(), Arc::clone(&checkbox));
        handlers.insert("multiselect".to_string(), Arc::clone(&text));

        Self {
            handlers,
            fallback: Arc::new(OpaqueHandler),
        }
    }

    /// Registers or replaces the handler for a type key.
    pub fn register(&mut self, key: impl Into<String>, handler: Arc<dyn FieldTypeHandler>) {
        self.handlers.insert(key.into(), handler);
    }

    /// Resolves the handler for a type key, falling back for unknown keys.
    #[must_use]
    pub fn handler(&self, field_type: &FieldType) -> Arc<dyn FieldTypeHandler> {
        self.handlers
            .get(field_type.as_str())
            .map_or_else(|| Arc::clone(&self.fallback), Arc::clone)
    }

    /// Returns true when the type key has a registered handler.
    #[must_use]
    pub fn is_known(&self, field_type: &FieldType) -> bool {
        self.handlers.contains_key(field_type.as_str())
    }
}

impl Default for FieldTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Custom Check Registry
// ============================================================================

/// Named synchronous check callback.
///
/// Returns `Ok(())` on pass and a user-facing message on failure.
pub type CustomCheck = dyn Fn(&Value, &CallContext) -> Result<(), String> + Send + Sync;

/// Dispatch table from check name to synchronous callback.
///
/// # Invariants
/// - Unresolved names are skipped by the validation engine, with a
///   diagnostic event.
#[derive(Default)]
pub struct CustomCheckRegistry {
    /// Registered checks by name.
    checks: BTreeMap<String, Arc<CustomCheck>>,
}

impl CustomCheckRegistry {
    /// Creates an empty check registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a named check.
    pub fn register<F>(&mut self, name: impl Into<String>, check: F)
    where
        F: Fn(&Value, &CallContext) -> Result<(), String> + Send + Sync + 'static,
    {
        self.checks.insert(name.into(), Arc::new(check));
    }

    /// Resolves a named check.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<CustomCheck>> {
        self.checks.get(name).map(Arc::clone)
    }
}
