//! Action Registry and action protocol
//!
//! Actions are declared by the backend: an id, a form (fields with optional
//! conditional visibility) and whether the guest must be verified first.

pub mod client;
pub mod registry;
pub mod types;

pub use client::{ActionBackend, HttpActionBackend};
pub use registry::ActionRegistry;
pub use types::{
    ActionDefinition, ActionField, ActionList, ActionResult, FieldOption, FieldType, FlowContext,
    NextStep, ShowWhen, TERMINAL_ERRORS,
};
