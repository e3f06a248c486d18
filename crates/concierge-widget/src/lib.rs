//! Concierge Widget - embeddable guest chat runtime
//!
//! This crate provides the runtime behind the hotel concierge chat widget:
//! - A reconnecting WebSocket session with heartbeat and token persistence
//! - A cache of server-declared actions
//! - Identity-gated action workflows with multi-step forms
//! - A headless form model rendered through [`ui::UiCommand`]s

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod actions;
pub mod config;
pub mod connection;
pub mod error;
pub mod forms;
pub mod protocol;
pub mod scheduler;
pub mod session;
pub mod ui;
pub mod widget;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use actions::{ActionBackend, ActionDefinition, ActionRegistry, HttpActionBackend};
pub use config::WidgetConfig;
pub use connection::{ConnectionManager, ConnectionState, WsConnector};
pub use error::{Error, Result};
pub use forms::{FormModel, FormView};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, VerificationStatus};
pub use ui::{UiCommand, WidgetStrings};
pub use widget::{UserInput, Widget, WidgetHandle};
pub use workflow::{WorkflowEngine, WorkflowState};
