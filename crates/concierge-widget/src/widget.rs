//! Message and UI glue
//!
//! One [`Widget`] per embedded instance. It owns the connection manager, the
//! session and the workflow engine, and drives all of them from a single
//! loop, so no two handlers ever run at once.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::actions::{ActionBackend, ActionRegistry};
use crate::config::WidgetConfig;
use crate::connection::{ConnectionEvent, ConnectionManager, Connector, FrameHandler};
use crate::error::Result;
use crate::protocol::{ChatMessage, MessageRole};
use crate::session::{Session, SessionState, SessionStore, VerificationStatus};
use crate::ui::{UiCommand, UiReceiver, UiSender};
use crate::workflow::{WorkflowEngine, WorkflowEvent};

/// Input from the guest or the host page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    /// Send a chat message
    SendMessage(String),
    /// Send the quick reply at this index
    SelectQuickReply(usize),
    /// Edit a field of the visible form
    SetField {
        /// Field key
        key: String,
        /// New value
        value: String,
    },
    /// Submit the visible form
    SubmitForm,
    /// Cancel the active flow
    CancelForm,
    /// Switch locale
    SetLocale(String),
    /// Forget the session and start over anonymously
    ResetSession,
    /// Tear the widget down
    Destroy,
}

/// Cloneable handle the host uses to drive a running [`Widget`]
///
/// Every method returns `false` once the widget has stopped.
#[derive(Debug, Clone)]
pub struct WidgetHandle {
    tx: mpsc::UnboundedSender<UserInput>,
}

impl WidgetHandle {
    /// Queue raw input
    pub fn send(&self, input: UserInput) -> bool {
        self.tx.send(input).is_ok()
    }

    /// Send a chat message
    pub fn send_message(&self, content: impl Into<String>) -> bool {
        self.send(UserInput::SendMessage(content.into()))
    }

    /// Send a quick reply by index
    pub fn select_quick_reply(&self, index: usize) -> bool {
        self.send(UserInput::SelectQuickReply(index))
    }

    /// Edit a form field
    pub fn set_field(&self, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.send(UserInput::SetField {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Submit the visible form
    pub fn submit_form(&self) -> bool {
        self.send(UserInput::SubmitForm)
    }

    /// Cancel the active flow
    pub fn cancel_form(&self) -> bool {
        self.send(UserInput::CancelForm)
    }

    /// Switch locale
    pub fn set_locale(&self, locale: impl Into<String>) -> bool {
        self.send(UserInput::SetLocale(locale.into()))
    }

    /// Start a fresh anonymous session
    pub fn reset_session(&self) -> bool {
        self.send(UserInput::ResetSession)
    }

    /// Stop the widget
    pub fn destroy(&self) -> bool {
        self.send(UserInput::Destroy)
    }
}

/// State touched by inbound frames
struct WidgetCore {
    session: SessionState,
    engine: WorkflowEngine,
    ui: UiSender,
    quick_replies: Vec<String>,
    typing: bool,
}

impl WidgetCore {
    fn emit(&self, command: UiCommand) {
        let _ = self.ui.send(command);
    }

    fn system_message(&self, text: String) {
        self.emit(UiCommand::SystemMessage { text });
    }

    fn set_typing(&mut self, active: bool) {
        if self.typing != active {
            self.typing = active;
            self.emit(UiCommand::Typing { active });
        }
    }

    fn set_quick_replies(&mut self, replies: Vec<String>) {
        if self.quick_replies.is_empty() && replies.is_empty() {
            return;
        }
        self.quick_replies = replies.clone();
        self.emit(UiCommand::QuickReplies { replies });
    }
}

impl FrameHandler for WidgetCore {
    fn on_session(&mut self, session: Session) {
        let restored = session.restored;
        let verified = session.verification_status.is_verified();
        self.session.establish(session);
        self.emit(UiCommand::ConnectionStatus { connected: true });

        if restored {
            let text = self.engine.registry().strings().session_restored.clone();
            self.system_message(text);
        }
        // A reconnect can arrive already verified while the gate is up.
        if verified {
            self.engine.on_verification_complete();
        }
    }

    fn on_session_update(&mut self, verification_status: Option<VerificationStatus>) {
        let Some(status) = verification_status else {
            return;
        };
        if self.session.update_verification(status) {
            info!("Guest verified");
            self.engine.on_verification_complete();
        }
    }

    fn on_history(&mut self, messages: Vec<ChatMessage>) {
        debug!(count = messages.len(), "Replaying history");
        self.emit(UiCommand::History { messages });
    }

    fn on_message(&mut self, message: ChatMessage) {
        if message.role != MessageRole::Guest {
            self.set_typing(false);
            self.set_quick_replies(message.quick_replies.clone());
        }
        let action = message.action.clone();
        self.emit(UiCommand::Message { message });

        if let Some(action_id) = action {
            self.engine.handle_action_trigger(&action_id, &self.session);
        }
    }

    fn on_error(&mut self, message: String, code: Option<String>) {
        warn!(code = code.as_deref().unwrap_or(""), "Server error: {}", message);
        self.set_typing(false);
        let text = if message.is_empty() {
            self.engine.registry().strings().generic_error.clone()
        } else {
            message
        };
        self.system_message(text);
    }

    fn on_disconnected(&mut self) {
        self.set_typing(false);
        self.emit(UiCommand::ConnectionStatus { connected: false });
    }
}

/// A widget instance
pub struct Widget {
    connection: ConnectionManager,
    core: WidgetCore,
    connection_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    workflow_rx: mpsc::UnboundedReceiver<WorkflowEvent>,
    input_rx: mpsc::UnboundedReceiver<UserInput>,
}

impl Widget {
    /// Build a widget; nothing connects until [`Widget::run`]
    pub fn new(
        config: &WidgetConfig,
        connector: Arc<dyn Connector>,
        backend: Arc<dyn ActionBackend>,
        store: Arc<dyn SessionStore>,
    ) -> Result<(Self, WidgetHandle, UiReceiver)> {
        config.validate()?;

        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (connection_tx, connection_rx) = mpsc::unbounded_channel();
        let (workflow_tx, workflow_rx) = mpsc::unbounded_channel();
        let (input_tx, input_rx) = mpsc::unbounded_channel();

        let connection = ConnectionManager::new(config, connector, store, connection_tx)?;
        let registry = ActionRegistry::new(backend, config.locale.clone(), config.strings());
        let engine = WorkflowEngine::new(config, registry, ui_tx.clone(), workflow_tx);

        let widget = Self {
            connection,
            core: WidgetCore {
                session: SessionState::new(),
                engine,
                ui: ui_tx,
                quick_replies: Vec::new(),
                typing: false,
            },
            connection_rx,
            workflow_rx,
            input_rx,
        };
        Ok((widget, WidgetHandle { tx: input_tx }, ui_rx))
    }

    /// Connect and process events until destroyed or every handle is dropped
    pub async fn run(mut self) {
        self.start();
        loop {
            let keep_running = tokio::select! {
                Some(event) = self.connection_rx.recv() => {
                    self.on_connection_event(event);
                    true
                }
                Some(event) = self.workflow_rx.recv() => {
                    self.on_workflow_event(event);
                    true
                }
                input = self.input_rx.recv() => match input {
                    Some(input) => self.on_input(input),
                    None => false,
                },
            };
            if !keep_running {
                break;
            }
        }
        self.shutdown();
    }

    fn start(&mut self) {
        info!(locale = self.core.engine.registry().locale(), "Starting widget");
        self.connection.connect();
        self.core.engine.refresh_actions();
    }

    fn on_connection_event(&mut self, event: ConnectionEvent) {
        self.connection.handle_event(event, &mut self.core);
    }

    fn on_workflow_event(&mut self, event: WorkflowEvent) {
        self.core.engine.handle_event(event, &self.core.session);
    }

    /// Returns `false` when the widget should stop
    fn on_input(&mut self, input: UserInput) -> bool {
        match input {
            UserInput::SendMessage(content) => self.send_message(content),
            UserInput::SelectQuickReply(index) => {
                match self.core.quick_replies.get(index).cloned() {
                    Some(reply) => self.send_message(reply),
                    None => debug!(index, "No quick reply at index"),
                }
            }
            UserInput::SetField { key, value } => {
                if let Err(e) = self.core.engine.set_field(&key, &value) {
                    debug!(error = %e, "Rejected field edit");
                }
            }
            UserInput::SubmitForm => self.core.engine.submit(&self.core.session),
            UserInput::CancelForm => self.core.engine.cancel(),
            UserInput::SetLocale(locale) => self.core.engine.set_locale(&locale),
            UserInput::ResetSession => {
                info!("Resetting session");
                self.core.engine.cancel();
                self.core.session.clear();
                self.core.set_typing(false);
                self.core.set_quick_replies(Vec::new());
                self.connection.reset_session();
            }
            UserInput::Destroy => return false,
        }
        true
    }

    fn send_message(&mut self, content: String) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        if self.connection.send_message(content) {
            self.core.set_quick_replies(Vec::new());
            self.core.set_typing(true);
        }
    }

    fn shutdown(&mut self) {
        self.connection.destroy();
        self.core.engine.destroy();
        self.core.session.clear();
        info!("Widget destroyed");
    }
}

#[cfg(test)]
mod tests;
