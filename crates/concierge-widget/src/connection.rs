//! Connection Manager
//!
//! Maintains one logical chat session over a WebSocket that may drop at any
//! time. Reconnection is indefinite with exponential backoff; only
//! [`ConnectionManager::destroy`] stops it.
//!
//! ```text
//! Idle -> Connecting -> Open -> Closed -> Reconnecting -> Connecting -> ...
//!                        any state -> Destroyed (terminal)
//! ```

pub mod backoff;
pub mod manager;
pub mod transport;

pub use backoff::{Backoff, ReconnectPolicy};
pub use manager::{socket_base_url, ConnectionManager};
pub use transport::{ConnectionEvent, Connector, Transport, TransportEvents, WsConnector};

use crate::protocol::ChatMessage;
use crate::session::{Session, VerificationStatus};

/// Lifecycle of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected
    Idle,
    /// Handshake in progress
    Connecting,
    /// Transport open
    Open,
    /// Transport closed, reconnect not yet scheduled
    Closed,
    /// Waiting for the reconnect timer
    Reconnecting,
    /// Terminal; no further transitions
    Destroyed,
}

/// Receives inbound frames, one callback per frame type
pub trait FrameHandler {
    /// `session`: a session was established (token already persisted)
    fn on_session(&mut self, session: Session);

    /// `session_update`: partial session change
    fn on_session_update(&mut self, verification_status: Option<VerificationStatus>);

    /// `history`: replay of earlier messages
    fn on_history(&mut self, messages: Vec<ChatMessage>);

    /// `message`: live message
    fn on_message(&mut self, message: ChatMessage);

    /// `error`: server error for the guest
    fn on_error(&mut self, message: String, code: Option<String>);

    /// `pong`: heartbeat acknowledgement
    fn on_pong(&mut self) {}

    /// Transport closed
    fn on_disconnected(&mut self);
}
