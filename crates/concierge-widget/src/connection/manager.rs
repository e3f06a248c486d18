//! Connection manager: one logical session over a reconnecting socket

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use super::backoff::Backoff;
use super::transport::{ConnectionEvent, Connector, Transport, TransportEvents};
use super::{ConnectionState, FrameHandler};
use crate::config::WidgetConfig;
use crate::error::{Error, Result};
use crate::protocol::{encode_frame, parse_frame, InboundFrame, OutboundFrame};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::session::{Session, SessionStore};

/// Owns the transport, its timers and the reconnect policy
///
/// Driven from a single loop: every transport event and timer tick arrives as
/// a [`ConnectionEvent`] and is handled by [`ConnectionManager::handle_event`].
pub struct ConnectionManager {
    socket_base: Url,
    heartbeat_interval: Duration,
    connector: Arc<dyn Connector>,
    store: Arc<dyn SessionStore>,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    scheduler: Scheduler<ConnectionEvent>,
    state: ConnectionState,
    backoff: Backoff,
    generation: u64,
    transport: Option<Box<dyn Transport>>,
    heartbeat: Option<TaskHandle>,
    reconnect: Option<TaskHandle>,
}

impl ConnectionManager {
    /// Create a manager; nothing is opened until [`ConnectionManager::connect`]
    pub fn new(
        config: &WidgetConfig,
        connector: Arc<dyn Connector>,
        store: Arc<dyn SessionStore>,
        events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Result<Self> {
        config.validate()?;
        let socket_base = socket_base_url(&config.origin_url()?, &config.ws_path)?;
        Ok(Self {
            socket_base,
            heartbeat_interval: config.heartbeat_interval(),
            connector,
            store,
            scheduler: Scheduler::new(events_tx.clone()),
            events_tx,
            state: ConnectionState::Idle,
            backoff: Backoff::new(config.reconnect.clone()),
            generation: 0,
            transport: None,
            heartbeat: None,
            reconnect: None,
        })
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the transport is open
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Delay the next unplanned close would wait before reconnecting
    #[must_use]
    pub fn current_delay(&self) -> Duration {
        self.backoff.current()
    }

    /// Number of timers that can still fire
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        [self.heartbeat.as_ref(), self.reconnect.as_ref()]
            .into_iter()
            .flatten()
            .filter(|t| t.is_pending())
            .count()
    }

    /// URL the next connect attempt will use (carries the stored token)
    #[must_use]
    pub fn socket_url(&self) -> Url {
        let mut url = self.socket_base.clone();
        if let Some(token) = self.store.load() {
            url.query_pairs_mut().append_pair("token", &token);
        }
        url
    }

    /// Open a fresh transport, tearing down any previous one and its timers
    pub fn connect(&mut self) {
        if self.state == ConnectionState::Destroyed {
            warn!("connect() called on a destroyed connection manager");
            return;
        }

        self.teardown();
        self.generation += 1;
        self.state = ConnectionState::Connecting;

        let url = self.socket_url();
        info!(
            generation = self.generation,
            endpoint = %self.socket_base,
            "Connecting chat socket"
        );
        let events = TransportEvents::new(self.generation, self.events_tx.clone());
        self.transport = Some(self.connector.open(url, events));
    }

    /// Forget the stored token and start a new anonymous session
    pub fn reset_session(&mut self) {
        self.store.clear();
        self.connect();
    }

    /// Send a frame; no-op unless the transport is open
    pub fn send(&mut self, frame: &OutboundFrame) -> bool {
        if self.state != ConnectionState::Open {
            debug!(state = ?self.state, "Dropping outbound frame, socket not open");
            return false;
        }
        let Some(transport) = self.transport.as_mut() else {
            return false;
        };

        let text = match encode_frame(frame) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to encode outbound frame");
                return false;
            }
        };

        match transport.send(text) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to send frame");
                false
            }
        }
    }

    /// Send a guest chat message
    pub fn send_message(&mut self, content: impl Into<String>) -> bool {
        self.send(&OutboundFrame::Message {
            content: content.into(),
        })
    }

    /// Stop for good: cancel timers and close without reconnecting
    pub fn destroy(&mut self) {
        if self.state == ConnectionState::Destroyed {
            return;
        }
        // Bumping the generation detaches the old transport's close event
        // before the close is requested.
        self.generation += 1;
        self.teardown();
        self.state = ConnectionState::Destroyed;
        info!("Connection manager destroyed");
    }

    /// Handle one event from the transport or a timer
    pub fn handle_event(&mut self, event: ConnectionEvent, handler: &mut dyn FrameHandler) {
        if self.state == ConnectionState::Destroyed || event.generation() != self.generation {
            debug!(
                generation = event.generation(),
                current = self.generation,
                "Ignoring stale connection event"
            );
            return;
        }

        match event {
            ConnectionEvent::Opened { .. } => self.on_open(),
            ConnectionEvent::Frame { text, .. } => self.dispatch(&text, handler),
            ConnectionEvent::Failed { error, .. } => {
                // The close that follows drives reconnection.
                debug!(error = %error, "Transport error");
            }
            ConnectionEvent::Closed { reason, .. } => self.on_close(reason, handler),
            ConnectionEvent::Heartbeat { .. } => {
                if self.is_connected() {
                    self.send(&OutboundFrame::Ping);
                }
            }
            ConnectionEvent::ReconnectDue { .. } => {
                if self.state == ConnectionState::Reconnecting {
                    self.connect();
                }
            }
        }
    }

    fn on_open(&mut self) {
        info!(generation = self.generation, "Chat socket open");
        self.state = ConnectionState::Open;
        self.backoff.reset();

        let generation = self.generation;
        self.heartbeat = Some(
            self.scheduler
                .repeating(self.heartbeat_interval, move || ConnectionEvent::Heartbeat {
                    generation,
                }),
        );
    }

    fn on_close(&mut self, reason: Option<String>, handler: &mut dyn FrameHandler) {
        self.heartbeat = None;
        self.transport = None;
        self.state = ConnectionState::Closed;
        handler.on_disconnected();

        let delay = self.backoff.next_delay();
        info!(
            generation = self.generation,
            delay_ms = delay.as_millis() as u64,
            reason = reason.as_deref().unwrap_or(""),
            "Chat socket closed, scheduling reconnect"
        );
        self.reconnect = Some(self.scheduler.once(
            delay,
            ConnectionEvent::ReconnectDue {
                generation: self.generation,
            },
        ));
        self.state = ConnectionState::Reconnecting;
    }

    fn dispatch(&mut self, text: &str, handler: &mut dyn FrameHandler) {
        let frame = match parse_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "Dropping inbound frame");
                return;
            }
        };
        debug!(frame_type = frame.kind(), "Inbound frame");

        match frame {
            InboundFrame::Session {
                token,
                session_id,
                verification_status,
                restored,
            } => {
                self.store.save(&token);
                handler.on_session(Session {
                    token,
                    session_id,
                    verification_status,
                    restored,
                });
            }
            InboundFrame::SessionUpdate {
                verification_status,
            } => handler.on_session_update(verification_status),
            InboundFrame::History { messages } => handler.on_history(messages),
            InboundFrame::Message(message) => handler.on_message(message),
            InboundFrame::Error { message, code } => handler.on_error(message, code),
            InboundFrame::Pong => handler.on_pong(),
        }
    }

    fn teardown(&mut self) {
        self.reconnect = None;
        self.heartbeat = None;
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Map the configured origin onto the socket endpoint (`http`→`ws`, `https`→`wss`)
pub fn socket_base_url(origin: &Url, ws_path: &str) -> Result<Url> {
    let scheme = match origin.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::Config(format!(
                "unsupported origin scheme '{other}', expected http or https"
            )))
        }
    };

    let mut url = origin.join(ws_path)?;
    url.set_scheme(scheme)
        .map_err(|_| Error::Config(format!("cannot derive socket url from {origin}")))?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
