//! Transport seam between the connection manager and the socket
//!
//! A [`Connector`] opens one [`Transport`] per connect attempt and reports its
//! lifecycle through [`TransportEvents`], stamped with the attempt's
//! generation. The manager ignores events from any generation but the current
//! one, which is how a torn-down transport is detached from its handlers.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// Event delivered to the connection manager's loop
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// Transport handshake finished
    Opened {
        /// Connect attempt
        generation: u64,
    },
    /// Text frame received
    Frame {
        /// Connect attempt
        generation: u64,
        /// Raw frame text
        text: String,
    },
    /// Transport closed (after an error, a close frame, or a failed handshake)
    Closed {
        /// Connect attempt
        generation: u64,
        /// Close reason sent by the peer
        reason: Option<String>,
    },
    /// Transport-level error; always followed by `Closed`
    Failed {
        /// Connect attempt
        generation: u64,
        /// Error text
        error: String,
    },
    /// Heartbeat timer fired
    Heartbeat {
        /// Connect attempt
        generation: u64,
    },
    /// Reconnect timer fired
    ReconnectDue {
        /// Connect attempt that closed
        generation: u64,
    },
}

impl ConnectionEvent {
    /// Connect attempt the event belongs to
    #[must_use]
    pub fn generation(&self) -> u64 {
        match self {
            ConnectionEvent::Opened { generation }
            | ConnectionEvent::Frame { generation, .. }
            | ConnectionEvent::Closed { generation, .. }
            | ConnectionEvent::Failed { generation, .. }
            | ConnectionEvent::Heartbeat { generation }
            | ConnectionEvent::ReconnectDue { generation } => *generation,
        }
    }
}

/// Reporter handed to a transport for one connect attempt
#[derive(Debug, Clone)]
pub struct TransportEvents {
    generation: u64,
    tx: mpsc::UnboundedSender<ConnectionEvent>,
}

impl TransportEvents {
    /// Create a reporter for `generation`
    #[must_use]
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<ConnectionEvent>) -> Self {
        Self { generation, tx }
    }

    /// Connect attempt this reporter belongs to
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report a finished handshake
    pub fn opened(&self) {
        self.emit(ConnectionEvent::Opened {
            generation: self.generation,
        });
    }

    /// Report an inbound text frame
    pub fn frame(&self, text: impl Into<String>) {
        self.emit(ConnectionEvent::Frame {
            generation: self.generation,
            text: text.into(),
        });
    }

    /// Report a transport error
    pub fn failed(&self, error: impl Into<String>) {
        self.emit(ConnectionEvent::Failed {
            generation: self.generation,
            error: error.into(),
        });
    }

    /// Report the close
    pub fn closed(&self, reason: Option<String>) {
        self.emit(ConnectionEvent::Closed {
            generation: self.generation,
            reason,
        });
    }

    fn emit(&self, event: ConnectionEvent) {
        // Receiver gone means the widget was dropped; nothing left to notify.
        let _ = self.tx.send(event);
    }
}

/// One live socket
pub trait Transport: Send {
    /// Queue a text frame for sending
    fn send(&mut self, text: String) -> Result<()>;

    /// Close the socket; no further events are required after this
    fn close(&mut self);
}

/// Opens transports
pub trait Connector: Send + Sync {
    /// Start connecting to `url`; the outcome arrives through `events`
    fn open(&self, url: Url, events: TransportEvents) -> Box<dyn Transport>;
}

/// WebSocket connector backed by tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, url: Url, events: TransportEvents) -> Box<dyn Transport> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(run_socket(url, events, outbound_rx, cancel.clone()));
        Box::new(WsTransport {
            outbound: outbound_tx,
            cancel,
        })
    }
}

struct WsTransport {
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl Transport for WsTransport {
    fn send(&mut self, text: String) -> Result<()> {
        self.outbound
            .send(text)
            .map_err(|_| Error::Network("socket task has ended".to_string()))
    }

    fn close(&mut self) {
        self.cancel.cancel();
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_socket(
    url: Url,
    events: TransportEvents,
    mut outbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    let connected = tokio::select! {
        _ = cancel.cancelled() => return,
        result = connect_async(url.as_str()) => result,
    };

    let stream = match connected {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!(generation = events.generation(), error = %e, "WebSocket connect failed");
            events.failed(e.to_string());
            events.closed(None);
            return;
        }
    };

    events.opened();
    let (mut write, mut read) = stream.split();

    let reason = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                debug!(generation = events.generation(), "WebSocket closed locally");
                return;
            }
            out = outbound.recv() => match out {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        events.failed(e.to_string());
                        break None;
                    }
                }
                None => break None,
            },
            inbound = read.next() => match inbound {
                Some(Ok(Message::Text(text))) => events.frame(text),
                Some(Ok(Message::Close(frame))) => {
                    break frame.map(|f| f.reason.to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(generation = events.generation(), error = %e, "WebSocket error");
                    events.failed(e.to_string());
                    break None;
                }
                None => break None,
            },
        }
    };

    events.closed(reason);
}
