//! Chat WebSocket protocol definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::session::VerificationStatus;

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The guest using the widget
    Guest,
    /// The AI assistant
    Assistant,
    /// A staff member who took over the conversation
    Staff,
    /// Runtime or server notice
    System,
}

/// One chat message, live or replayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-assigned message id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Author
    pub role: MessageRole,
    /// Message text
    pub content: String,
    /// Server timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Action id the assistant wants the widget to start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Suggested short replies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<String>,
}

/// Frame sent by the widget
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Guest chat message
    Message {
        /// Message text
        content: String,
    },
    /// Keepalive
    Ping,
}

/// Frame received from the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Session established (first frame after every open)
    #[serde(rename_all = "camelCase")]
    Session {
        /// Opaque token to persist for reconnects
        token: String,
        /// Server-side session id
        session_id: String,
        /// Current verification status
        #[serde(default)]
        verification_status: VerificationStatus,
        /// Whether the server resumed an existing conversation
        #[serde(default)]
        restored: bool,
    },
    /// Partial session change
    #[serde(rename_all = "camelCase")]
    SessionUpdate {
        /// New verification status, when it changed
        #[serde(default)]
        verification_status: Option<VerificationStatus>,
    },
    /// Replay of earlier messages after (re)connect
    History {
        /// Messages in server order
        #[serde(default)]
        messages: Vec<ChatMessage>,
    },
    /// Live message
    Message(ChatMessage),
    /// Server-side error for the guest
    Error {
        /// Human-readable text
        message: String,
        /// Machine-readable code
        #[serde(default)]
        code: Option<String>,
    },
    /// Heartbeat acknowledgement
    Pong,
}

impl InboundFrame {
    /// Wire name of the frame type
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            InboundFrame::Session { .. } => "session",
            InboundFrame::SessionUpdate { .. } => "session_update",
            InboundFrame::History { .. } => "history",
            InboundFrame::Message(_) => "message",
            InboundFrame::Error { .. } => "error",
            InboundFrame::Pong => "pong",
        }
    }
}

const KNOWN_TYPES: [&str; 6] = [
    "session",
    "session_update",
    "history",
    "message",
    "error",
    "pong",
];

/// Decode one text frame
///
/// Distinguishes a frame of unknown type from a frame that is broken, so the
/// dispatcher can log them differently.
pub fn parse_frame(text: &str) -> Result<InboundFrame, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or(ProtocolError::MissingType)?;

    if !KNOWN_TYPES.contains(&kind) {
        return Err(ProtocolError::UnknownType(kind.to_string()));
    }

    serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Encode one outbound frame
pub fn encode_frame(frame: &OutboundFrame) -> Result<String, ProtocolError> {
    serde_json::to_string(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests;
