//! Error types for concierge-widget
//!
//! Every error the runtime can hit degrades to a message on the system
//! message channel; none of them is fatal to the host page.

use thiserror::Error;

use crate::ui::WidgetStrings;

/// Frame-level decoding failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is not valid JSON or does not match its declared shape
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Frame carries a `type` the runtime does not know
    #[error("unknown frame type: {0}")]
    UnknownType(String),

    /// Frame has no string `type` field
    #[error("frame has no type field")]
    MissingType,
}

/// Widget runtime error type
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure (connection refused, timeout, reset)
    #[error("network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("http error: status {status}")]
    Http {
        /// HTTP status code
        status: u16,
    },

    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Inbound frame could not be decoded
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// An action was submitted without a live session token
    #[error("no active session")]
    NoSession,

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// Session token persistence failed
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Text shown to the guest on the system message channel
    #[must_use]
    pub fn user_message(&self, strings: &WidgetStrings) -> String {
        match self {
            Error::NoSession => strings.no_session.clone(),
            Error::Network(_) | Error::Http { .. } | Error::Decode(_) => {
                strings.submit_failed.clone()
            }
            Error::Protocol(_) | Error::Config(_) | Error::Storage(_) => {
                strings.generic_error.clone()
            }
        }
    }

    /// Whether the failure happened on the wire rather than in the backend's verdict
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Http { .. } | Error::Decode(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Error::Http {
                status: status.as_u16(),
            }
        } else {
            Error::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("invalid url: {err}"))
    }
}

#[cfg(test)]
mod tests;
