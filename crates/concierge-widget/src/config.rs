//! Widget configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::connection::ReconnectPolicy;
use crate::error::{Error, Result};
use crate::ui::WidgetStrings;

/// Runtime configuration of one widget mount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Backend origin (`http://` or `https://`)
    pub origin: String,
    /// Path prefix of the REST endpoints (`""` or e.g. `/api/widget`)
    pub api_prefix: String,
    /// Path of the chat socket endpoint
    pub ws_path: String,
    /// Locale used for action definitions and built-in strings
    pub locale: String,
    /// Reconnect backoff
    pub reconnect: ReconnectPolicy,
    /// Interval between keepalive pings
    pub heartbeat_interval_ms: u64,
    /// Pause between a completed verification and the replayed action form
    pub verification_replay_delay_ms: u64,
    /// Action that verifies the guest
    pub verification_action_id: String,
    /// Timeout of REST requests
    pub request_timeout_ms: u64,
    /// Where the session token is persisted (platform data dir when unset)
    pub session_file: Option<PathBuf>,
    /// Override of the built-in strings
    pub strings: Option<WidgetStrings>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            api_prefix: String::new(),
            ws_path: "/ws/chat".to_string(),
            locale: "en".to_string(),
            reconnect: ReconnectPolicy::default(),
            heartbeat_interval_ms: 25_000,
            verification_replay_delay_ms: 300,
            verification_action_id: "verify-reservation".to_string(),
            request_timeout_ms: 15_000,
            session_file: None,
            strings: None,
        }
    }
}

impl WidgetConfig {
    /// Config for `origin` with every other value at its default
    #[must_use]
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Parsed origin
    pub fn origin_url(&self) -> Result<Url> {
        let url = Url::parse(&self.origin)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::Config(format!(
                "origin must be http or https, got '{other}'"
            ))),
        }
    }

    /// Absolute URL of a REST endpoint below `api_prefix`
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let origin = self.origin_url()?;
        let prefix = self.api_prefix.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(origin.join(&format!("{prefix}/{path}"))?)
    }

    /// Heartbeat interval
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Verification replay delay
    #[must_use]
    pub fn replay_delay(&self) -> Duration {
        Duration::from_millis(self.verification_replay_delay_ms)
    }

    /// REST request timeout
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Strings for the configured locale, honoring an explicit override
    #[must_use]
    pub fn strings(&self) -> WidgetStrings {
        self.strings
            .clone()
            .or_else(|| WidgetStrings::for_locale(&self.locale))
            .unwrap_or_default()
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<()> {
        self.origin_url()?;

        if self.reconnect.initial_delay_ms == 0 {
            return Err(Error::Config(
                "reconnect.initial_delay_ms must be positive".to_string(),
            ));
        }
        if !self.reconnect.multiplier.is_finite() || self.reconnect.multiplier < 1.0 {
            return Err(Error::Config(
                "reconnect.multiplier must be at least 1.0".to_string(),
            ));
        }
        if self.reconnect.max_delay_ms < self.reconnect.initial_delay_ms {
            return Err(Error::Config(
                "reconnect.max_delay_ms must not be below initial_delay_ms".to_string(),
            ));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(Error::Config(
                "heartbeat_interval_ms must be positive".to_string(),
            ));
        }
        if self.verification_action_id.trim().is_empty() {
            return Err(Error::Config(
                "verification_action_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
