//! Reconnect delay with exponential backoff

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for reconnect behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect, and after every successful open
    pub initial_delay_ms: u64,
    /// Growth factor applied after each unplanned close
    pub multiplier: f64,
    /// Upper bound for the delay
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            multiplier: 1.5,
            max_delay_ms: 15_000,
        }
    }
}

impl ReconnectPolicy {
    /// Create a policy
    #[must_use]
    pub fn new(initial_delay_ms: u64, multiplier: f64, max_delay_ms: u64) -> Self {
        Self {
            initial_delay_ms,
            multiplier,
            max_delay_ms,
        }
    }

    /// Initial delay as a duration
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Maximum delay as a duration
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Mutable backoff state of one connection manager
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    current: Duration,
}

impl Backoff {
    /// Start at the policy's initial delay
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        let current = policy.initial_delay();
        Self { policy, current }
    }

    /// Delay the next reconnect would wait
    #[must_use]
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Back to the initial delay (after a successful open)
    pub fn reset(&mut self) {
        self.current = self.policy.initial_delay();
    }

    /// Take the delay for this reconnect and grow it for the next failure
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let max = self.policy.max_delay();
        // Overflowing or non-finite products saturate at the cap
        let grown = self.current.as_secs_f64() * self.policy.multiplier;
        self.current = Duration::try_from_secs_f64(grown).map_or(max, |grown| grown.min(max));
        delay
    }
}
