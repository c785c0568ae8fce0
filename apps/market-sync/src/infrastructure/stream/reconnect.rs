//! Reconnection Policy
//!
//! Fixed-interval reconnection for the stream connection. The interval
//! does not back off; once `max_attempts` is reached the policy yields
//! `None` until it is reset by a successful open or an explicit
//! `connect`.

use std::time::Duration;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Whether automatic reconnection is enabled at all.
    pub enabled: bool,
    /// Fixed delay between reconnection attempts.
    pub interval: Duration,
    /// Maximum number of reconnection attempts before going terminal.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(3),
            max_attempts: 5,
        }
    }
}

/// Reconnection policy tracking attempts against a fixed-interval config.
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    attempts_used: u32,
}

impl ReconnectPolicy {
    /// Create a new reconnection policy.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts_used: 0,
        }
    }

    /// Claim the next reconnection attempt.
    ///
    /// Returns the fixed delay to wait before reconnecting, or `None` when
    /// reconnection is disabled or attempts are exhausted.
    #[must_use]
    pub const fn next_delay(&mut self) -> Option<Duration> {
        if !self.config.enabled || self.attempts_used >= self.config.max_attempts {
            return None;
        }

        self.attempts_used += 1;
        Some(self.config.interval)
    }

    /// Reset after a successful open.
    pub const fn reset(&mut self) {
        self.attempts_used = 0;
    }

    /// Attempts used so far.
    #[must_use]
    pub const fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    /// Whether another attempt would be permitted.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        self.config.enabled && self.attempts_used < self.config.max_attempts
    }

    /// Whether the policy ran its attempts to exhaustion (as opposed to
    /// being disabled outright).
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.config.enabled && self.attempts_used >= self.config.max_attempts
    }
}
