// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator configuration types.

use std::time::Duration;

use crate::event::DEFAULT_CHANNEL_CAPACITY;
use crate::protocol::ConnectionData;

/// Configuration for a [`Coordinator`](super::Coordinator).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use livisi_sync::coordinator::{CoordinatorConfig, ReconnectionPolicy};
///
/// let config = CoordinatorConfig::new("192.168.1.10", "secret")
///     .with_poll_interval(Duration::from_secs(30))
///     .with_reconnection(ReconnectionPolicy::new().with_max_retries(20));
///
/// assert_eq!(config.host, "192.168.1.10");
/// assert_eq!(config.poll_interval, Duration::from_secs(30));
/// ```
#[derive(Clone)]
pub struct CoordinatorConfig {
    /// Controller host name or IP address.
    pub host: String,
    /// Password of the controller's local user.
    pub password: String,
    /// Interval between poll cycles.
    pub poll_interval: Duration,
    /// Reconnection policy of the event stream.
    pub reconnection: ReconnectionPolicy,
    /// Capacity of the host event bus.
    pub event_capacity: usize,
}

impl CoordinatorConfig {
    /// Default interval between poll cycles.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

    /// Creates a configuration for the controller at `host`.
    #[must_use]
    pub fn new(host: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            password: password.into(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            reconnection: ReconnectionPolicy::default(),
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Sets the interval between poll cycles.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the event stream reconnection policy.
    #[must_use]
    pub fn with_reconnection(mut self, policy: ReconnectionPolicy) -> Self {
        self.reconnection = policy;
        self
    }

    /// Sets the capacity of the host event bus (at least one).
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Returns the credentials used to authenticate.
    #[must_use]
    pub fn connection_data(&self) -> ConnectionData {
        ConnectionData::new(self.host.clone(), self.password.clone())
    }
}

impl std::fmt::Debug for CoordinatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorConfig")
            .field("host", &self.host)
            .field("password", &"<redacted>")
            .field("poll_interval", &self.poll_interval)
            .field("reconnection", &self.reconnection)
            .field("event_capacity", &self.event_capacity)
            .finish()
    }
}

/// Configuration for reconnecting the event stream.
///
/// The attempt counter restarts whenever a connection delivers at least one
/// record, so a stable stream that closes is reopened right away.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use livisi_sync::coordinator::ReconnectionPolicy;
///
/// // Default policy (retry forever, 1s doubling up to 60s)
/// let policy = ReconnectionPolicy::default();
/// assert!(policy.should_retry(1_000));
///
/// // Custom policy
/// let policy = ReconnectionPolicy::new()
///     .with_max_retries(5)
///     .with_initial_delay(Duration::from_millis(500))
///     .with_max_delay(Duration::from_secs(30));
/// assert!(!policy.should_retry(5));
/// ```
#[derive(Debug, Clone)]
pub struct ReconnectionPolicy {
    /// Whether automatic reconnection is enabled.
    pub enabled: bool,
    /// Maximum number of consecutive failed attempts (None = infinite).
    pub max_retries: Option<u32>,
    /// Delay before the first backed-off attempt.
    pub initial_delay: Duration,
    /// Upper bound of the delay.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f32,
}

impl ReconnectionPolicy {
    /// Creates a new reconnection policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy that never reconnects.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Sets the maximum number of consecutive failed attempts.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Sets infinite retries.
    #[must_use]
    pub fn with_infinite_retries(mut self) -> Self {
        self.max_retries = None;
        self
    }

    /// Sets the delay before the first backed-off attempt.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay for a given retry attempt, starting at zero.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay.min(self.max_delay);
        }

        let multiplier = self
            .backoff_multiplier
            .powi(i32::try_from(attempt).unwrap_or(i32::MAX));

        #[allow(clippy::cast_precision_loss)]
        let delay_ms = self.initial_delay.as_millis() as f32 * multiplier;

        // Saturates on overflow; `min` below caps it anyway.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delay = Duration::from_millis(delay_ms as u64);

        delay.min(self.max_delay)
    }

    /// Returns true if another attempt should be made after `attempt` failures.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.enabled && self.max_retries.is_none_or(|max| attempt < max)
    }
}

impl Default for ReconnectionPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: None,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinator_config_defaults() {
        let config = CoordinatorConfig::new("shc", "pw");

        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.event_capacity, DEFAULT_CHANNEL_CAPACITY);
        assert!(config.reconnection.enabled);
        assert_eq!(config.connection_data(), ConnectionData::new("shc", "pw"));
    }

    #[test]
    fn coordinator_config_debug_hides_password() {
        let debug = format!("{:?}", CoordinatorConfig::new("shc", "hunter2"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn zero_event_capacity_is_raised() {
        let config = CoordinatorConfig::new("shc", "pw").with_event_capacity(0);
        assert_eq!(config.event_capacity, 1);
    }

    #[test]
    fn reconnection_policy_default_retries_forever() {
        let policy = ReconnectionPolicy::default();

        assert!(policy.enabled);
        assert_eq!(policy.max_retries, None);
        assert!(policy.should_retry(u32::MAX));
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
    }

    #[test]
    fn reconnection_policy_disabled() {
        let policy = ReconnectionPolicy::disabled();

        assert!(!policy.enabled);
        assert!(!policy.should_retry(0));
    }

    #[test]
    fn reconnection_delay_calculation() {
        let policy = ReconnectionPolicy::new()
            .with_initial_delay(Duration::from_secs(1))
            .with_backoff_multiplier(2.0)
            .with_max_delay(Duration::from_secs(10));

        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(10));
        assert_eq!(policy.delay_for_attempt(100), Duration::from_secs(10));
    }

    #[test]
    fn reconnection_max_retries() {
        let policy = ReconnectionPolicy::new().with_max_retries(3);

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(policy.with_infinite_retries().should_retry(3));
    }
}
