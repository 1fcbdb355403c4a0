//! Governor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and retry limits for one rate-limited API.
///
/// Durations serialize as milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Minimum gap between two calls, even without rate-limit errors.
    #[serde(with = "millis", rename = "min_interval_ms")]
    pub min_interval: Duration,
    /// Backoff after the first rate-limit error.
    #[serde(with = "millis", rename = "initial_delay_ms")]
    pub initial_delay: Duration,
    /// Upper bound of the exponential part of the backoff.
    #[serde(with = "millis", rename = "max_delay_ms")]
    pub max_delay: Duration,
    /// Upper bound of the random jitter added to each backoff.
    #[serde(with = "millis", rename = "jitter_ms")]
    pub jitter: Duration,
    /// Rate-limit errors tolerated before the caller should give up for now.
    pub max_retry_attempts: u32,
    /// Consecutive failures of any kind tolerated before slowing down.
    pub failure_threshold: u32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(5),
            initial_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(60),
            jitter: Duration::from_secs(2),
            max_retry_attempts: 3,
            failure_threshold: 3,
        }
    }
}

impl GovernorConfig {
    /// Creates a configuration builder starting from the defaults.
    #[must_use]
    pub fn builder() -> GovernorConfigBuilder {
        GovernorConfigBuilder::default()
    }
}

/// Builder for [`GovernorConfig`].
#[derive(Debug, Clone, Default)]
pub struct GovernorConfigBuilder {
    config: GovernorConfig,
}

impl GovernorConfigBuilder {
    /// Sets the minimum gap between calls.
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.config.min_interval = interval;
        self
    }

    /// Sets the first backoff delay.
    #[must_use]
    pub const fn initial_delay(mut self, delay: Duration) -> Self {
        self.config.initial_delay = delay;
        self
    }

    /// Sets the backoff cap.
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    /// Sets the jitter bound. Zero disables jitter.
    #[must_use]
    pub const fn jitter(mut self, jitter: Duration) -> Self {
        self.config.jitter = jitter;
        self
    }

    /// Sets how many rate-limit errors are retried.
    #[must_use]
    pub const fn max_retry_attempts(mut self, attempts: u32) -> Self {
        self.config.max_retry_attempts = attempts;
        self
    }

    /// Sets how many consecutive failures are tolerated.
    #[must_use]
    pub const fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub const fn build(self) -> GovernorConfig {
        self.config
    }
}

/// Serde helpers for durations stored as whole milliseconds.
pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)] // Required by serde with= signature
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
