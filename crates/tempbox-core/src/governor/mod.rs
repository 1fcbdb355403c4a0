//! Request governor for a rate-limited remote API.
//!
//! Decides whether an outbound call may be issued now and computes
//! exponential backoff after rate-limit errors. The governor owns nothing but
//! its timing state; each mailbox session holds its own instance.
//!
//! Callers follow the same sequence for every call:
//!
//! 1. [`Governor::try_acquire`] (or [`Governor::can_proceed`] followed by
//!    [`Governor::record_attempt_start`], without awaiting in between)
//! 2. issue the call
//! 3. [`Governor::record_success`] or [`Governor::record_failure`]

mod config;

use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, warn};

pub use config::{GovernorConfig, GovernorConfigBuilder};
pub(crate) use config::millis;

/// Why a call failed, as far as the governor cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The remote signaled throttling (HTTP 429).
    RateLimited,
    /// Any other failure.
    Transient,
}

/// What the caller should tell the user after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum FailureOutcome {
    /// Rate limited; the next call is allowed after `retry_in`.
    Retrying {
        /// Backoff before the next permitted call.
        retry_in: Duration,
    },
    /// Rate limited more often than the retry budget allows. The caller
    /// should surface a "try again later" error; polling continues on its
    /// own schedule.
    GiveUp {
        /// Backoff before the next permitted call.
        retry_in: Duration,
    },
    /// Too many consecutive failures; the governor is slowing down.
    Escalated {
        /// Backoff before the next permitted call.
        retry_in: Duration,
    },
    /// Failure counted, no change in pacing.
    Counted,
}

impl FailureOutcome {
    /// Returns the backoff the failure started, if any.
    #[must_use]
    pub const fn retry_in(&self) -> Option<Duration> {
        match self {
            Self::Retrying { retry_in } | Self::GiveUp { retry_in } | Self::Escalated { retry_in } => {
                Some(*retry_in)
            }
            Self::Counted => None,
        }
    }
}

/// Timing and failure counters of one polling session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GovernorState {
    /// When the most recent permitted call started.
    pub last_request_at: Option<Instant>,
    /// Consecutive rate-limit responses (escalations included).
    pub retry_count: u32,
    /// True while backing off.
    pub rate_limited: bool,
    /// Consecutive failures of any kind.
    pub consecutive_failures: u32,
    /// Length of the current backoff window, jitter included.
    pub backoff: Duration,
}

/// Decides when calls to a rate-limited API may be made.
#[derive(Debug, Clone)]
pub struct Governor {
    config: GovernorConfig,
    state: GovernorState,
}

impl Default for Governor {
    fn default() -> Self {
        Self::new(GovernorConfig::default())
    }
}

impl Governor {
    /// Creates a governor with fresh state.
    #[must_use]
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config,
            state: GovernorState::default(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Returns a snapshot of the state.
    #[must_use]
    pub const fn state(&self) -> GovernorState {
        self.state
    }

    /// Returns true while backing off after rate-limit errors.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        self.state.rate_limited
    }

    /// Returns true if a call may be made at `now`.
    #[must_use]
    pub fn can_proceed(&self, now: Instant) -> bool {
        self.remaining_wait(now).is_none()
    }

    /// Returns how long the caller must still wait, or `None` if a call may
    /// be made at `now`.
    ///
    /// A clock that has not moved forward since the last call (zero or
    /// negative elapsed time) never permits a call.
    #[must_use]
    pub fn remaining_wait(&self, now: Instant) -> Option<Duration> {
        let last = self.state.last_request_at?;
        let required = if self.state.rate_limited {
            self.state.backoff
        } else {
            self.config.min_interval
        };
        match now.checked_duration_since(last) {
            Some(elapsed) if !elapsed.is_zero() && elapsed >= required => None,
            Some(elapsed) if !elapsed.is_zero() => Some(required - elapsed),
            _ => Some(required),
        }
    }

    /// Backoff for the given retry count, without jitter:
    /// `min(initial_delay * 2^retry_count, max_delay)`.
    #[must_use]
    pub fn base_delay(&self, retry_count: u32) -> Duration {
        2u32
            .checked_pow(retry_count)
            .and_then(|factor| self.config.initial_delay.checked_mul(factor))
            .map_or(self.config.max_delay, |delay| delay.min(self.config.max_delay))
    }

    /// Backoff for the given retry count, with random jitter added.
    ///
    /// Never exceeds `max_delay + jitter`.
    #[must_use]
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        self.base_delay(retry_count) + self.sample_jitter()
    }

    /// Marks the start of a permitted call.
    ///
    /// Must be called exactly once per call, before it is issued.
    pub fn record_attempt_start(&mut self, now: Instant) {
        if self.state.rate_limited && self.can_proceed(now) {
            debug!("Backoff window elapsed");
            self.state.rate_limited = false;
        }
        self.state.last_request_at = Some(now);
    }

    /// Checks and records a call in one step.
    ///
    /// # Errors
    ///
    /// Returns the remaining wait if the call is not permitted.
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        if let Some(wait) = self.remaining_wait(now) {
            debug!("Request throttled, {}ms remaining", wait.as_millis());
            return Err(wait);
        }
        self.record_attempt_start(now);
        Ok(())
    }

    /// Records a successful call; clears all backoff state.
    pub fn record_success(&mut self) {
        if self.state.rate_limited || self.state.consecutive_failures > 0 {
            debug!("Request succeeded, resetting backoff");
        }
        self.state.retry_count = 0;
        self.state.consecutive_failures = 0;
        self.state.rate_limited = false;
        self.state.backoff = Duration::ZERO;
    }

    /// Records a failed call and adjusts the pacing.
    ///
    /// Only transient failures escalate past `failure_threshold`; rate-limit
    /// failures already back off and count against the retry budget, and
    /// escalating them too would skip attempts before [`FailureOutcome::GiveUp`].
    pub fn record_failure(&mut self, kind: FailureKind) -> FailureOutcome {
        self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);

        match kind {
            FailureKind::RateLimited => {
                let retry_in = self.enter_backoff();
                self.state.retry_count = self
                    .state
                    .retry_count
                    .saturating_add(1)
                    .min(self.config.max_retry_attempts.saturating_add(1));
                if self.state.retry_count <= self.config.max_retry_attempts {
                    warn!(
                        "Rate limited, backing off for {}s (attempt {})",
                        retry_in.as_secs(),
                        self.state.retry_count
                    );
                    FailureOutcome::Retrying { retry_in }
                } else {
                    warn!("Rate limited too often, giving up for now");
                    FailureOutcome::GiveUp { retry_in }
                }
            }
            FailureKind::Transient
                if self.state.consecutive_failures > self.config.failure_threshold =>
            {
                let retry_in = self.enter_backoff();
                if self.state.retry_count < self.config.max_retry_attempts {
                    self.state.retry_count += 1;
                }
                warn!(
                    "{} consecutive failures, slowing down for {}s",
                    self.state.consecutive_failures,
                    retry_in.as_secs()
                );
                FailureOutcome::Escalated { retry_in }
            }
            FailureKind::Transient => FailureOutcome::Counted,
        }
    }

    fn enter_backoff(&mut self) -> Duration {
        let delay = self.backoff_delay(self.state.retry_count);
        self.state.rate_limited = true;
        self.state.backoff = delay;
        delay
    }

    fn sample_jitter(&self) -> Duration {
        let bound = u64::try_from(self.config.jitter.as_millis()).unwrap_or(u64::MAX);
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=bound))
    }
}
