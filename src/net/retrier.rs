//! Retry policy for failed network calls.
//!
//! The retrier only decides. Attempt counting and waiting out the delay
//! belong to the transport.

use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::ErrorKind;

/// Outcome of [`Retrier::should_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub retry: bool,
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Retrier {
    enabled: bool,
    max_attempts: u32,
    delay: Duration,
}

impl Default for Retrier {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for Retrier {
    fn from(config: &RetryConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_attempts: config.max_attempts,
            delay: config.delay(),
        }
    }
}

impl Retrier {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            enabled: true,
            max_attempts,
            delay,
        }
    }

    /// Decide whether a call that already failed `attempt_count` times
    /// after its first try should go out again.
    pub fn should_retry(
        &self,
        attempt_count: u32,
        error: ErrorKind,
        _status: Option<u16>,
    ) -> RetryDecision {
        let retry = self.enabled
            && attempt_count < self.max_attempts
            && match error {
                // Don't prolong the user's wait.
                ErrorKind::Timeout => false,
                ErrorKind::Connectivity => true,
                _ => false,
            };

        RetryDecision {
            retry,
            delay: self.delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
