//! Retry Backoff
//!
//! When `accept()` or `recv_from()` keeps failing (file descriptor
//! exhaustion, a broken interface) retrying immediately would spin a core.
//! The loops instead sleep for a delay that doubles on every consecutive
//! failure, up to a ceiling, and drops back to the minimum after the next
//! success.

use std::time::Duration;

/// Configuration for the retry backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay after the first failure (default: 5ms)
    pub min_delay: Duration,

    /// Upper bound for the delay (default: 1s)
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(5),
            max_delay: Duration::from_secs(1),
        }
    }
}

/// Exponential backoff state for one loop.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    /// Delay to use for the next failure, `None` after a success
    next: Option<Duration>,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, next: None }
    }

    /// Records a failure and returns how long to wait before retrying.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next.unwrap_or(self.config.min_delay);
        self.next = Some((delay * 2).min(self.config.max_delay));
        delay
    }

    /// Records a success.
    pub fn reset(&mut self) {
        self.next = None;
    }

    /// Records a failure and sleeps for the resulting delay.
    pub async fn wait(&mut self) {
        let delay = self.next_delay();
        tokio::time::sleep(delay).await;
    }
}
