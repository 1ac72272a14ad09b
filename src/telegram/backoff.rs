//! Backoff for a failing update stream.
//!
//! Consecutive receive errors wait twice as long as the previous one, up to
//! a cap. After too many failures in a row the caller gives up.

use std::time::Duration;

/// Delay after the first failure.
pub const UPDATE_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Longest delay between attempts.
pub const UPDATE_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Consecutive failures tolerated before giving up.
pub const UPDATE_MAX_FAILURES: u32 = 10;

/// Tracks consecutive update-stream failures.
#[derive(Debug, Clone)]
pub struct UpdateBackoff {
    initial: Duration,
    max: Duration,
    max_failures: u32,
    failures: u32,
}

impl Default for UpdateBackoff {
    fn default() -> Self {
        Self::new(UPDATE_INITIAL_BACKOFF, UPDATE_MAX_BACKOFF, UPDATE_MAX_FAILURES)
    }
}

impl UpdateBackoff {
    #[must_use]
    pub fn new(initial: Duration, max: Duration, max_failures: u32) -> Self {
        Self {
            initial,
            max,
            max_failures,
            failures: 0,
        }
    }

    /// Registers a failure and returns how long to wait before the next
    /// attempt, or `None` once the failure limit is reached.
    pub fn on_error(&mut self) -> Option<Duration> {
        self.failures = self.failures.saturating_add(1);
        if self.failures >= self.max_failures {
            return None;
        }
        Some(self.pending_delay())
    }

    /// Registers a successful receive.
    pub fn on_success(&mut self) {
        self.failures = 0;
    }

    /// Failures since the last success.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Delay to apply before the next receive.
    #[must_use]
    pub fn pending_delay(&self) -> Duration {
        if self.failures == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(self.failures - 1).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }
}
