//! Retry policy: attempt budget, per-attempt timeout and backoff delays.

use std::time::Duration;

/// How many times to try a request and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first one (always >= 1)
  max_attempts: u32,
  /// Delay before the second attempt; doubles for each following one
  base_delay: Duration,
  /// Upper bound on a single attempt
  attempt_timeout: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::new(2, Duration::from_secs(2), Duration::from_secs(10))
  }
}

impl RetryPolicy {
  /// Create a policy. `max_attempts` of zero is raised to one.
  pub fn new(max_attempts: u32, base_delay: Duration, attempt_timeout: Duration) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      base_delay,
      attempt_timeout,
    }
  }

  pub fn max_attempts(&self) -> u32 {
    self.max_attempts
  }

  pub fn base_delay(&self) -> Duration {
    self.base_delay
  }

  pub fn attempt_timeout(&self) -> Duration {
    self.attempt_timeout
  }

  /// Delay to wait after the failed attempt with zero-based index `attempt`.
  ///
  /// Returns `None` after the last attempt: there is nothing left to wait for.
  pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
    if attempt.saturating_add(1) >= self.max_attempts {
      return None;
    }
    let factor = 2u32.saturating_pow(attempt);
    Some(self.base_delay.saturating_mul(factor))
  }
}
