// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Retry policy for requests to the switch.

use std::time::Duration;

/// How often, and how far apart, a request is attempted.
///
/// Only retryable transport errors (connection failures, timeouts, 5xx
/// statuses) are retried; authentication and parse errors fail at once.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dlipower_lib::RetryPolicy;
///
/// let policy = RetryPolicy::new()
///     .with_attempts(5)
///     .with_delay(Duration::from_millis(500));
///
/// assert!(policy.should_retry(4));
/// assert!(!policy.should_retry(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts per request, including the first.
    pub attempts: u32,
    /// Fixed delay between two attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Default number of attempts per request.
    pub const DEFAULT_ATTEMPTS: u32 = 3;
    /// Default delay between attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    /// Creates a retry policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total number of attempts. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Sets the delay between attempts.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns true if another attempt may follow the given number of
    /// attempts already made.
    #[must_use]
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: Self::DEFAULT_ATTEMPTS,
            delay: Self::DEFAULT_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }

    #[test]
    fn attempts_are_at_least_one() {
        let policy = RetryPolicy::new().with_attempts(0);
        assert_eq!(policy.attempts, 1);
    }

    #[test]
    fn should_retry_counts_attempts() {
        let policy = RetryPolicy::new().with_attempts(3);
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }
}
