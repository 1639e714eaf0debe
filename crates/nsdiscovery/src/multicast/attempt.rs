// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Retry schedule and per-call state for datagram discovery.
//!
//! The total timeout is split into fixed attempt windows:
//!
//! | total timeout | window              | attempts          |
//! |---------------|---------------------|-------------------|
//! | 0             | 200 ms              | unbounded         |
//! | 5000 ms       | 200 ms              | 25                |
//! | 150 ms        | 150 ms              | 1                 |
//!
//! Each retransmission carries a new attempt byte. The byte wraps from 255
//! back to 1, never 0, so members can tell a retransmission from a stale
//! first request.

use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Longest wait for responses before retransmitting.
pub const DEFAULT_ATTEMPT_DELAY: Duration = Duration::from_millis(200);

/// Next attempt byte after `current`, skipping zero.
#[inline]
#[must_use]
pub const fn next_attempt(current: u8) -> u8 {
    match current.wrapping_add(1) {
        0 => 1,
        n => n,
    }
}

/// How long to wait per attempt and how many attempts to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
    /// Wait per attempt window.
    pub delay: Duration,
    /// Number of windows, `None` to retry until a result arrives.
    pub attempts: Option<u32>,
}

impl RetrySchedule {
    /// Split `timeout` into attempt windows. A zero timeout retries forever.
    pub fn for_timeout(timeout: Duration) -> Self {
        let total_ms = timeout.as_millis();
        if total_ms == 0 {
            return Self {
                delay: DEFAULT_ATTEMPT_DELAY,
                attempts: None,
            };
        }

        let delay_ms = total_ms.min(DEFAULT_ATTEMPT_DELAY.as_millis());
        let attempts = u32::try_from(total_ms / delay_ms).unwrap_or(u32::MAX);
        Self {
            delay: Duration::from_millis(delay_ms as u64),
            attempts: Some(attempts),
        }
    }

    /// Attempt limit as written into the request (low 8 bits).
    pub fn attempt_limit_byte(&self) -> u8 {
        match self.attempts {
            Some(n) => n as u8,
            None => u8::MAX,
        }
    }
}

/// Per-call discovery state: attempt byte, window deadline, and the set of
/// clusters already accepted.
#[derive(Debug)]
pub struct DiscoveryAttempt {
    attempt: u8,
    remaining: Option<u32>,
    delay: Duration,
    deadline: Instant,
    accepted: HashSet<String>,
}

impl DiscoveryAttempt {
    pub fn new(schedule: RetrySchedule) -> Self {
        Self {
            attempt: 0,
            remaining: schedule.attempts,
            delay: schedule.delay,
            deadline: Instant::now() + schedule.delay,
            accepted: HashSet::new(),
        }
    }

    /// Advance to the next attempt byte and open a fresh window.
    ///
    /// Called before every (re)transmission; the first call yields 1.
    pub fn advance(&mut self) -> u8 {
        self.attempt = next_attempt(self.attempt);
        self.deadline = Instant::now() + self.delay;
        self.attempt
    }

    /// Current attempt byte (0 before the first send).
    pub fn attempt(&self) -> u8 {
        self.attempt
    }

    /// Time left in the current window, `None` once it has expired.
    pub fn remaining_window(&self) -> Option<Duration> {
        self.deadline
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
    }

    /// Record an expired window. Returns true if another attempt is allowed.
    pub fn on_timeout(&mut self) -> bool {
        match self.remaining.as_mut() {
            None => true,
            Some(n) => {
                *n = n.saturating_sub(1);
                *n > 0
            }
        }
    }

    /// Windows left, `None` when unbounded.
    pub fn remaining_attempts(&self) -> Option<u32> {
        self.remaining
    }

    /// Accept `cluster`. Returns false if it was already accepted.
    pub fn accept(&mut self, cluster: &str) -> bool {
        if self.accepted.contains(cluster) {
            return false;
        }
        self.accepted.insert(cluster.to_string())
    }

    /// Number of distinct clusters accepted so far.
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn has_accepted(&self) -> bool {
        !self.accepted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_attempt_skips_zero() {
        assert_eq!(next_attempt(0), 1);
        assert_eq!(next_attempt(1), 2);
        assert_eq!(next_attempt(254), 255);
        assert_eq!(next_attempt(255), 1);
    }

    #[test]
    fn test_attempt_byte_after_255_retransmissions() {
        let mut attempt = DiscoveryAttempt::new(RetrySchedule::for_timeout(Duration::ZERO));
        assert_eq!(attempt.advance(), 1);

        let mut last = 1;
        for _ in 0..255 {
            last = attempt.advance();
            assert_ne!(last, 0);
        }
        assert_eq!(last, 1);
    }

    #[test]
    fn test_schedule_default_timeout() {
        let schedule = RetrySchedule::for_timeout(Duration::from_millis(5000));
        assert_eq!(schedule.delay, Duration::from_millis(200));
        assert_eq!(schedule.attempts, Some(25));
        assert_eq!(schedule.attempt_limit_byte(), 25);
    }

    #[test]
    fn test_schedule_short_timeout() {
        let schedule = RetrySchedule::for_timeout(Duration::from_millis(150));
        assert_eq!(schedule.delay, Duration::from_millis(150));
        assert_eq!(schedule.attempts, Some(1));
    }

    #[test]
    fn test_schedule_forever() {
        let schedule = RetrySchedule::for_timeout(Duration::ZERO);
        assert_eq!(schedule.delay, DEFAULT_ATTEMPT_DELAY);
        assert_eq!(schedule.attempts, None);
        assert_eq!(schedule.attempt_limit_byte(), 0xFF);
    }

    #[test]
    fn test_limit_byte_truncates() {
        let schedule = RetrySchedule::for_timeout(Duration::from_secs(60));
        assert_eq!(schedule.attempts, Some(300));
        assert_eq!(schedule.attempt_limit_byte(), (300u32 & 0xFF) as u8);
    }

    #[test]
    fn test_on_timeout_counts_down() {
        let schedule = RetrySchedule {
            delay: Duration::from_millis(10),
            attempts: Some(3),
        };
        let mut attempt = DiscoveryAttempt::new(schedule);
        assert!(attempt.on_timeout());
        assert!(attempt.on_timeout());
        assert!(!attempt.on_timeout());
        assert_eq!(attempt.remaining_attempts(), Some(0));
    }

    #[test]
    fn test_unbounded_never_exhausts() {
        let mut attempt = DiscoveryAttempt::new(RetrySchedule::for_timeout(Duration::ZERO));
        for _ in 0..1000 {
            assert!(attempt.on_timeout());
        }
    }

    #[test]
    fn test_accept_once_per_cluster() {
        let mut attempt = DiscoveryAttempt::new(RetrySchedule::for_timeout(Duration::ZERO));
        assert!(attempt.accept("X"));
        assert!(!attempt.accept("X"));
        assert!(attempt.accept("Y"));
        assert_eq!(attempt.accepted_count(), 2);
        assert!(attempt.has_accepted());
    }

    #[test]
    fn test_window_expires() {
        let schedule = RetrySchedule {
            delay: Duration::from_millis(5),
            attempts: Some(1),
        };
        let mut attempt = DiscoveryAttempt::new(schedule);
        attempt.advance();
        assert!(attempt.remaining_window().is_some());
        std::thread::sleep(Duration::from_millis(20));
        assert!(attempt.remaining_window().is_none());
    }
}
