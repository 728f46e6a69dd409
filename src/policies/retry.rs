//! # Retry policy for transient store failures.
//!
//! [`RetryPolicy`] controls how in-place retry delays grow when a renew,
//! fetch, or persist call fails transiently. It is parameterized by:
//! - [`RetryPolicy::factor`] the multiplicative growth factor;
//! - [`RetryPolicy::first`] the initial delay;
//! - [`RetryPolicy::max`] the maximum delay cap;
//! - [`RetryPolicy::limit`] the consecutive-failure budget.
//!
//! The delay for attempt `n` is computed as `first × factor^n`, clamped to
//! `max`, then jitter is applied. The base delay is derived purely from the
//! attempt number; jitter output never feeds back into subsequent
//! calculations, so delays cannot drift downward over a long streak.
//!
//! The budget is a streak, not a lifetime counter: a successful call resets
//! it. `limit = 0` means unbounded — the lease renewer runs with an
//! unbounded budget because only a definitive store signal may end its loop.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use feedvisor::{JitterPolicy, RetryPolicy};
//!
//! let retry = RetryPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//!     limit: 4,
//! };
//!
//! // Attempt 0 — uses `first` (100ms)
//! assert_eq!(retry.delay_for(0), Duration::from_millis(100));
//!
//! // Attempt 1 — first × factor^1 = 200ms
//! assert_eq!(retry.delay_for(1), Duration::from_millis(200));
//!
//! // Attempt 10 — 100ms × 2^10 = 102_400ms → capped at max=10s
//! assert_eq!(retry.delay_for(10), Duration::from_secs(10));
//!
//! // The fifth consecutive failure exceeds a budget of 4.
//! assert!(!retry.is_exhausted(4));
//! assert!(retry.is_exhausted(5));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Transient-failure retry policy.
///
/// Encapsulates the parameters that determine how retry delays grow and how
/// many consecutive transient failures are tolerated before the streak is
/// declared persistent.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Initial delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter policy to avoid synchronized retries across workers.
    pub jitter: JitterPolicy,
    /// Consecutive-failure budget; `0` = unbounded.
    pub limit: u32,
}

impl Default for RetryPolicy {
    /// Returns a policy with:
    /// - `first = 100ms`;
    /// - `factor = 2.0` (exponential);
    /// - `max = 30s`;
    /// - `jitter = Equal`;
    /// - `limit = 8`.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
            limit: 8,
        }
    }
}

impl RetryPolicy {
    /// Computes the delay for the given attempt number (0-indexed).
    ///
    /// The base delay is `first × factor^attempt`, clamped to
    /// [`RetryPolicy::max`]. Jitter is applied to the clamped base, but the
    /// result is never fed back into subsequent calculations.
    ///
    /// # Notes
    /// - If `factor` equals 1.0, the delay stays constant at `first`
    ///   (up to `max`).
    /// - If `factor` is greater than 1.0, delays grow exponentially up to
    ///   `max`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let clamped_exp = attempt.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(clamped_exp);

        let base =
            if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
                self.max
            } else {
                Duration::from_secs_f64(unclamped_secs)
            };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }

    /// Returns true once a streak of `failures` consecutive transient
    /// failures exceeds the budget.
    ///
    /// `limit = 0` disables the budget entirely.
    pub fn is_exhausted(&self, failures: u32) -> bool {
        self.limit != 0 && failures > self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn no_jitter(first_ms: u64, max_s: u64, factor: f64) -> RetryPolicy {
        RetryPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_secs(max_s),
            factor,
            jitter: JitterPolicy::None,
            limit: 0,
        }
    }

    #[test]
    fn test_attempt_zero_returns_first() {
        let policy = no_jitter(100, 30, 2.0);
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_growth_no_jitter() {
        let policy = no_jitter(100, 30, 2.0);

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(4), Duration::from_millis(1600));
    }

    #[test]
    fn test_constant_factor() {
        let policy = no_jitter(500, 30, 1.0);
        for attempt in 0..10 {
            assert_eq!(
                policy.delay_for(attempt),
                Duration::from_millis(500),
                "attempt {} should be constant at 500ms",
                attempt
            );
        }
    }

    #[test]
    fn test_clamped_to_max() {
        let policy = no_jitter(100, 1, 2.0);
        assert_eq!(policy.delay_for(10), Duration::from_secs(1));
    }

    #[test]
    fn test_first_exceeds_max() {
        let policy = RetryPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            factor: 2.0,
            jitter: JitterPolicy::None,
            limit: 0,
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(5));
    }

    #[test]
    fn test_full_jitter_bounded_by_base() {
        let policy = RetryPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::Full,
            limit: 0,
        };

        for attempt in 5..15 {
            let base_ms = (100.0 * 2.0f64.powi(attempt as i32)).min(30_000.0);
            let delay = policy.delay_for(attempt);
            assert!(
                delay <= Duration::from_millis(base_ms as u64),
                "attempt {}: delay {:?} exceeds base {}ms",
                attempt,
                delay,
                base_ms
            );
        }
    }

    #[test]
    fn test_equal_jitter_bounds() {
        let policy = RetryPolicy {
            first: Duration::from_millis(1000),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::Equal,
            limit: 0,
        };
        for attempt in 0..50 {
            let delay = policy.delay_for(attempt);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_decorrelated_jitter_grows_with_attempts() {
        let policy = RetryPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::Decorrelated,
            limit: 0,
        };

        let mut min_seen = Duration::from_secs(999);
        let mut max_seen = Duration::ZERO;
        for _ in 0..100 {
            let delay = policy.delay_for(8);
            min_seen = min_seen.min(delay);
            max_seen = max_seen.max(delay);
        }

        assert!(
            min_seen >= Duration::from_millis(100),
            "min {:?} below floor",
            min_seen
        );
        assert!(
            max_seen >= Duration::from_secs(5),
            "max {:?} suspiciously low, range too narrow",
            max_seen
        );
    }

    #[test]
    fn test_huge_attempt_clamps_to_max() {
        let policy = no_jitter(100, 60, 2.0);
        assert_eq!(policy.delay_for(100), Duration::from_secs(60));
    }

    #[test]
    fn test_non_finite_overflow_clamps_to_max() {
        let policy = no_jitter(100, 10, 2.0);
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_budget_streak() {
        let policy = RetryPolicy {
            limit: 3,
            ..RetryPolicy::default()
        };
        assert!(!policy.is_exhausted(0));
        assert!(!policy.is_exhausted(3));
        assert!(policy.is_exhausted(4));
    }

    #[test]
    fn test_zero_limit_never_exhausts() {
        let policy = RetryPolicy {
            limit: 0,
            ..RetryPolicy::default()
        };
        assert!(!policy.is_exhausted(u32::MAX));
    }
}
