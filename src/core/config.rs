//! # Global runtime configuration.
//!
//! Provides [`Config`], the centralized settings for one partition's
//! supervision runtime.
//!
//! Config is consumed in two places:
//! 1. **Loop construction**: `LeaseRenewer::new(.., &config, ..)` and
//!    `PartitionProcessor`'s builder-side defaults.
//! 2. **Supervisor construction**: bus capacity.
//!
//! ## Sentinel values
//! - `retry.limit = 0` → unbounded transient retries (the renewer always
//!   behaves as if this were set; see [`LeaseRenewer`](crate::LeaseRenewer))

use std::time::Duration;

use crate::policies::RetryPolicy;

/// Global configuration for one partition's supervision runtime.
///
/// ## Field semantics
/// - `renew_interval`: steady-state period between lease renewals; must be
///   comfortably smaller than the store's lease expiration window
/// - `poll_delay`: wait after the feed returns an empty batch
/// - `retry`: transient-failure backoff shared by both loops
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by `Bus`)
#[derive(Clone, Debug)]
pub struct Config {
    /// Steady-state period between renewal attempts.
    ///
    /// The store's expiration window, not this interval, decides when a
    /// lease is up for grabs; renewing at a fraction of that window keeps
    /// ownership stable across transient hiccups.
    pub renew_interval: Duration,

    /// Wait between fetches while the feed has nothing new.
    pub poll_delay: Duration,

    /// Transient-failure retry policy.
    ///
    /// The processor honors `retry.limit` as a consecutive-failure budget;
    /// the renewer uses only the delay schedule (its loop is ended by
    /// definitive store signals, never by a streak counter).
    pub retry: RetryPolicy,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// will receive `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `renew_interval = 17s` (a small fraction of the customary 60s
    ///   lease expiration window)
    /// - `poll_delay = 5s`
    /// - `retry = RetryPolicy::default()` (100ms first, ×2.0, 30s cap,
    ///   equal jitter, budget 8)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            renew_interval: Duration::from_secs(17),
            poll_delay: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            bus_capacity: 1024,
        }
    }
}
