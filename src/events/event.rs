//! # Runtime events emitted by the supervisor and its two loops.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Tenure lifecycle**: the supervisor's own transitions (started,
//!   observer opened/closed, stopping).
//! - **Processing**: batch delivery, checkpointing, idle feed.
//! - **Lease renewal**: successful renewals and the definitive failures.
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! lease token, retry attempt, delays, and the resolved close reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use feedvisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::BatchDelivered)
//!     .with_lease("partition-0")
//!     .with_count(12);
//!
//! assert_eq!(ev.kind, EventKind::BatchDelivered);
//! assert_eq!(ev.lease.as_deref(), Some("partition-0"));
//! assert_eq!(ev.count, Some(12));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::observers::CloseReason;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Tenure lifecycle ===
    /// A supervisor run began for a lease.
    ///
    /// Sets:
    /// - `lease`: lease token
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TenureStarted,

    /// The observer's `open` callback returned successfully.
    ///
    /// Sets:
    /// - `lease`: lease token
    /// - `at`, `seq`
    ObserverOpened,

    /// A terminal condition was observed; both loops are being cancelled.
    ///
    /// Sets:
    /// - `lease`: lease token
    /// - `at`, `seq`
    TenureStopping,

    /// The observer's `close` callback was invoked with the resolved reason.
    ///
    /// Sets:
    /// - `lease`: lease token
    /// - `close_reason`: resolved [`CloseReason`]
    /// - `at`, `seq`
    ObserverClosed,

    // === Processing ===
    /// A non-empty batch was handed to the observer and it returned Ok.
    ///
    /// Sets:
    /// - `lease`: lease token
    /// - `count`: number of documents in the batch
    /// - `at`, `seq`
    BatchDelivered,

    /// The advanced continuation token was persisted to the lease store.
    ///
    /// Sets:
    /// - `lease`: lease token
    /// - `at`, `seq`
    CheckpointSaved,

    /// The feed returned an empty batch; the processor is waiting out the
    /// poll delay.
    ///
    /// Sets:
    /// - `lease`: lease token
    /// - `delay_ms`: poll delay (ms)
    /// - `at`, `seq`
    FeedIdle,

    /// The observer's `process_changes` callback failed. Terminal for this
    /// tenure.
    ///
    /// Sets:
    /// - `lease`: lease token
    /// - `reason`: callback failure message
    /// - `at`, `seq`
    ObserverFailed,

    // === Lease renewal ===
    /// The lease was renewed against the store.
    ///
    /// Sets:
    /// - `lease`: lease token
    /// - `at`, `seq`
    LeaseRenewed,

    /// A transient store failure scheduled an in-place retry.
    ///
    /// Sets:
    /// - `lease`: lease token
    /// - `attempt`: consecutive-failure streak (1-based)
    /// - `delay_ms`: delay before the retry (ms)
    /// - `reason`: transient failure message
    /// - `at`, `seq`
    RetryScheduled,

    /// The store reported the lease as owned by someone else. Terminal.
    ///
    /// Sets:
    /// - `lease`: lease token
    /// - `reason`: store message
    /// - `at`, `seq`
    LeaseLost,

    /// The store reported the partition as split or removed. Terminal.
    ///
    /// Sets:
    /// - `lease`: lease token
    /// - `reason`: store message
    /// - `at`, `seq`
    PartitionGone,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Lease token, if applicable.
    pub lease: Option<Arc<str>>,
    /// Retry attempt / failure streak (starting from 1).
    pub attempt: Option<u32>,
    /// Delay before the next retry or poll, in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Number of documents in a delivered batch.
    pub count: Option<usize>,
    /// Human-readable reason (errors, store messages).
    pub reason: Option<Arc<str>>,
    /// Resolved close reason (only for [`EventKind::ObserverClosed`]).
    pub close_reason: Option<CloseReason>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            lease: None,
            attempt: None,
            delay_ms: None,
            count: None,
            reason: None,
            close_reason: None,
        }
    }

    /// Attaches a lease token.
    #[inline]
    pub fn with_lease(mut self, lease: impl Into<Arc<str>>) -> Self {
        self.lease = Some(lease.into());
        self
    }

    /// Attaches a retry attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a batch document count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the resolved close reason.
    #[inline]
    pub fn with_close_reason(mut self, reason: CloseReason) -> Self {
        self.close_reason = Some(reason);
        self
    }
}
