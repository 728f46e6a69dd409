//! Error types used by the feedvisor runtime and its collaborators.
//!
//! This module defines two main error enums:
//!
//! - [`StoreError`] — errors raised by the external collaborators (lease
//!   store, feed source) when a renew/persist/fetch call fails.
//! - [`TenureError`] — the terminal outcome of one processing tenure,
//!   recorded by the processor or renewer loop and propagated once by the
//!   supervisor.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics, plus classification helpers such as
//! [`StoreError::is_transient`] and [`TenureError::close_reason`].

use thiserror::Error;

use crate::observers::CloseReason;

/// # Errors raised by the lease store and feed source.
///
/// Collaborators classify their failures into exactly three kinds. The
/// distinction between [`StoreError::Transient`] and the two definitive
/// variants is load-bearing: transient failures are retried in place by the
/// loops, while `LeaseLost` / `PartitionGone` end the tenure.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// The lease no longer exists or is held by another owner.
    #[error("lease is held by another owner: {owner:?}")]
    LeaseLost {
        /// Current owner reported by the store, if known.
        owner: Option<String>,
    },

    /// The physical partition no longer exists (split or removed).
    #[error("partition is gone (split or removed)")]
    PartitionGone,

    /// Network/store hiccup; the call may succeed if retried.
    #[error("transient store failure: {error}")]
    Transient {
        /// The underlying failure message.
        error: String,
    },
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::LeaseLost { .. } => "store_lease_lost",
            StoreError::PartitionGone => "store_partition_gone",
            StoreError::Transient { .. } => "store_transient",
        }
    }

    /// Indicates whether the call is safe to retry in place.
    ///
    /// Returns `true` only for [`StoreError::Transient`]; the definitive
    /// variants terminate the calling loop instead.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient { .. })
    }

    /// Convenience constructor for transient failures.
    pub fn transient(error: impl Into<String>) -> Self {
        StoreError::Transient {
            error: error.into(),
        }
    }
}

/// # Terminal outcome of one processing tenure.
///
/// At most one `TenureError` is produced per supervisor run. Each sub-loop
/// records its terminal error into a write-once cell instead of throwing
/// across task boundaries; the supervisor inspects both cells and converts
/// them into one close reason and one propagated error.
///
/// `Clone` because the same value is both recorded (read-many via
/// `result_error()`) and returned from `run`.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum TenureError {
    /// Another worker holds the lease; this tenure must relinquish.
    #[error("lease {lease} lost to another owner")]
    LeaseLost {
        /// Token of the lost lease.
        lease: String,
    },

    /// The partition split or was removed; successor discovery is the
    /// controller's job.
    #[error("partition {lease} is gone (split or removed)")]
    PartitionGone {
        /// Token of the affected lease.
        lease: String,
    },

    /// The application observer callback failed. Fatal for this tenure;
    /// the callback is never retried.
    #[error("observer callback failed: {error}")]
    Observer {
        /// The callback's failure message.
        error: String,
    },

    /// A transient-failure streak exceeded the retry budget.
    #[error("transient retries exhausted after {attempts} attempts: {error}")]
    RetriesExhausted {
        /// Consecutive failed attempts.
        attempts: u32,
        /// The last transient failure message.
        error: String,
    },

    /// Unexpected runtime failure (loop panic, misuse such as re-running a
    /// one-shot supervisor).
    #[error("internal failure: {error}")]
    Internal {
        /// The underlying failure message.
        error: String,
    },
}

impl TenureError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TenureError::LeaseLost { .. } => "tenure_lease_lost",
            TenureError::PartitionGone { .. } => "tenure_partition_gone",
            TenureError::Observer { .. } => "tenure_observer_error",
            TenureError::RetriesExhausted { .. } => "tenure_retries_exhausted",
            TenureError::Internal { .. } => "tenure_internal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TenureError::LeaseLost { lease } => format!("lease lost: {lease}"),
            TenureError::PartitionGone { lease } => format!("partition gone: {lease}"),
            TenureError::Observer { error } => format!("observer: {error}"),
            TenureError::RetriesExhausted { attempts, error } => {
                format!("retries exhausted ({attempts}): {error}")
            }
            TenureError::Internal { error } => format!("internal: {error}"),
        }
    }

    /// Maps this terminal error onto the observer-visible close reason.
    ///
    /// Unclassified failures (`RetriesExhausted`, `Internal`) map to
    /// [`CloseReason::Unknown`].
    pub fn close_reason(&self) -> CloseReason {
        match self {
            TenureError::LeaseLost { .. } => CloseReason::LeaseLost,
            TenureError::PartitionGone { .. } => CloseReason::LeaseGone,
            TenureError::Observer { .. } => CloseReason::ObserverError,
            TenureError::RetriesExhausted { .. } | TenureError::Internal { .. } => {
                CloseReason::Unknown
            }
        }
    }

    /// Builds the tenure-level error corresponding to a definitive store
    /// failure observed while working on `lease`.
    ///
    /// Transient errors are retried in place and must not reach this point;
    /// one arriving here is itself an internal failure.
    pub(crate) fn from_store(lease: &str, err: &StoreError) -> Self {
        match err {
            StoreError::LeaseLost { .. } => TenureError::LeaseLost {
                lease: lease.to_string(),
            },
            StoreError::PartitionGone => TenureError::PartitionGone {
                lease: lease.to_string(),
            },
            StoreError::Transient { error } => TenureError::Internal {
                error: format!("transient error recorded as terminal: {error}"),
            },
        }
    }
}
