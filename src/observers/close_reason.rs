//! # Why a processing tenure ended.

/// Classified cause delivered to the observer's `close` callback.
///
/// Exactly one value is chosen per supervisor run, resolved from the
/// terminal results of both loops by an explicit priority table (see
/// `core::outcome`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Unclassified failure, or the run ended with neither an error nor a
    /// shutdown request.
    Unknown,
    /// The caller requested cooperative shutdown; not a failure.
    Shutdown,
    /// Another worker took the lease.
    LeaseLost,
    /// The partition split or was removed; the controller should discover
    /// successors.
    LeaseGone,
    /// The application observer callback failed.
    ObserverError,
}

impl CloseReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CloseReason::Unknown => "unknown",
            CloseReason::Shutdown => "shutdown",
            CloseReason::LeaseLost => "lease_lost",
            CloseReason::LeaseGone => "lease_gone",
            CloseReason::ObserverError => "observer_error",
        }
    }
}
