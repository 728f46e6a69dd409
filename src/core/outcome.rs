//! # Terminal-result plumbing: write-once cells and close-reason resolution.
//!
//! Each loop publishes at most one terminal error into an [`OutcomeCell`];
//! the supervisor is the single reader that converts both cells plus the
//! shutdown flag into one [`CloseReason`] and one propagated error.
//!
//! ## Resolution table
//! The processor's verdict is consulted before the renewer's: the
//! processor is the loop that talks to the data, so its classification of a
//! simultaneous failure is the actionable one. Within the winning error the
//! kind decides the reason:
//!
//! ```text
//! processor cell        renewer cell         → reason          propagated
//! ────────────────────  ───────────────────  ────────────────  ──────────
//! LeaseLost             (any)                LeaseLost         yes
//! PartitionGone         (any)                LeaseGone         yes
//! Observer              (any)                ObserverError     yes
//! RetriesExhausted/Int  (any)                Unknown           yes
//! (empty)               LeaseLost            LeaseLost         yes
//! (empty)               PartitionGone        LeaseGone         yes
//! (empty)               RetriesExhausted/Int Unknown           yes
//! (empty)               (empty), shutdown    Shutdown          no
//! (empty)               (empty), no shutdown Unknown           no
//! ```

use std::sync::OnceLock;

use crate::error::TenureError;
use crate::observers::CloseReason;

/// Write-once, read-many cell for a loop's terminal error.
///
/// The first write wins; later writes are ignored. Publication goes through
/// `OnceLock`, so a reader on another task either sees nothing or sees the
/// fully written value.
#[derive(Debug, Default)]
pub struct OutcomeCell {
    slot: OnceLock<TenureError>,
}

impl OutcomeCell {
    /// Creates an empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the terminal error. Returns `false` if a value was already
    /// recorded (the original is kept).
    pub fn record(&self, err: TenureError) -> bool {
        self.slot.set(err).is_ok()
    }

    /// The recorded terminal error, or `None` if the loop stopped clean or
    /// has not stopped yet.
    pub fn get(&self) -> Option<&TenureError> {
        self.slot.get()
    }
}

/// Resolves the close reason and the propagated error from both loops'
/// terminal results.
///
/// `shutdown_requested` is the caller-driven token's level at resolution
/// time; it only matters when neither loop recorded an error.
pub(crate) fn resolve(
    processor: Option<&TenureError>,
    renewer: Option<&TenureError>,
    shutdown_requested: bool,
) -> (CloseReason, Option<TenureError>) {
    match processor.or(renewer) {
        Some(err) => (err.close_reason(), Some(err.clone())),
        None if shutdown_requested => (CloseReason::Shutdown, None),
        None => (CloseReason::Unknown, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lost() -> TenureError {
        TenureError::LeaseLost {
            lease: "p-0".into(),
        }
    }

    fn gone() -> TenureError {
        TenureError::PartitionGone {
            lease: "p-0".into(),
        }
    }

    fn observer() -> TenureError {
        TenureError::Observer {
            error: "boom".into(),
        }
    }

    fn exhausted() -> TenureError {
        TenureError::RetriesExhausted {
            attempts: 9,
            error: "timeout".into(),
        }
    }

    #[test]
    fn test_cell_is_write_once() {
        let cell = OutcomeCell::new();
        assert!(cell.get().is_none());
        assert!(cell.record(lost()));
        assert!(!cell.record(gone()));
        assert!(matches!(cell.get(), Some(TenureError::LeaseLost { .. })));
    }

    #[test]
    fn test_shutdown_with_no_errors() {
        let (reason, err) = resolve(None, None, true);
        assert_eq!(reason, CloseReason::Shutdown);
        assert!(err.is_none());
    }

    #[test]
    fn test_no_errors_no_shutdown_is_unknown() {
        let (reason, err) = resolve(None, None, false);
        assert_eq!(reason, CloseReason::Unknown);
        assert!(err.is_none());
    }

    #[test]
    fn test_renewer_lease_lost_wins_over_idle_processor() {
        let renewer = lost();
        let (reason, err) = resolve(None, Some(&renewer), false);
        assert_eq!(reason, CloseReason::LeaseLost);
        assert!(matches!(err, Some(TenureError::LeaseLost { .. })));
    }

    #[test]
    fn test_processor_gone_wins_regardless_of_renewer() {
        let processor = gone();
        for renewer in [None, Some(lost()), Some(exhausted())] {
            let (reason, err) = resolve(Some(&processor), renewer.as_ref(), false);
            assert_eq!(reason, CloseReason::LeaseGone);
            assert!(matches!(err, Some(TenureError::PartitionGone { .. })));
        }
    }

    #[test]
    fn test_processor_lease_lost_maps_to_lease_lost() {
        let processor = lost();
        let (reason, _) = resolve(Some(&processor), None, false);
        assert_eq!(reason, CloseReason::LeaseLost);
    }

    #[test]
    fn test_observer_error_maps_and_propagates() {
        let processor = observer();
        let (reason, err) = resolve(Some(&processor), None, true);
        // A concrete failure beats a concurrent shutdown request.
        assert_eq!(reason, CloseReason::ObserverError);
        assert!(matches!(err, Some(TenureError::Observer { .. })));
    }

    #[test]
    fn test_unclassified_maps_to_unknown_but_propagates() {
        let renewer = exhausted();
        let (reason, err) = resolve(None, Some(&renewer), false);
        assert_eq!(reason, CloseReason::Unknown);
        assert!(matches!(err, Some(TenureError::RetriesExhausted { .. })));
    }
}
