//! # Lease: the unit of exclusive ownership over one partition.
//!
//! A [`Lease`] identifies a partition (`lease_token`), names its current
//! owner, and carries two independently mutated pieces of state:
//!
//! - the **continuation token** — the feed cursor, advanced by the
//!   partition processor after each delivered batch;
//! - the **renewal metadata** — version and expiry, refreshed by the lease
//!   renewer from store replies.
//!
//! The two cells are guarded by separate locks because their writers are
//! different tasks and their fields are disjoint; neither writer ever needs
//! the other's lock. External persistence goes through [`LeaseSnapshot`], a
//! plain serializable value captured under both locks; conflict detection on
//! write is the store's job (versioned CAS), not this type's.

use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Renewal metadata refreshed on each successful renew.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalState {
    /// Store-side version used for optimistic (CAS) writes.
    pub version: u64,
    /// Instant after which another worker may take the lease.
    pub expires_at: SystemTime,
}

/// Shared, partition-scoped ownership record.
///
/// Owned exclusively by one `PartitionSupervisor` for the duration of its
/// run and shared (via `Arc`) with that run's processor and renewer.
#[derive(Debug)]
pub struct Lease {
    lease_token: Arc<str>,
    owner: Arc<str>,
    continuation: RwLock<Option<Arc<str>>>,
    renewal: RwLock<RenewalState>,
}

impl Lease {
    /// Creates a lease for `lease_token` owned by `owner`, with no
    /// continuation yet (processing starts from the feed's beginning or
    /// wherever the store seeded it).
    pub fn new(lease_token: impl Into<Arc<str>>, owner: impl Into<Arc<str>>) -> Self {
        Self {
            lease_token: lease_token.into(),
            owner: owner.into(),
            continuation: RwLock::new(None),
            renewal: RwLock::new(RenewalState {
                version: 0,
                expires_at: SystemTime::UNIX_EPOCH,
            }),
        }
    }

    /// Restores a lease from a previously persisted snapshot.
    pub fn from_snapshot(snapshot: LeaseSnapshot) -> Self {
        Self {
            lease_token: snapshot.lease_token,
            owner: snapshot.owner,
            continuation: RwLock::new(snapshot.continuation),
            renewal: RwLock::new(RenewalState {
                version: snapshot.version,
                expires_at: snapshot.expires_at,
            }),
        }
    }

    /// The partition this lease covers.
    pub fn lease_token(&self) -> Arc<str> {
        Arc::clone(&self.lease_token)
    }

    /// The worker identity that holds this lease.
    pub fn owner(&self) -> Arc<str> {
        Arc::clone(&self.owner)
    }

    /// Current continuation token, if any.
    pub fn continuation(&self) -> Option<Arc<str>> {
        self.continuation.read().clone()
    }

    /// Advances the continuation token. Called by the processor only.
    pub fn set_continuation(&self, continuation: impl Into<Arc<str>>) {
        *self.continuation.write() = Some(continuation.into());
    }

    /// Current renewal metadata.
    pub fn renewal(&self) -> RenewalState {
        *self.renewal.read()
    }

    /// Folds a successful renew reply back into the lease. Called by the
    /// renewer only.
    pub fn apply_renewal(&self, renewed: &LeaseSnapshot) {
        let mut renewal = self.renewal.write();
        renewal.version = renewed.version;
        renewal.expires_at = renewed.expires_at;
    }

    /// Captures a consistent value snapshot for a store call.
    pub fn snapshot(&self) -> LeaseSnapshot {
        let renewal = self.renewal();
        LeaseSnapshot {
            lease_token: self.lease_token(),
            owner: self.owner(),
            continuation: self.continuation(),
            version: renewal.version,
            expires_at: renewal.expires_at,
        }
    }
}

/// Serializable value handed to the lease store.
///
/// The store replies to `try_renew` with an updated snapshot (new version,
/// new expiry); [`Lease::apply_renewal`] folds that reply back into the
/// shared record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeaseSnapshot {
    /// The partition this lease covers.
    pub lease_token: Arc<str>,
    /// The worker identity that holds the lease.
    pub owner: Arc<str>,
    /// Feed cursor at snapshot time.
    pub continuation: Option<Arc<str>>,
    /// Store-side version for optimistic writes.
    pub version: u64,
    /// Expiry at snapshot time.
    pub expires_at: SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_disjoint_fields_update_independently() {
        let lease = Lease::new("p-0", "worker-a");

        lease.set_continuation("lsn:10");
        let renewed = LeaseSnapshot {
            lease_token: lease.lease_token(),
            owner: lease.owner(),
            continuation: None,
            version: 7,
            expires_at: SystemTime::UNIX_EPOCH + Duration::from_secs(60),
        };
        lease.apply_renewal(&renewed);

        // Renewal did not clobber the continuation and vice versa.
        assert_eq!(lease.continuation().as_deref(), Some("lsn:10"));
        assert_eq!(lease.renewal().version, 7);

        lease.set_continuation("lsn:11");
        assert_eq!(lease.renewal().version, 7);
        assert_eq!(lease.continuation().as_deref(), Some("lsn:11"));
    }

    #[test]
    fn test_snapshot_captures_both_cells() {
        let lease = Lease::new("p-1", "worker-b");
        lease.set_continuation("lsn:42");

        let snap = lease.snapshot();
        assert_eq!(snap.lease_token.as_ref(), "p-1");
        assert_eq!(snap.owner.as_ref(), "worker-b");
        assert_eq!(snap.continuation.as_deref(), Some("lsn:42"));
        assert_eq!(snap.version, 0);
    }

    #[test]
    fn test_from_snapshot_round_trips() {
        let lease = Lease::new("p-2", "worker-c");
        lease.set_continuation("lsn:5");
        let restored = Lease::from_snapshot(lease.snapshot());

        assert_eq!(restored.lease_token().as_ref(), "p-2");
        assert_eq!(restored.continuation().as_deref(), Some("lsn:5"));
    }
}
