//! # Lease store contract.
//!
//! The lease store is an external collaborator: a shared, durable registry
//! of which worker owns which partition. This crate only consumes the
//! contract; persistence format, CAS mechanics, and transport belong to the
//! implementation.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::leases::LeaseSnapshot;

/// Contract for the shared lease store.
///
/// Implementations must use their own optimistic-concurrency discipline
/// (the snapshot's `version`) so that concurrent writers cannot silently
/// overwrite each other; a failed CAS against a lease now held by someone
/// else surfaces as [`StoreError::LeaseLost`].
#[async_trait]
pub trait LeaseStore: Send + Sync + 'static {
    /// Attempts to renew `lease` for its current owner.
    ///
    /// Returns the renewed snapshot (new version, new expiry) on success.
    /// Definitive failures are [`StoreError::LeaseLost`] (the record is gone
    /// or owned by someone else) and [`StoreError::PartitionGone`] (the
    /// physical partition no longer exists); anything retriable is
    /// [`StoreError::Transient`].
    async fn try_renew(&self, lease: &LeaseSnapshot) -> Result<LeaseSnapshot, StoreError>;

    /// Persists the lease record, primarily to checkpoint an advanced
    /// continuation token.
    ///
    /// A CAS conflict against a stolen lease surfaces as
    /// [`StoreError::LeaseLost`]; checkpointing is usually where a theft
    /// first becomes visible to the processing side.
    async fn persist(&self, lease: &LeaseSnapshot) -> Result<(), StoreError>;
}
