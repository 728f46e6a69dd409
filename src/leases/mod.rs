//! Lease data model and store contract.
//!
//! - [`Lease`] — the shared, partition-scoped ownership record with two
//!   independently mutated cells (continuation / renewal metadata)
//! - [`LeaseSnapshot`] — serializable value handed to the store
//! - [`RenewalState`] — version + expiry refreshed on renew
//! - [`LeaseStore`] — the external store contract

mod lease;
mod store;

pub use lease::{Lease, LeaseSnapshot, RenewalState};
pub use store::LeaseStore;
