//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the supervisor, the
//! partition processor, and the lease renewer.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `PartitionSupervisor`, `PartitionProcessor`,
//!   `LeaseRenewer`.
//! - **Consumers**: whatever the embedding controller wires up (metrics,
//!   structured logs, tests asserting lifecycle ordering).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
