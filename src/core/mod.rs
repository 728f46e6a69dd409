//! Runtime core: one partition's supervision lifecycle.
//!
//! This module contains the embedded implementation of the feedvisor
//! runtime. The public API from this module is [`PartitionSupervisor`]
//! (with [`SupervisorBuilder`]), plus the loop types a controller may build
//! itself and the shared [`Config`].
//!
//! Internal modules:
//! - [`supervisor`]: the state machine — opens the observer, runs both
//!   loops, resolves the close reason, closes the observer;
//! - [`processor`]: pulls change batches and dispatches them to the
//!   observer, checkpointing the continuation token;
//! - [`renewer`]: keeps the lease fresh against the external store;
//! - [`outcome`]: write-once result cells and the close-reason priority
//!   table;
//! - [`builder`]: wires the loops from collaborators;
//! - [`config`]: centralized runtime settings.

mod builder;
mod config;
mod outcome;
mod processor;
mod renewer;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::Config;
pub use outcome::OutcomeCell;
pub use processor::PartitionProcessor;
pub use renewer::LeaseRenewer;
pub use supervisor::{PartitionSupervisor, SupervisorState};
