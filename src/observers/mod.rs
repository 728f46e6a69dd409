//! # Observer contract and supporting types.
//!
//! This module provides the application-facing callback surface:
//! - [`ChangeFeedObserver`] - trait invoked with each batch of changes
//! - [`ObserverFn`] - function-backed observer implementation
//! - [`ObserverRef`] - shared reference (`Arc<dyn ChangeFeedObserver>`)
//! - [`ObserverContext`] - per-tenure context passed to every callback
//! - [`CloseReason`] - classified cause delivered to `close`

mod close_reason;
mod context;
mod observer;
mod observer_fn;

pub use close_reason::CloseReason;
pub use context::ObserverContext;
pub use observer::{ChangeFeedObserver, ObserverRef};
pub use observer_fn::ObserverFn;
