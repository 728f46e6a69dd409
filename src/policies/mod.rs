//! Transient-retry policies.
//!
//! This module groups the knobs that control **how long** the loops wait
//! between in-place retries of transient store failures, and **how many**
//! consecutive failures they tolerate.
//!
//! ## Contents
//! - [`RetryPolicy`] delay growth (first / factor / max) plus the streak
//!   budget (`limit`, `0` = unbounded)
//! - [`JitterPolicy`] randomization strategy to avoid synchronized retries
//!
//! ## Quick wiring
//! ```text
//! Config { retry: RetryPolicy, .. }
//!      ├─► core::renewer::LeaseRenewer   (delays only; budget ignored,
//!      │                                  only definitive signals stop it)
//!      └─► core::processor::PartitionProcessor (delays + budget)
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::default()` → first=100ms, factor=2.0, max=30s,
//!   jitter=Equal, limit=8.

mod jitter;
mod retry;

pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
