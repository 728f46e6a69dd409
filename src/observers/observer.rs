//! # Observer contract: the application's view of one partition.
//!
//! A [`ChangeFeedObserver`] is supplied by the application and invoked by
//! the runtime with each batch of changes for one partition. The common
//! handle type is [`ObserverRef`], an `Arc<dyn ChangeFeedObserver>` suitable
//! for sharing between the supervisor (open/close) and the processor
//! (process_changes).
//!
//! ## Invocation guarantees
//! - `open` completes before any `process_changes`.
//! - `process_changes` calls arrive one at a time, in feed order.
//! - `close` runs exactly once per opened tenure, after every
//!   `process_changes` call has returned.
//!
//! A `process_changes` failure is fatal to the current ownership tenure:
//! the runtime never retries the callback, it relinquishes the partition
//! with [`CloseReason::ObserverError`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::feed::ChangeBatch;
use crate::observers::{CloseReason, ObserverContext};

/// Shared handle to an observer.
pub type ObserverRef = Arc<dyn ChangeFeedObserver>;

/// # Application-supplied change handler for one partition.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use feedvisor::{ChangeBatch, ChangeFeedObserver, CloseReason, ObserverContext};
///
/// struct Printer;
///
/// #[async_trait]
/// impl ChangeFeedObserver for Printer {
///     async fn process_changes(
///         &self,
///         ctx: &ObserverContext,
///         batch: ChangeBatch,
///     ) -> anyhow::Result<()> {
///         println!("{}: {} documents", ctx.lease_token(), batch.len());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait ChangeFeedObserver: Send + Sync + 'static {
    /// Called once, before processing starts for this tenure.
    ///
    /// Failing here aborts the run before either loop starts.
    async fn open(&self, _ctx: &ObserverContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called with each non-empty batch, in feed order.
    ///
    /// Returning an error ends the tenure with
    /// [`CloseReason::ObserverError`]; the batch's continuation token is not
    /// checkpointed, so the batch is re-delivered on the next tenure.
    async fn process_changes(
        &self,
        ctx: &ObserverContext,
        batch: ChangeBatch,
    ) -> anyhow::Result<()>;

    /// Called exactly once per opened tenure with the classified cause.
    ///
    /// Must not fail; the signature enforces it.
    async fn close(&self, _ctx: &ObserverContext, _reason: CloseReason) {}
}
