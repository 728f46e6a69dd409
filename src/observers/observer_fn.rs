//! # Function-backed observer (`ObserverFn`)
//!
//! [`ObserverFn`] wraps a closure `F: Fn(ObserverContext, ChangeBatch) -> Fut`,
//! producing a fresh future per batch. Open and close are defaulted, which is
//! what most small consumers and tests want; implement
//! [`ChangeFeedObserver`](crate::ChangeFeedObserver) directly when those
//! hooks matter.
//!
//! ## Example
//! ```rust
//! use feedvisor::{ChangeBatch, ObserverContext, ObserverFn, ObserverRef};
//!
//! let obs: ObserverRef = ObserverFn::arc(|ctx: ObserverContext, batch: ChangeBatch| async move {
//!     println!("{}: {} documents", ctx.lease_token(), batch.len());
//!     Ok(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::feed::ChangeBatch;
use crate::observers::{ChangeFeedObserver, ObserverContext};

/// Function-backed observer implementation.
///
/// Wraps a closure that *creates* a new future per delivered batch.
pub struct ObserverFn<F> {
    f: F,
}

impl<F> ObserverFn<F> {
    /// Creates a new function-backed observer.
    ///
    /// Prefer [`ObserverFn::arc`] when you immediately need an
    /// [`ObserverRef`](crate::ObserverRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the observer and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> ChangeFeedObserver for ObserverFn<F>
where
    F: Fn(ObserverContext, ChangeBatch) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn process_changes(
        &self,
        ctx: &ObserverContext,
        batch: ChangeBatch,
    ) -> anyhow::Result<()> {
        (self.f)(ctx.clone(), batch).await
    }
}
