//! # Change-feed source contract.
//!
//! The feed source is an external collaborator: it knows how to pull the
//! next page of changes for one partition from the backing store. Wire
//! format, paging, and connection pooling are the implementation's problem;
//! this crate only drives the pull loop.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::feed::ChangeBatch;

/// Contract for pulling change batches for one partition.
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    /// Fetches the next batch of changes after `continuation`.
    ///
    /// `None` means "from the beginning of the retained feed". The returned
    /// batch may be empty but always carries the advanced continuation.
    ///
    /// [`StoreError::PartitionGone`] signals that the partition has split or
    /// been removed (no more data here; successors exist elsewhere);
    /// [`StoreError::Transient`] is retried in place by the caller.
    async fn fetch_next(&self, continuation: Option<&str>) -> Result<ChangeBatch, StoreError>;
}
