//! # One fetched slice of a partition's change stream.

use std::sync::Arc;

use serde_json::Value;

/// An ordered batch of change documents plus the continuation token that
/// fetching it advanced to.
///
/// A batch may be empty: the feed cursor can move even when no documents
/// changed (for example when the source compacts or the window expires), so
/// the continuation token is always present and always worth keeping.
#[derive(Clone, Debug)]
pub struct ChangeBatch {
    documents: Vec<Value>,
    continuation: Arc<str>,
}

impl ChangeBatch {
    /// Creates a batch from fetched documents and the post-fetch cursor.
    pub fn new(documents: Vec<Value>, continuation: impl Into<Arc<str>>) -> Self {
        Self {
            documents,
            continuation: continuation.into(),
        }
    }

    /// Creates an empty batch that still advances the cursor.
    pub fn empty(continuation: impl Into<Arc<str>>) -> Self {
        Self::new(Vec::new(), continuation)
    }

    /// The change documents, in feed order.
    pub fn documents(&self) -> &[Value] {
        &self.documents
    }

    /// Number of documents in the batch.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when the fetch returned no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The continuation token to resume from after this batch.
    pub fn continuation(&self) -> Arc<str> {
        Arc::clone(&self.continuation)
    }
}
