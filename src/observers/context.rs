//! # Per-run observer context.

use std::sync::Arc;

/// Ephemeral context handed to every observer callback of one tenure.
///
/// One logical context exists per supervisor run; it is cheap to clone and
/// currently carries only the lease token, which is what an application
/// observer needs to key its own per-partition state.
#[derive(Clone, Debug)]
pub struct ObserverContext {
    lease_token: Arc<str>,
}

impl ObserverContext {
    /// Creates a context for the given partition.
    pub fn new(lease_token: impl Into<Arc<str>>) -> Self {
        Self {
            lease_token: lease_token.into(),
        }
    }

    /// The partition this tenure is processing.
    pub fn lease_token(&self) -> &str {
        &self.lease_token
    }
}
