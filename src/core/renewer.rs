//! # LeaseRenewer: keeps the lease fresh while this worker holds it.
//!
//! Supervises one side of a tenure: periodically renews the bound lease
//! against the external store so that no other worker can take the
//! partition while processing is healthy.
//!
//! ## Loop shape
//! ```text
//! loop {
//!   ├─► cancellable sleep (renew_interval, or retry delay after a
//!   │                      transient failure)
//!   ├─► store.try_renew(lease.snapshot())
//!   │     ├─ Ok(renewed)        → lease.apply_renewal, reset streak,
//!   │     │                       publish LeaseRenewed
//!   │     ├─ Err(Transient)     → grow streak, publish RetryScheduled,
//!   │     │                       continue (never terminal)
//!   │     ├─ Err(LeaseLost)     → record terminal error, publish, exit
//!   │     └─ Err(PartitionGone) → record terminal error, publish, exit
//!   └─ exit conditions:
//!        - token cancelled at a wait point (nothing recorded)
//!        - definitive store signal (terminal error recorded)
//! }
//! ```
//!
//! ## Rules
//! - Transient failures are retried in place with backoff and NEVER end the
//!   loop; conflating them with definitive signals causes spurious partition
//!   abandonment. The definitive signal arrives on its own once another
//!   worker actually takes the lease.
//! - The terminal error is published through a write-once cell; readers on
//!   other tasks see either nothing or the complete value.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::config::Config;
use crate::core::outcome::OutcomeCell;
use crate::error::{StoreError, TenureError};
use crate::events::{Bus, Event, EventKind};
use crate::leases::{Lease, LeaseStore};
use crate::policies::RetryPolicy;

/// Periodically renews one lease until cancelled or until the store gives a
/// definitive refusal.
pub struct LeaseRenewer {
    lease: Arc<Lease>,
    store: Arc<dyn LeaseStore>,
    interval: Duration,
    retry: RetryPolicy,
    bus: Bus,
    result: OutcomeCell,
}

impl LeaseRenewer {
    /// Creates a renewer bound to `lease`.
    pub fn new(lease: Arc<Lease>, store: Arc<dyn LeaseStore>, cfg: &Config, bus: Bus) -> Self {
        Self {
            lease,
            store,
            interval: cfg.renew_interval,
            retry: cfg.retry,
            bus,
            result: OutcomeCell::new(),
        }
    }

    /// Runs the renewal loop until cancellation or a definitive store
    /// signal.
    ///
    /// The first renewal happens one full `renew_interval` after start; the
    /// acquisition that created the lease counts as the renewal at t=0.
    pub async fn run(&self, token: CancellationToken) {
        let lease_token = self.lease.lease_token();
        // Consecutive transient failures; reset on success. The retry
        // budget does not apply here: only definitive signals stop us.
        let mut streak: u32 = 0;

        loop {
            let delay = if streak == 0 {
                self.interval
            } else {
                self.retry.delay_for(streak - 1)
            };
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = token.cancelled() => return,
            }

            match self.store.try_renew(&self.lease.snapshot()).await {
                Ok(renewed) => {
                    self.lease.apply_renewal(&renewed);
                    streak = 0;
                    debug!(lease = %lease_token, version = renewed.version, "lease renewed");
                    self.bus
                        .publish(Event::now(EventKind::LeaseRenewed).with_lease(lease_token.clone()));
                }
                Err(err) if err.is_transient() => {
                    streak += 1;
                    let next = self.retry.delay_for(streak - 1);
                    warn!(
                        lease = %lease_token,
                        attempt = streak,
                        error = %err,
                        "lease renewal failed transiently, retrying"
                    );
                    self.bus.publish(
                        Event::now(EventKind::RetryScheduled)
                            .with_lease(lease_token.clone())
                            .with_attempt(streak)
                            .with_delay(next)
                            .with_reason(err.to_string()),
                    );
                }
                Err(err) => {
                    let kind = match err {
                        StoreError::LeaseLost { .. } => EventKind::LeaseLost,
                        _ => EventKind::PartitionGone,
                    };
                    warn!(lease = %lease_token, error = %err, "lease renewal ended the tenure");
                    self.bus.publish(
                        Event::now(kind)
                            .with_lease(lease_token.clone())
                            .with_reason(err.to_string()),
                    );
                    self.result
                        .record(TenureError::from_store(&lease_token, &err));
                    return;
                }
            }
        }
    }

    /// The recorded terminal error, or `None` if the loop stopped due to
    /// cancellation or has not stopped yet.
    pub fn result_error(&self) -> Option<TenureError> {
        self.result.get().cloned()
    }
}
