//! # PartitionSupervisor: one partition's supervision state machine.
//!
//! Owns one [`Lease`], one observer, one [`PartitionProcessor`], and one
//! [`LeaseRenewer`]; runs the two loops concurrently, waits for the first
//! terminal condition, stops both, and drives the observer's open/close
//! lifecycle with a deterministically resolved [`CloseReason`].
//!
//! ## States
//! ```text
//! Created ──run()──► Running ──terminal condition──► Stopping ──► Closed
//!
//! Running:
//!   ├─► observer.open(ctx)                  (before anything else; a
//!   │                                        failure aborts the run here)
//!   ├─► spawn processor.run(proc_token)     (own task on the injected
//!   ├─► spawn renewer.run(renew_token)       runtime handle: a blocked
//!   │                                        loop cannot starve anything)
//!   └─► select! {
//!         shutdown.cancelled()              (caller-driven)
//!         processor task completed          (its result cell is written)
//!         renewer task completed            (its result cell is written)
//!       }
//!
//! Stopping:
//!   ├─► cancel BOTH tokens                  (order-independent; both must
//!   │                                        stop even if only one failed)
//!   ├─► join both tasks                     (guarantees close runs after
//!   │                                        every process_changes returned)
//!   ├─► resolve close reason                (core::outcome priority table)
//!   └─► observer.close(ctx, reason)         (exactly once, on every path
//!                                            that opened the observer)
//! ```
//!
//! ## Rules
//! - `run` is one-shot; a second call fails fast without touching the
//!   observer.
//! - Either loop failing must not leave the other running unbounded: both
//!   tokens are cancelled no matter which condition fired.
//! - The close reason reflects both loops' results evaluated after both
//!   were asked to stop, not whichever completed first; the resolution
//!   table lives in `core::outcome` where it is unit-tested in isolation.
//! - Waiting is completion-driven (`select!` over the join handles), so a
//!   renewal failure halts processing at the next loop wait point instead
//!   of after a fixed monitor poll.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering as AtomicOrdering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::outcome::{resolve, OutcomeCell};
use crate::core::processor::PartitionProcessor;
use crate::core::renewer::LeaseRenewer;
use crate::error::TenureError;
use crate::events::{Bus, Event, EventKind};
use crate::leases::Lease;
use crate::observers::{ObserverContext, ObserverRef};

/// Lifecycle state of one supervisor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Constructed; `run` has not been called.
    Created,
    /// Observer opened, both loops live.
    Running,
    /// A terminal condition was observed; loops are being stopped.
    Stopping,
    /// The run finished (or aborted during open / reentrant call).
    Closed,
}

const STATE_CREATED: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_STOPPING: u8 = 2;
const STATE_CLOSED: u8 = 3;

fn state_from(v: u8) -> SupervisorState {
    match v {
        STATE_CREATED => SupervisorState::Created,
        STATE_RUNNING => SupervisorState::Running,
        STATE_STOPPING => SupervisorState::Stopping,
        _ => SupervisorState::Closed,
    }
}

/// Supervises one partition's processing tenure.
///
/// Created per lease-acquisition event, run exactly once, then discarded;
/// whether to re-acquire the partition later is the controller's decision.
pub struct PartitionSupervisor {
    lease: Arc<Lease>,
    observer: ObserverRef,
    processor: Arc<PartitionProcessor>,
    renewer: Arc<LeaseRenewer>,
    handle: Handle,
    bus: Bus,
    state: AtomicU8,
    result: OutcomeCell,
    /// Per-run loop tokens, kept so `dispose` can stop an abandoned run.
    loop_tokens: Mutex<Option<(CancellationToken, CancellationToken)>>,
}

impl PartitionSupervisor {
    /// Creates a supervisor from pre-built parts.
    ///
    /// The controller typically builds the observer, processor, and renewer
    /// bound to one lease and hands them over here, together with the
    /// runtime handle the loops must run on. See
    /// [`SupervisorBuilder`](crate::core::SupervisorBuilder) for the
    /// convenience path that wires the loops from collaborators.
    pub fn new(
        lease: Arc<Lease>,
        observer: ObserverRef,
        processor: Arc<PartitionProcessor>,
        renewer: Arc<LeaseRenewer>,
        handle: Handle,
        bus: Bus,
    ) -> Self {
        Self {
            lease,
            observer,
            processor,
            renewer,
            handle,
            bus,
            state: AtomicU8::new(STATE_CREATED),
            result: OutcomeCell::new(),
            loop_tokens: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SupervisorState {
        state_from(self.state.load(AtomicOrdering::Acquire))
    }

    /// The event bus this tenure publishes to.
    ///
    /// Subscribe here to watch lifecycle events (deliveries, renewals,
    /// close) from the controller, metrics, or tests.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs the tenure until cooperative shutdown or a terminal failure.
    ///
    /// `shutdown` is the only caller-driven cancellation input; it is
    /// checked and selected on, never blocked on. Returns `Ok(())` for a
    /// clean shutdown, otherwise the single terminal error that also
    /// determined the observer's close reason.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), TenureError> {
        if self
            .state
            .compare_exchange(
                STATE_CREATED,
                STATE_RUNNING,
                AtomicOrdering::AcqRel,
                AtomicOrdering::Acquire,
            )
            .is_err()
        {
            return Err(TenureError::Internal {
                error: "supervisor run is not reentrant".into(),
            });
        }

        let lease_token = self.lease.lease_token();
        let ctx = ObserverContext::new(lease_token.clone());

        info!(lease = %lease_token, "tenure starting");
        self.bus
            .publish(Event::now(EventKind::TenureStarted).with_lease(lease_token.clone()));

        // Open before anything else starts; a failure here aborts the run
        // without spawning either loop and without a close call (the tenure
        // never opened).
        if let Err(err) = self.observer.open(&ctx).await {
            warn!(lease = %lease_token, error = %err, "observer open failed");
            let err = TenureError::Observer {
                error: err.to_string(),
            };
            self.result.record(err.clone());
            self.state.store(STATE_CLOSED, AtomicOrdering::Release);
            return Err(err);
        }
        self.bus
            .publish(Event::now(EventKind::ObserverOpened).with_lease(lease_token.clone()));

        let proc_token = CancellationToken::new();
        let renew_token = CancellationToken::new();
        *self.loop_tokens.lock() =
            Some((proc_token.clone(), renew_token.clone()));

        let mut proc_handle = self.handle.spawn({
            let processor = Arc::clone(&self.processor);
            let token = proc_token.clone();
            async move { processor.run(token).await }
        });
        let mut renew_handle = self.handle.spawn({
            let renewer = Arc::clone(&self.renewer);
            let token = renew_token.clone();
            async move { renewer.run(token).await }
        });

        // First terminal condition: caller shutdown, or either loop
        // finishing (each loop writes its result cell before returning, so
        // a completed handle implies a readable result).
        let mut proc_join = None;
        let mut renew_join = None;
        tokio::select! {
            _ = shutdown.cancelled() => {}
            r = &mut proc_handle => proc_join = Some(r),
            r = &mut renew_handle => renew_join = Some(r),
        }

        self.state.store(STATE_STOPPING, AtomicOrdering::Release);
        self.bus
            .publish(Event::now(EventKind::TenureStopping).with_lease(lease_token.clone()));

        // Both, unconditionally: the loop that did not trigger the stop
        // must still be told to wind down.
        proc_token.cancel();
        renew_token.cancel();

        // Joining both is what makes close-after-all-deliveries hold.
        let proc_join = match proc_join {
            Some(r) => r,
            None => (&mut proc_handle).await,
        };
        let renew_join = match renew_join {
            Some(r) => r,
            None => (&mut renew_handle).await,
        };

        let proc_result = self.processor.result_error().or_else(|| {
            proc_join.err().map(|e| TenureError::Internal {
                error: format!("processor task failed: {e}"),
            })
        });
        let renew_result = self.renewer.result_error().or_else(|| {
            renew_join.err().map(|e| TenureError::Internal {
                error: format!("renewer task failed: {e}"),
            })
        });

        let (reason, err) = resolve(
            proc_result.as_ref(),
            renew_result.as_ref(),
            shutdown.is_cancelled(),
        );
        if let Some(err) = &err {
            self.result.record(err.clone());
        }

        self.observer.close(&ctx, reason).await;
        info!(lease = %lease_token, reason = reason.as_label(), "tenure closed");
        self.bus.publish(
            Event::now(EventKind::ObserverClosed)
                .with_lease(lease_token)
                .with_close_reason(reason),
        );
        self.state.store(STATE_CLOSED, AtomicOrdering::Release);

        match err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// The terminal error chosen for this run, or `None` for a clean
    /// shutdown (or a run that has not reached its terminal condition).
    pub fn result_error(&self) -> Option<TenureError> {
        self.result.get().cloned()
    }

    /// Stops both loops of an in-flight or abandoned run.
    ///
    /// Idempotent; safe to call before, during, or after `run`, any number
    /// of times. Also invoked on drop.
    pub fn dispose(&self) {
        if let Some((proc_token, renew_token)) = &*self.loop_tokens.lock()
        {
            proc_token.cancel();
            renew_token.cancel();
        }
    }
}

impl Drop for PartitionSupervisor {
    fn drop(&mut self) {
        self.dispose();
    }
}
