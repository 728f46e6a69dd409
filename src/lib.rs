//! # feedvisor
//!
//! **Feedvisor** is the partition-supervision core of a change-feed
//! processing engine.
//!
//! It turns one partition of a partitioned, append-only change stream into
//! a crash-tolerant processing tenure: ownership is expressed through a
//! lease held in a shared store, changes are pulled and handed to an
//! application observer in order, and the tenure survives worker crashes,
//! lease theft, and upstream partition splits by ending with a classified
//! close reason the controller can act on.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!            ┌──────────────────┐   (external: acquires/steals leases,
//!            │    Controller    │    one supervisor per owned partition)
//!            └────────┬─────────┘
//!                     │ run(shutdown_token)
//!                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  PartitionSupervisor (per-partition state machine)                │
//! │  - opens/closes the ChangeFeedObserver                            │
//! │  - owns one cancellation token per loop                           │
//! │  - resolves the CloseReason from both loops' terminal results     │
//! └──────┬───────────────────────────────┬────────────────────────────┘
//!        ▼                               ▼
//! ┌──────────────────┐          ┌──────────────────┐
//! │ PartitionProcessor│          │   LeaseRenewer   │
//! │ fetch → dispatch  │          │ renew lease on a │
//! │ → checkpoint loop │          │ fixed interval   │
//! └──┬────────┬───────┘          └────────┬─────────┘
//!    │        │                           │
//!    ▼        ▼                           ▼
//! FeedSource  ChangeFeedObserver      LeaseStore        (collaborator
//! (fetch_next)(open/process/close)    (try_renew/persist) traits)
//!
//! All three publish lifecycle events to a shared broadcast Bus.
//! ```
//!
//! ### Lifecycle
//! ```text
//! Lease acquired ──► PartitionSupervisor::run(shutdown_token)
//!
//! run {
//!   ├─► observer.open(ctx)                 (sync point: before any loop)
//!   ├─► spawn processor.run(proc_token)    (own task on injected handle)
//!   ├─► spawn renewer.run(renew_token)     (own task on injected handle)
//!   ├─► select! { shutdown │ processor done │ renewer done }
//!   ├─► cancel both tokens, join both loops
//!   ├─► resolve CloseReason:
//!   │     processor LeaseLost      ─► LeaseLost
//!   │     either PartitionGone     ─► LeaseGone
//!   │     observer callback failed ─► ObserverError
//!   │     cancellation only        ─► Shutdown  (no error)
//!   │     anything else            ─► Unknown
//!   └─► observer.close(ctx, reason)        (exactly once, after all
//! }                                         process_changes returned)
//! ```
//!
//! ## Features
//! | Area           | Description                                                   | Key types / traits                        |
//! |----------------|---------------------------------------------------------------|-------------------------------------------|
//! | **Supervision**| Per-partition state machine with one deterministic exit path. | [`PartitionSupervisor`], [`CloseReason`]  |
//! | **Processing** | Ordered batch dispatch with at-least-once checkpointing.      | [`PartitionProcessor`], [`ChangeBatch`]   |
//! | **Renewal**    | Keeps the lease fresh; classifies definitive store refusals.  | [`LeaseRenewer`], [`Lease`]               |
//! | **Observers**  | Application callback surface for one partition.               | [`ChangeFeedObserver`], [`ObserverFn`]    |
//! | **Policies**   | Transient-retry backoff with jitter and a streak budget.      | [`RetryPolicy`], [`JitterPolicy`]         |
//! | **Errors**     | Collaborator vs terminal-outcome taxonomy.                    | [`StoreError`], [`TenureError`]           |
//! | **Events**     | Broadcast lifecycle events for controllers/metrics/tests.     | [`Event`], [`EventKind`], [`Bus`]         |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use feedvisor::{
//!     ChangeBatch, Config, Lease, ObserverContext, ObserverFn, ObserverRef,
//!     PartitionSupervisor,
//! };
//! # use feedvisor::{FeedSource, LeaseStore};
//! # fn collaborators() -> (Arc<dyn LeaseStore>, Arc<dyn FeedSource>) { unimplemented!() }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let (store, source) = collaborators();
//!     let lease = Arc::new(Lease::new("partition-0", "worker-1"));
//!
//!     let observer: ObserverRef =
//!         ObserverFn::arc(|ctx: ObserverContext, batch: ChangeBatch| async move {
//!             println!("{}: {} documents", ctx.lease_token(), batch.len());
//!             Ok(())
//!         });
//!
//!     let supervisor = PartitionSupervisor::builder(
//!         lease,
//!         observer,
//!         store,
//!         source,
//!         tokio::runtime::Handle::current(),
//!     )
//!     .with_config(Config::default())
//!     .build();
//!
//!     let shutdown = CancellationToken::new();
//!     supervisor.run(shutdown).await?;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod feed;
mod leases;
mod observers;
mod policies;

// ---- Public re-exports ----

pub use core::{
    Config, LeaseRenewer, OutcomeCell, PartitionProcessor, PartitionSupervisor, SupervisorBuilder,
    SupervisorState,
};
pub use error::{StoreError, TenureError};
pub use events::{Bus, Event, EventKind};
pub use feed::{ChangeBatch, FeedSource};
pub use leases::{Lease, LeaseSnapshot, LeaseStore, RenewalState};
pub use observers::{
    ChangeFeedObserver, CloseReason, ObserverContext, ObserverFn, ObserverRef,
};
pub use policies::{JitterPolicy, RetryPolicy};
