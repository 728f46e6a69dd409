//! # Demo: lease_steal
//!
//! Shows the lease-lost path: the store renews twice, then reports the
//! lease as taken by another worker. The renewer stops, the supervisor
//! cancels the processor, and the observer is closed with
//! `CloseReason::LeaseLost`.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► supervisor.run(shutdown)       (shutdown never cancelled)
//!   │     ├─► renewals 1..2 succeed
//!   │     ├─► renewal 3 → LeaseLost    (renewer records terminal error)
//!   │     ├─► processor cancelled      (within one loop wait point)
//!   │     └─► observer.close(LeaseLost)
//!   └─► run returns Err(TenureError::LeaseLost)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example lease_steal
//! ```

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use feedvisor::{
    ChangeBatch, Config, FeedSource, Lease, LeaseSnapshot, LeaseStore, ObserverContext,
    ObserverFn, ObserverRef, PartitionSupervisor, StoreError,
};

/// Feed with nothing to say; the interesting traffic is on the lease side.
struct IdleFeed;

#[async_trait]
impl FeedSource for IdleFeed {
    async fn fetch_next(&self, continuation: Option<&str>) -> Result<ChangeBatch, StoreError> {
        Ok(ChangeBatch::empty(continuation.unwrap_or("lsn:0")))
    }
}

/// Store that lets another worker steal the lease on the third renewal.
struct StealingStore {
    renewals: Mutex<u32>,
}

#[async_trait]
impl LeaseStore for StealingStore {
    async fn try_renew(&self, lease: &LeaseSnapshot) -> Result<LeaseSnapshot, StoreError> {
        let mut renewals = self.renewals.lock().unwrap();
        *renewals += 1;
        if *renewals >= 3 {
            println!("[store] renewal {} refused: lease stolen", *renewals);
            return Err(StoreError::LeaseLost {
                owner: Some("worker-2".into()),
            });
        }
        println!("[store] renewal {} granted", *renewals);
        Ok(LeaseSnapshot {
            version: lease.version + 1,
            expires_at: SystemTime::now() + Duration::from_secs(60),
            ..lease.clone()
        })
    }

    async fn persist(&self, _lease: &LeaseSnapshot) -> Result<(), StoreError> {
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    println!("=== lease_steal demo ===\n");

    let lease = Arc::new(Lease::new("partition-0", "worker-1"));
    let observer: ObserverRef =
        ObserverFn::arc(|_ctx: ObserverContext, _batch: ChangeBatch| async move { Ok(()) });

    let cfg = Config {
        renew_interval: Duration::from_millis(300),
        poll_delay: Duration::from_millis(100),
        ..Config::default()
    };

    let supervisor = PartitionSupervisor::builder(
        lease,
        observer,
        Arc::new(StealingStore {
            renewals: Mutex::new(0),
        }),
        Arc::new(IdleFeed),
        tokio::runtime::Handle::current(),
    )
    .with_config(cfg)
    .build();

    // The caller never asks for shutdown; the store ends the tenure.
    let outcome = supervisor.run(CancellationToken::new()).await;

    println!("\n[main] run returned: {outcome:?}");
    println!("[main] result_error: {:?}", supervisor.result_error());
    Ok(())
}
