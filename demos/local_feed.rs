//! # Demo: local_feed
//!
//! Runs one partition supervisor end-to-end against in-memory
//! collaborators: a feed that produces a few batches then goes idle, and a
//! lease store that always renews.
//!
//! Shows how to:
//! - Implement [`FeedSource`] and [`LeaseStore`] for a toy backend
//! - Wire a supervisor with [`PartitionSupervisor::builder`]
//! - Watch lifecycle events on the [`Bus`]
//! - Stop cleanly with the shutdown token → `close(Shutdown)`
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► spawn supervisor.run(shutdown)
//!   │     ├─► observer.open
//!   │     ├─► processor delivers 3 batches, checkpoints each
//!   │     └─► feed goes idle (FeedIdle events)
//!   ├─► event listener prints Bus traffic
//!   ├─► sleep, then shutdown.cancel()
//!   └─► run returns Ok(()), observer.close(Shutdown)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example local_feed
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use feedvisor::{
    ChangeBatch, Config, FeedSource, JitterPolicy, Lease, LeaseSnapshot, LeaseStore,
    ObserverContext, ObserverFn, ObserverRef, PartitionSupervisor, RetryPolicy, StoreError,
};

/// Feed that serves a fixed set of batches, then stays idle.
struct LocalFeed {
    batches: Mutex<VecDeque<ChangeBatch>>,
}

#[async_trait]
impl FeedSource for LocalFeed {
    async fn fetch_next(&self, continuation: Option<&str>) -> Result<ChangeBatch, StoreError> {
        match self.batches.lock().unwrap().pop_front() {
            Some(batch) => Ok(batch),
            None => Ok(ChangeBatch::empty(continuation.unwrap_or("lsn:0"))),
        }
    }
}

/// Store that renews unconditionally and remembers the last checkpoint.
struct LocalStore {
    version: Mutex<u64>,
}

#[async_trait]
impl LeaseStore for LocalStore {
    async fn try_renew(&self, lease: &LeaseSnapshot) -> Result<LeaseSnapshot, StoreError> {
        let mut version = self.version.lock().unwrap();
        *version += 1;
        Ok(LeaseSnapshot {
            version: *version,
            expires_at: SystemTime::now() + Duration::from_secs(60),
            ..lease.clone()
        })
    }

    async fn persist(&self, lease: &LeaseSnapshot) -> Result<(), StoreError> {
        println!(
            "[store] checkpoint lease={} continuation={:?}",
            lease.lease_token, lease.continuation
        );
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    println!("=== local_feed demo ===\n");

    let batches = (1..=3)
        .map(|i| {
            ChangeBatch::new(
                vec![json!({ "id": i, "op": "upsert" })],
                format!("lsn:{i}"),
            )
        })
        .collect();
    let source = Arc::new(LocalFeed {
        batches: Mutex::new(batches),
    });
    let store = Arc::new(LocalStore {
        version: Mutex::new(0),
    });

    let lease = Arc::new(Lease::new("partition-0", "worker-1"));
    let observer: ObserverRef =
        ObserverFn::arc(|ctx: ObserverContext, batch: ChangeBatch| async move {
            println!(
                "[observer] {}: {} documents up to {}",
                ctx.lease_token(),
                batch.len(),
                batch.continuation()
            );
            Ok(())
        });

    let cfg = Config {
        renew_interval: Duration::from_millis(500),
        poll_delay: Duration::from_millis(200),
        retry: RetryPolicy {
            jitter: JitterPolicy::Equal,
            ..RetryPolicy::default()
        },
        ..Config::default()
    };

    let supervisor = PartitionSupervisor::builder(
        lease,
        observer,
        store,
        source,
        tokio::runtime::Handle::current(),
    )
    .with_config(cfg)
    .build();

    // Print every lifecycle event the runtime publishes.
    let mut events = supervisor.bus().subscribe();
    tokio::spawn(async move {
        while let Ok(ev) = events.recv().await {
            println!("[event] seq={} kind={:?}", ev.seq, ev.kind);
        }
    });

    let shutdown = CancellationToken::new();
    let run = tokio::spawn({
        let supervisor = Arc::clone(&supervisor);
        let shutdown = shutdown.clone();
        async move { supervisor.run(shutdown).await }
    });

    tokio::time::sleep(Duration::from_secs(2)).await;
    println!("\n[main] requesting shutdown");
    shutdown.cancel();

    run.await??;
    println!(
        "[main] tenure ended cleanly, result_error={:?}",
        supervisor.result_error()
    );
    Ok(())
}
