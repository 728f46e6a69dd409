//! # PartitionProcessor: pulls change batches and dispatches them to the
//! observer.
//!
//! Supervises the other side of a tenure: for as long as this worker owns
//! the partition, fetch the next batch, hand it to the application
//! observer, and checkpoint the advanced continuation token.
//!
//! ## Loop shape
//! ```text
//! loop {
//!   ├─► token cancelled? → exit (nothing recorded)
//!   ├─► source.fetch_next(lease.continuation())
//!   │     ├─ Ok(empty batch)    → advance cursor, publish FeedIdle,
//!   │     │                       cancellable sleep(poll_delay)
//!   │     ├─ Ok(batch)          → observer.process_changes(ctx, batch)
//!   │     │     ├─ Err          → record Observer error, exit
//!   │     │     └─ Ok           → advance cursor, checkpoint to store,
//!   │     │                       publish BatchDelivered + CheckpointSaved
//!   │     ├─ Err(Transient)     → bounded backoff streak; exhausted →
//!   │     │                       record RetriesExhausted, exit
//!   │     └─ Err(definitive)    → record terminal error, exit
//! }
//! ```
//!
//! ## Rules
//! - Batches are delivered in fetch order; there is exactly one in flight.
//! - The continuation token is persisted only **after** the observer
//!   callback returns Ok, so a crash before persistence re-delivers the
//!   batch on the next ownership tenure (at-least-once per partition).
//! - A checkpoint CAS conflict means another worker took the lease while a
//!   batch was in flight; it terminates the loop as lease-lost.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::config::Config;
use crate::core::outcome::OutcomeCell;
use crate::error::{StoreError, TenureError};
use crate::events::{Bus, Event, EventKind};
use crate::feed::FeedSource;
use crate::leases::{Lease, LeaseStore};
use crate::observers::{ObserverContext, ObserverRef};
use crate::policies::RetryPolicy;

/// Pulls and dispatches change batches for one partition until cancelled or
/// until a terminal condition ends the tenure.
pub struct PartitionProcessor {
    lease: Arc<Lease>,
    source: Arc<dyn FeedSource>,
    store: Arc<dyn LeaseStore>,
    observer: ObserverRef,
    ctx: ObserverContext,
    poll_delay: Duration,
    retry: RetryPolicy,
    bus: Bus,
    result: OutcomeCell,
}

impl PartitionProcessor {
    /// Creates a processor bound to `lease`.
    pub fn new(
        lease: Arc<Lease>,
        source: Arc<dyn FeedSource>,
        store: Arc<dyn LeaseStore>,
        observer: ObserverRef,
        cfg: &Config,
        bus: Bus,
    ) -> Self {
        let ctx = ObserverContext::new(lease.lease_token());
        Self {
            lease,
            source,
            store,
            observer,
            ctx,
            poll_delay: cfg.poll_delay,
            retry: cfg.retry,
            bus,
            result: OutcomeCell::new(),
        }
    }

    /// Runs the pull/dispatch loop until cancellation or a terminal
    /// condition.
    pub async fn run(&self, token: CancellationToken) {
        let lease_token = self.lease.lease_token();
        // Consecutive transient fetch failures; reset on any successful
        // fetch. Unlike the renewer, the processor has a budget: a feed
        // that stays unreachable is a terminal condition here.
        let mut streak: u32 = 0;

        loop {
            if token.is_cancelled() {
                return;
            }

            let continuation = self.lease.continuation();
            match self.source.fetch_next(continuation.as_deref()).await {
                Ok(batch) => {
                    streak = 0;
                    let advanced = batch.continuation();

                    if batch.is_empty() {
                        // The cursor moves even with no documents.
                        self.lease.set_continuation(advanced);
                        self.bus.publish(
                            Event::now(EventKind::FeedIdle)
                                .with_lease(lease_token.clone())
                                .with_delay(self.poll_delay),
                        );
                        tokio::select! {
                            _ = time::sleep(self.poll_delay) => {}
                            _ = token.cancelled() => return,
                        }
                        continue;
                    }

                    let count = batch.len();
                    if let Err(err) = self.observer.process_changes(&self.ctx, batch).await {
                        warn!(lease = %lease_token, error = %err, "observer failed, ending tenure");
                        self.bus.publish(
                            Event::now(EventKind::ObserverFailed)
                                .with_lease(lease_token.clone())
                                .with_reason(err.to_string()),
                        );
                        self.result.record(TenureError::Observer {
                            error: err.to_string(),
                        });
                        return;
                    }

                    debug!(lease = %lease_token, count, "batch delivered");
                    self.bus.publish(
                        Event::now(EventKind::BatchDelivered)
                            .with_lease(lease_token.clone())
                            .with_count(count),
                    );

                    self.lease.set_continuation(advanced);
                    if !self.checkpoint(&lease_token, &token).await {
                        return;
                    }
                }
                Err(err) if err.is_transient() => {
                    streak += 1;
                    if self.retry.is_exhausted(streak) {
                        warn!(lease = %lease_token, streak, "fetch retries exhausted");
                        self.result.record(TenureError::RetriesExhausted {
                            attempts: streak,
                            error: err.to_string(),
                        });
                        return;
                    }
                    let delay = self.retry.delay_for(streak - 1);
                    self.bus.publish(
                        Event::now(EventKind::RetryScheduled)
                            .with_lease(lease_token.clone())
                            .with_attempt(streak)
                            .with_delay(delay)
                            .with_reason(err.to_string()),
                    );
                    tokio::select! {
                        _ = time::sleep(delay) => {}
                        _ = token.cancelled() => return,
                    }
                }
                Err(err) => {
                    warn!(lease = %lease_token, error = %err, "fetch ended the tenure");
                    self.bus.publish(
                        Event::now(EventKind::PartitionGone)
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

    /// Persists the advanced continuation token, retrying transient store
    /// failures with its own bounded streak.
    ///
    /// Returns `false` when the loop must stop: a terminal error was
    /// recorded, or cancellation interrupted a retry wait (nothing
    /// recorded; the unsaved checkpoint re-delivers on the next tenure).
    async fn checkpoint(&self, lease_token: &Arc<str>, token: &CancellationToken) -> bool {
        let mut streak: u32 = 0;
        loop {
            match self.store.persist(&self.lease.snapshot()).await {
                Ok(()) => {
                    self.bus
                        .publish(Event::now(EventKind::CheckpointSaved).with_lease(lease_token.clone()));
                    return true;
                }
                Err(err) if err.is_transient() => {
                    streak += 1;
                    if self.retry.is_exhausted(streak) {
                        warn!(lease = %lease_token, streak, "checkpoint retries exhausted");
                        self.result.record(TenureError::RetriesExhausted {
                            attempts: streak,
                            error: err.to_string(),
                        });
                        return false;
                    }
                    let delay = self.retry.delay_for(streak - 1);
                    self.bus.publish(
                        Event::now(EventKind::RetryScheduled)
                            .with_lease(lease_token.clone())
                            .with_attempt(streak)
                            .with_delay(delay)
                            .with_reason(err.to_string()),
                    );
                    tokio::select! {
                        _ = time::sleep(delay) => {}
                        _ = token.cancelled() => return false,
                    }
                }
                Err(err) => {
                    // Usually a CAS conflict: the lease moved while a batch
                    // was in flight.
                    let kind = match err {
                        StoreError::LeaseLost { .. } => EventKind::LeaseLost,
                        _ => EventKind::PartitionGone,
                    };
                    warn!(lease = %lease_token, error = %err, "checkpoint ended the tenure");
                    self.bus.publish(
                        Event::now(kind)
                            .with_lease(lease_token.clone())
                            .with_reason(err.to_string()),
                    );
                    self.result
                        .record(TenureError::from_store(lease_token, &err));
                    return false;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ChangeBatch;
    use crate::leases::LeaseSnapshot;
    use crate::observers::ChangeFeedObserver;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Feed that replays scripted fetch results, then reports an idle feed
    /// at the last continuation forever.
    struct ScriptedFeed {
        script: Mutex<VecDeque<Result<ChangeBatch, StoreError>>>,
        idle_continuation: Arc<str>,
    }

    impl ScriptedFeed {
        fn new(script: Vec<Result<ChangeBatch, StoreError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                idle_continuation: Arc::from("idle"),
            })
        }
    }

    #[async_trait]
    impl FeedSource for ScriptedFeed {
        async fn fetch_next(&self, continuation: Option<&str>) -> Result<ChangeBatch, StoreError> {
            match self.script.lock().unwrap().pop_front() {
                Some(step) => step,
                None => Ok(ChangeBatch::empty(
                    continuation.unwrap_or(&*self.idle_continuation),
                )),
            }
        }
    }

    /// Store that records every persisted snapshot; persist outcomes can be
    /// scripted ahead of time.
    struct RecordingStore {
        persisted: Mutex<Vec<LeaseSnapshot>>,
        persist_script: Mutex<VecDeque<Result<(), StoreError>>>,
    }

    impl RecordingStore {
        fn new() -> Arc<Self> {
            Self::scripted(vec![])
        }

        fn scripted(persist_script: Vec<Result<(), StoreError>>) -> Arc<Self> {
            Arc::new(Self {
                persisted: Mutex::new(Vec::new()),
                persist_script: Mutex::new(persist_script.into()),
            })
        }

        fn continuations(&self) -> Vec<String> {
            self.persisted
                .lock()
                .unwrap()
                .iter()
                .filter_map(|s| s.continuation.as_deref().map(String::from))
                .collect()
        }
    }

    #[async_trait]
    impl LeaseStore for RecordingStore {
        async fn try_renew(&self, lease: &LeaseSnapshot) -> Result<LeaseSnapshot, StoreError> {
            Ok(lease.clone())
        }

        async fn persist(&self, lease: &LeaseSnapshot) -> Result<(), StoreError> {
            if let Some(step) = self.persist_script.lock().unwrap().pop_front() {
                step?;
            }
            self.persisted.lock().unwrap().push(lease.clone());
            Ok(())
        }
    }

    /// Observer that logs batch sizes and can be scripted to fail on the
    /// nth delivery (1-based).
    struct LoggingObserver {
        seen: Mutex<Vec<usize>>,
        fail_on: Option<usize>,
    }

    impl LoggingObserver {
        fn new(fail_on: Option<usize>) -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
                fail_on,
            })
        }
    }

    #[async_trait]
    impl ChangeFeedObserver for LoggingObserver {
        async fn process_changes(
            &self,
            _ctx: &ObserverContext,
            batch: ChangeBatch,
        ) -> anyhow::Result<()> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(batch.len());
            if self.fail_on == Some(seen.len()) {
                anyhow::bail!("handler rejected batch {}", seen.len());
            }
            Ok(())
        }
    }

    fn batch(n: usize, continuation: &str) -> ChangeBatch {
        let docs = (0..n).map(|i| json!({ "id": i })).collect();
        ChangeBatch::new(docs, continuation)
    }

    fn fast_config() -> Config {
        Config {
            poll_delay: Duration::from_millis(5),
            retry: RetryPolicy {
                first: Duration::from_millis(1),
                max: Duration::from_millis(4),
                factor: 2.0,
                jitter: crate::policies::JitterPolicy::None,
                limit: 3,
            },
            ..Config::default()
        }
    }

    fn processor_with(
        source: Arc<ScriptedFeed>,
        store: Arc<RecordingStore>,
        observer: Arc<LoggingObserver>,
    ) -> Arc<PartitionProcessor> {
        let lease = Arc::new(Lease::new("p-0", "worker-a"));
        let cfg = fast_config();
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Arc::new(PartitionProcessor::new(
            lease, source, store, observer, &cfg, bus,
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivers_in_order_and_checkpoints_after_callback() {
        let source = ScriptedFeed::new(vec![
            Ok(batch(1, "c1")),
            Ok(batch(2, "c2")),
            Ok(batch(3, "c3")),
        ]);
        let store = RecordingStore::new();
        let observer = LoggingObserver::new(None);
        let processor = processor_with(source, store.clone(), observer.clone());

        let token = CancellationToken::new();
        let handle = tokio::spawn({
            let processor = processor.clone();
            let token = token.clone();
            async move { processor.run(token).await }
        });

        time::sleep(Duration::from_millis(50)).await;
        token.cancel();
        handle.await.unwrap();

        assert_eq!(*observer.seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(store.continuations(), vec!["c1", "c2", "c3"]);
        assert!(processor.result_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batches_advance_cursor_without_checkpoint() {
        let source = ScriptedFeed::new(vec![Ok(ChangeBatch::empty("c5"))]);
        let store = RecordingStore::new();
        let observer = LoggingObserver::new(None);
        let processor = processor_with(source, store.clone(), observer.clone());

        let token = CancellationToken::new();
        let handle = tokio::spawn({
            let processor = processor.clone();
            let token = token.clone();
            async move { processor.run(token).await }
        });

        time::sleep(Duration::from_millis(20)).await;
        token.cancel();
        handle.await.unwrap();

        assert!(observer.seen.lock().unwrap().is_empty());
        assert!(store.continuations().is_empty(), "no checkpoint while idle");
        assert!(processor.result_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_failure_is_terminal_and_skips_checkpoint() {
        let source = ScriptedFeed::new(vec![Ok(batch(1, "c1")), Ok(batch(1, "c2"))]);
        let store = RecordingStore::new();
        let observer = LoggingObserver::new(Some(2));
        let processor = processor_with(source, store.clone(), observer.clone());

        let handle = tokio::spawn({
            let processor = processor.clone();
            async move { processor.run(CancellationToken::new()).await }
        });
        handle.await.unwrap();

        assert_eq!(*observer.seen.lock().unwrap(), vec![1, 1]);
        // The failed batch's continuation was never persisted: at-least-once.
        assert_eq!(store.continuations(), vec!["c1"]);
        assert!(matches!(
            processor.result_error(),
            Some(TenureError::Observer { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partition_gone_is_terminal() {
        let source = ScriptedFeed::new(vec![Ok(batch(1, "c1")), Err(StoreError::PartitionGone)]);
        let store = RecordingStore::new();
        let observer = LoggingObserver::new(None);
        let processor = processor_with(source, store, observer);

        let handle = tokio::spawn({
            let processor = processor.clone();
            async move { processor.run(CancellationToken::new()).await }
        });
        handle.await.unwrap();

        assert!(matches!(
            processor.result_error(),
            Some(TenureError::PartitionGone { lease }) if lease == "p-0"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_retries_exhaust_into_terminal_error() {
        let script = (0..10).map(|_| Err(StoreError::transient("down"))).collect();
        let source = ScriptedFeed::new(script);
        let store = RecordingStore::new();
        let observer = LoggingObserver::new(None);
        let processor = processor_with(source, store, observer);

        let handle = tokio::spawn({
            let processor = processor.clone();
            async move { processor.run(CancellationToken::new()).await }
        });
        handle.await.unwrap();

        assert!(matches!(
            processor.result_error(),
            Some(TenureError::RetriesExhausted { attempts: 4, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkpoint_cas_conflict_is_lease_lost() {
        let source = ScriptedFeed::new(vec![Ok(batch(1, "c1"))]);
        let store = RecordingStore::scripted(vec![Err(StoreError::LeaseLost {
            owner: Some("worker-b".into()),
        })]);
        let observer = LoggingObserver::new(None);
        let processor = processor_with(source, store.clone(), observer.clone());

        let handle = tokio::spawn({
            let processor = processor.clone();
            async move { processor.run(CancellationToken::new()).await }
        });
        handle.await.unwrap();

        // The batch was delivered, but its checkpoint lost the CAS race.
        assert_eq!(*observer.seen.lock().unwrap(), vec![1]);
        assert!(store.continuations().is_empty());
        assert!(matches!(
            processor.result_error(),
            Some(TenureError::LeaseLost { .. })
        ));
    }
}
