use std::sync::Arc;

use tokio::runtime::Handle;

use super::{
    config::Config, processor::PartitionProcessor, renewer::LeaseRenewer,
    supervisor::PartitionSupervisor,
};
use crate::events::Bus;
use crate::feed::FeedSource;
use crate::leases::{Lease, LeaseStore};
use crate::observers::ObserverRef;

/// Builder that wires a supervisor's loops from the external collaborators.
///
/// The runtime handle is a required constructor argument on purpose: the
/// loops run wherever the embedding controller says, never on an implicit
/// global default.
pub struct SupervisorBuilder {
    lease: Arc<Lease>,
    observer: ObserverRef,
    store: Arc<dyn LeaseStore>,
    source: Arc<dyn FeedSource>,
    handle: Handle,
    cfg: Config,
    bus: Option<Bus>,
}

impl SupervisorBuilder {
    /// Creates a builder for one partition's supervision runtime.
    pub fn new(
        lease: Arc<Lease>,
        observer: ObserverRef,
        store: Arc<dyn LeaseStore>,
        source: Arc<dyn FeedSource>,
        handle: Handle,
    ) -> Self {
        Self {
            lease,
            observer,
            store,
            source,
            handle,
            cfg: Config::default(),
            bus: None,
        }
    }

    /// Overrides the default [`Config`].
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Shares an existing event bus instead of creating a fresh one.
    ///
    /// Useful when one controller supervises many partitions and wants a
    /// single subscription point.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds the supervisor and its two loops, all bound to the same lease
    /// and bus.
    pub fn build(self) -> Arc<PartitionSupervisor> {
        let bus = self
            .bus
            .unwrap_or_else(|| Bus::new(self.cfg.bus_capacity_clamped()));

        let processor = Arc::new(PartitionProcessor::new(
            Arc::clone(&self.lease),
            self.source,
            Arc::clone(&self.store),
            Arc::clone(&self.observer),
            &self.cfg,
            bus.clone(),
        ));
        let renewer = Arc::new(LeaseRenewer::new(
            Arc::clone(&self.lease),
            self.store,
            &self.cfg,
            bus.clone(),
        ));

        Arc::new(PartitionSupervisor::new(
            self.lease,
            self.observer,
            processor,
            renewer,
            self.handle,
            bus,
        ))
    }
}

impl PartitionSupervisor {
    /// Shorthand for [`SupervisorBuilder::new`].
    pub fn builder(
        lease: Arc<Lease>,
        observer: ObserverRef,
        store: Arc<dyn LeaseStore>,
        source: Arc<dyn FeedSource>,
        handle: Handle,
    ) -> SupervisorBuilder {
        SupervisorBuilder::new(lease, observer, store, source, handle)
    }
}
