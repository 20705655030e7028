//! Packetframe's central command: the shared state every unit reaches
//! through.

use std::sync::Arc;

use arc_swap::ArcSwap;
use packetframe_cfg::{NodeFile, OrchestratorConfig};
use packetframe_log::Logger;
use packetframe_store::AnyStore;

use crate::metrics::MetricsCollection;
use crate::queue::Queue;

/// Shared state for the orchestrator process.
pub struct Center {
    pub config: OrchestratorConfig,
    pub logger: &'static Logger,
    pub store: AnyStore,
    pub queue: Queue,
    /// The edge node map, hot-reloaded from disk by the node-watch unit.
    pub nodes: ArcSwap<NodeFile>,
    pub metrics: MetricsCollection,
}

impl Center {
    pub fn new(config: OrchestratorConfig, logger: &'static Logger, store: AnyStore, nodes: NodeFile) -> Arc<Self> {
        Arc::new(Self {
            config,
            logger,
            store,
            queue: Queue::new(),
            nodes: ArcSwap::from_pointee(nodes),
            metrics: MetricsCollection::new(),
        })
    }
}
