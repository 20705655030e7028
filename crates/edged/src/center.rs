//! Shared state for the edge agent process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use packetframe_cfg::EdgedConfig;
use packetframe_log::Logger;
use packetframe_scriptdns::ScriptRegistry;
use packetframe_store::AnyStore;

use crate::metrics::MetricsCollection;

/// Shared state every edge reconciler loop reaches through.
pub struct Center {
    pub config: EdgedConfig,
    pub logger: &'static Logger,
    pub store: AnyStore,
    pub registry: ScriptRegistry,
    /// `fqdn -> last-seen serial`, used by the zone-gen reconciler to avoid
    /// rewriting a zone file it has already converged on.
    pub zone_serial_cache: Mutex<HashMap<String, u32>>,
    pub metrics: MetricsCollection,
}

impl Center {
    pub fn new(config: EdgedConfig, logger: &'static Logger, store: AnyStore) -> Arc<Self> {
        Arc::new(Self {
            config,
            logger,
            store,
            registry: ScriptRegistry::new(),
            zone_serial_cache: Mutex::new(HashMap::new()),
            metrics: MetricsCollection::new(),
        })
    }
}
