//! Maintaining and outputting metrics.
//!
//! Relevant sources for selecting metrics, metric names, and labels:
//! - https://prometheus.io/docs/practices/naming/
//! - https://prometheus.io/docs/instrumenting/writing_exporters/

use core::sync::atomic::AtomicU64;
use std::fmt;
use std::time::Instant;

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::info::Info;
use prometheus_client::registry::{Metric, Registry, Unit};

use packetframe_store::Store;

use crate::center::Center;

const PROMETHEUS_PREFIX: &str = "packetframe_orchestrator";

#[derive(Debug)]
pub struct MetricsCollection {
    pub registry: Registry,
    assemble_time_metric: Gauge<u64, AtomicU64>,
    state_metrics: StateMetrics,
}

impl MetricsCollection {
    pub fn new() -> Self {
        let mut col = Self {
            registry: Registry::with_prefix(PROMETHEUS_PREFIX),
            assemble_time_metric: Default::default(),
            state_metrics: Default::default(),
        };

        let build_info = Info::new(vec![("version", clap::crate_version!())]);
        col.registry.register("build", "Orchestrator build information", build_info);

        col.registry.register_with_unit(
            "metrics_assemble_duration",
            "Time taken to assemble the last metric snapshot",
            Unit::Other("milliseconds".into()),
            col.assemble_time_metric.clone(),
        );

        col.state_metrics.register_metrics(&mut col.registry);

        col
    }

    /// Refresh the metrics that are only known by reading `center` now,
    /// then render the full exposition text.
    pub async fn assemble(&self, center: &Center) -> Result<String, fmt::Error> {
        let start_time = Instant::now();

        self.state_metrics.queue_length.set(center.queue.len() as i64);

        let zones_configured = center.store.list_zones().await.map(|z| z.len() as i64).unwrap_or(-1);
        self.state_metrics.zones_configured.set(zones_configured);
        self.state_metrics.nodes_configured.set(center.nodes.load().nodes.len() as i64);

        let assemble_ms = start_time.elapsed().as_millis() as u64;
        self.assemble_time_metric.set(assemble_ms);

        String::try_from(self)
    }

    pub fn register<N: Into<String>, H: Into<String>>(&mut self, name: N, help: H, metric: impl Metric) {
        self.registry.register(name, help, metric)
    }
}

impl TryFrom<&MetricsCollection> for String {
    type Error = fmt::Error;

    fn try_from(metrics: &MetricsCollection) -> Result<Self, Self::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &metrics.registry)?;
        Ok(buffer)
    }
}

impl Default for MetricsCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct StateMetrics {
    queue_length: Gauge,
    zones_configured: Gauge,
    nodes_configured: Gauge,
}

impl StateMetrics {
    fn register_metrics(&self, reg: &mut Registry) {
        reg.register("queue_length", "Number of messages pending in the change-propagation queue", self.queue_length.clone());
        reg.register("zones_configured", "Number of zones known to the store", self.zones_configured.clone());
        reg.register("nodes_configured", "Number of edge nodes in the node map", self.nodes_configured.clone());
    }
}
