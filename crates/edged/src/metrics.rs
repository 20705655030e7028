//! Maintaining and serving this node's Prometheus metrics.

use core::sync::atomic::AtomicU64;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::info::Info;
use prometheus_client::registry::{Registry, Unit};
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::center::Center;

const PROMETHEUS_PREFIX: &str = "packetframe_edged";

#[derive(Debug)]
pub struct MetricsCollection {
    registry: Registry,
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
        col.registry.register("build", "Edge agent build information", build_info);

        col.registry.register_with_unit(
            "metrics_assemble_duration",
            "Time taken to assemble the last metric snapshot",
            Unit::Other("milliseconds".into()),
            col.assemble_time_metric.clone(),
        );

        col.state_metrics.register_metrics(&mut col.registry);

        col
    }

    pub async fn assemble(&self, center: &Center) -> Result<String, fmt::Error> {
        let start_time = Instant::now();

        self.state_metrics.script_handlers.set(center.registry.len().await as i64);

        let zones_configured = {
            use packetframe_store::Store;
            center.store.list_zones().await.map(|z| z.len() as i64).unwrap_or(-1)
        };
        self.state_metrics.zones_configured.set(zones_configured);

        let assemble_ms = start_time.elapsed().as_millis() as u64;
        self.assemble_time_metric.set(assemble_ms);

        String::try_from(self)
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
    zones_configured: Gauge,
    script_handlers: Gauge,
}

impl StateMetrics {
    fn register_metrics(&self, reg: &mut Registry) {
        reg.register("zones_configured", "Number of zones known to the store", self.zones_configured.clone());
        reg.register("script_handlers", "Number of compiled SCRIPT-record handlers", self.script_handlers.clone());
    }
}

pub async fn run(center: Arc<Center>, mut shutdown: oneshot::Receiver<()>) {
    let app = Router::new().route("/metrics", get(metrics)).with_state(center.clone());

    let listener = match tokio::net::TcpListener::bind(center.config.metrics_listen).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%err, addr = %center.config.metrics_listen, "metrics: failed to bind listener");
            return;
        }
    };
    info!(addr = %center.config.metrics_listen, "metrics: listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = (&mut shutdown).await;
        })
        .await
        .ok();
}

async fn metrics(State(center): State<Arc<Center>>) -> Response {
    match center.metrics.assemble(&center).await {
        Ok(text) => text.into_response(),
        Err(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
