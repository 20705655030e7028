//! Serves `/metrics` on a listener separate from the RPC surface.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::center::Center;

pub async fn run(center: Arc<Center>, mut shutdown: oneshot::Receiver<()>) {
    let app = Router::new().route("/metrics", get(metrics)).with_state(center.clone());

    let listener = match TcpListener::bind(center.config.metrics_listen).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%err, addr = %center.config.metrics_listen, "failed to bind metrics listener");
            return;
        }
    };
    info!(addr = %center.config.metrics_listen, "metrics unit listening");

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
