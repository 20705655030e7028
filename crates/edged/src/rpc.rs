//! The edge agent's RPC surface: a single endpoint to force an immediate
//! script-DNS refresh, bypassing the tick interval.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use tokio::sync::oneshot;
use tracing::info;

use crate::center::Center;
use crate::scriptrefresh;

pub async fn run(center: Arc<Center>, shutdown: oneshot::Receiver<()>) {
    let app = Router::new().route("/refresh", post(refresh)).with_state(center.clone());

    let listener = match tokio::net::TcpListener::bind(center.config.rpc_listen).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%err, addr = %center.config.rpc_listen, "rpc: failed to bind listener");
            return;
        }
    };

    info!(addr = %center.config.rpc_listen, "rpc: listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
        })
        .await
        .ok();
}

async fn refresh(State(center): State<Arc<Center>>) -> Response {
    scriptrefresh::tick(&center).await;
    "refreshed".into_response()
}
