//! The orchestrator's RPC surface: the Control API's only way to move
//! change-propagation forward.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::center::Center;

#[derive(Deserialize)]
struct UpdateZoneQuery {
    id: uuid::Uuid,
}

pub async fn run(center: Arc<Center>, mut shutdown: oneshot::Receiver<()>) {
    let app = Router::new()
        .route("/update_zone", get(update_zone))
        .route("/update_manifest", get(update_manifest))
        .route("/purge_zones", get(purge_zones))
        .route("/clear_queue", get(clear_queue))
        .route("/queue_content", get(queue_content))
        .with_state(center.clone());

    let listener = match TcpListener::bind(center.config.rpc_listen).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%err, addr = %center.config.rpc_listen, "failed to bind RPC listener");
            return;
        }
    };
    info!(addr = %center.config.rpc_listen, "RPC unit listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = (&mut shutdown).await;
        })
        .await
        .ok();
}

async fn update_zone(State(center): State<Arc<Center>>, Query(query): Query<UpdateZoneQuery>) -> Response {
    center.queue.enqueue_zone_update(packetframe_store::ZoneId(query.id));
    (StatusCode::ACCEPTED, "zone-update enqueued\n").into_response()
}

async fn update_manifest(State(center): State<Arc<Center>>) -> Response {
    center.queue.enqueue_manifest_update();
    (StatusCode::ACCEPTED, "manifest-update enqueued\n").into_response()
}

async fn purge_zones(State(center): State<Arc<Center>>) -> Response {
    center.queue.enqueue_zone_purge();
    (StatusCode::ACCEPTED, "zone-purge enqueued\n").into_response()
}

async fn clear_queue(State(center): State<Arc<Center>>) -> Response {
    center.queue.clear();
    (StatusCode::OK, "queue cleared\n").into_response()
}

async fn queue_content(State(center): State<Arc<Center>>) -> Response {
    (StatusCode::OK, center.queue.render()).into_response()
}
