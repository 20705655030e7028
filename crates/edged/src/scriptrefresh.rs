//! Script-DNS refresh reconciler: keeps the registered isolate set in sync
//! with the store's `SCRIPT` records.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::center::Center;

pub async fn run(center: Arc<Center>, mut shutdown: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval(center.config.tick_interval());
    loop {
        tokio::select! {
            _ = ticker.tick() => tick(&center).await,
            _ = &mut shutdown => {
                tracing::info!("script-DNS refresh reconciler shutting down");
                return;
            }
        }
    }
}

pub async fn tick(center: &Arc<Center>) {
    match center.registry.refresh(&center.store).await {
        Ok(()) => debug!(labels = center.registry.len().await, "script-DNS: refreshed handlers"),
        Err(err) => warn!(%err, "script-DNS: refresh failed"),
    }
}

#[cfg(test)]
mod tests {
    use packetframe_store::{RecordType, Store};

    use super::*;
    use crate::testutil::seeded_center;

    #[tokio::test]
    async fn tick_picks_up_script_records_from_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let dir = camino::Utf8Path::from_path(dir.path()).unwrap();
        let (center, user) = seeded_center(dir).await;

        let zone = center.store.create_zone("example.com.", user).await.unwrap();
        center
            .store
            .create_record(
                zone.id,
                RecordType::Script,
                "api",
                "async function handleQuery(q) { return {authoritative: true, rrs: []}; }",
                300,
                false,
            )
            .await
            .unwrap();

        assert_eq!(center.registry.len().await, 0);
        tick(&center).await;
        assert_eq!(center.registry.len().await, 1);

        center.store.delete_zone(zone.id).await.unwrap();
        tick(&center).await;
        assert!(center.registry.is_empty().await);
    }
}
