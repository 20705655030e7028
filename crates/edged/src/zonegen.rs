//! Zone-gen reconciler: the pull half of change propagation.
//!
//! Even if the orchestrator's push to this node fails, this loop converges
//! the local zone files and manifest to match the store within one tick.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use packetframe_artifacts::{build_manifest, build_zone_file, write_if_diff, zone_file_name, ZoneFileParams};
use packetframe_store::Store;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::center::Center;

pub async fn run(center: Arc<Center>, mut shutdown: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval(center.config.tick_interval());
    loop {
        tokio::select! {
            _ = ticker.tick() => tick(&center).await,
            _ = &mut shutdown => {
                tracing::info!("zone-gen reconciler shutting down");
                return;
            }
        }
    }
}

async fn tick(center: &Arc<Center>) {
    let zones = match center.store.list_zones().await {
        Ok(zones) => zones,
        Err(err) => {
            warn!(%err, "zone-gen: failed to list zones from the store");
            return;
        }
    };

    let params = ZoneFileParams {
        ns1_host: &center.config.ns1_host,
        ns2_host: &center.config.ns2_host,
        soa_admin: &center.config.soa_admin,
        script_ns_host: &center.config.script_ns_host,
        proxy_anycast_v4: &center.config.proxy_anycast_v4,
        proxy_anycast_v6: &center.config.proxy_anycast_v6,
    };

    let mut any_rebuilt = false;
    let mut live_files: HashSet<String> = HashSet::new();

    for zone in &zones {
        live_files.insert(zone_file_name(zone));

        let needs_rebuild = {
            let cache = center.zone_serial_cache.lock().unwrap();
            cache.get(&zone.fqdn).is_none_or(|&cached| cached < zone.serial)
        };
        if !needs_rebuild {
            continue;
        }

        let records = match center.store.list_records(zone.id).await {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, fqdn = %zone.fqdn, "zone-gen: failed to list records");
                continue;
            }
        };

        let contents = build_zone_file(zone, &records, &params);
        let path = center.config.zones_dir.join(zone_file_name(zone));
        match write_if_diff(&path, contents.as_bytes()) {
            Ok(_) => {
                center.zone_serial_cache.lock().unwrap().insert(zone.fqdn.clone(), zone.serial);
                any_rebuilt = true;
                debug!(fqdn = %zone.fqdn, serial = zone.serial, "zone-gen: rewrote zone file");
            }
            Err(err) => error!(%err, fqdn = %zone.fqdn, "zone-gen: failed to write zone file"),
        }
    }

    let mut any_removed = false;
    if let Ok(mut entries) = tokio::fs::read_dir(&center.config.zones_dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            let Ok(name) = entry.file_name().into_string() else { continue };
            if !live_files.contains(&name) {
                if let Err(err) = tokio::fs::remove_file(entry.path()).await {
                    warn!(%err, file = %name, "zone-gen: failed to remove stale zone file");
                } else {
                    any_removed = true;
                }
            }
        }
    }

    let manifest = build_manifest(&zones);
    let manifest_changed = match write_if_diff(&center.config.manifest_path, manifest.as_bytes()) {
        Ok(changed) => changed,
        Err(err) => {
            error!(%err, "zone-gen: failed to write nameserver manifest");
            false
        }
    };

    if any_rebuilt || any_removed || manifest_changed {
        reload_nameserver(center).await;
    }
}

async fn reload_nameserver(center: &Arc<Center>) {
    let outcome = tokio::time::timeout(
        Duration::from_secs(center.config.tick_interval_secs.max(5)),
        run_shell(&center.config.ns_reload_cmd),
    )
    .await;

    match outcome {
        Ok(Ok(status)) if status.success() => debug!("zone-gen: reloaded nameserver"),
        Ok(Ok(status)) => warn!(?status, "zone-gen: nameserver reload command exited non-zero"),
        Ok(Err(err)) => warn!(%err, "zone-gen: failed to spawn nameserver reload command"),
        Err(_) => warn!("zone-gen: nameserver reload command timed out"),
    }
}

async fn run_shell(command: &str) -> std::io::Result<std::process::ExitStatus> {
    tokio::process::Command::new("sh").args(["-c", command]).status().await
}

#[cfg(test)]
mod tests {
    use packetframe_store::RecordType;

    use super::*;
    use crate::testutil::seeded_center;

    #[tokio::test]
    async fn writes_a_zone_file_per_configured_zone() {
        let dir = tempfile::tempdir().unwrap();
        let dir = camino::Utf8Path::from_path(dir.path()).unwrap();
        let (center, user) = seeded_center(dir).await;

        let zone = center.store.create_zone("example.com.", user).await.unwrap();
        center
            .store
            .create_record(zone.id, RecordType::A, "@", "192.0.2.1", 300, false)
            .await
            .unwrap();

        tick(&center).await;

        let path = center.config.zones_dir.join(zone_file_name(&zone));
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.contains("192.0.2.1"));

        let manifest = tokio::fs::read_to_string(&center.config.manifest_path).await.unwrap();
        assert!(manifest.contains("example.com"));
    }

    #[tokio::test]
    async fn stale_zone_file_is_removed_once_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let dir = camino::Utf8Path::from_path(dir.path()).unwrap();
        let (center, user) = seeded_center(dir).await;

        let zone = center.store.create_zone("example.com.", user).await.unwrap();
        tick(&center).await;
        let path = center.config.zones_dir.join(zone_file_name(&zone));
        assert!(path.exists());

        center.store.delete_zone(zone.id).await.unwrap();
        tick(&center).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn unchanged_serial_skips_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let dir = camino::Utf8Path::from_path(dir.path()).unwrap();
        let (center, user) = seeded_center(dir).await;

        let zone = center.store.create_zone("example.com.", user).await.unwrap();
        tick(&center).await;
        let path = center.config.zones_dir.join(zone_file_name(&zone));
        let first_write = tokio::fs::metadata(&path).await.unwrap().modified().unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        tick(&center).await;
        let second_write = tokio::fs::metadata(&path).await.unwrap().modified().unwrap();
        assert_eq!(first_write, second_write);
    }
}
