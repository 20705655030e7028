//! The scheduler unit: ticks the change-propagation queue.

use std::sync::Arc;

use camino::Utf8PathBuf;
use packetframe_artifacts::{build_manifest, build_zone_file, write_if_diff, zone_file_name, ZoneFileParams};
use packetframe_store::Store;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::center::Center;
use crate::fanout;
use crate::queue::Operation;

pub async fn run(center: Arc<Center>, mut shutdown: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval(center.config.tick_interval());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let lifespan = center.config.message_lifespan();
                center.queue.tick(lifespan, |op| dispatch(&center, op)).await;
                debug!(queue_length = center.queue.len(), "scheduler tick complete");
            }
            _ = &mut shutdown => {
                info!("scheduler unit shutting down");
                return;
            }
        }
    }
}

/// Dispatch one queue message to completion. Returns `true` on full
/// success (every node pushed and reloaded cleanly).
async fn dispatch(center: &Arc<Center>, operation: Operation) -> bool {
    match operation {
        Operation::ZoneUpdate(zone_id) => dispatch_zone_update(center, zone_id).await,
        Operation::ManifestUpdate => dispatch_manifest_update(center).await,
        Operation::ZonePurge => dispatch_zone_purge(center).await,
    }
}

async fn dispatch_zone_update(center: &Arc<Center>, zone_id: packetframe_store::ZoneId) -> bool {
    let Ok(Some(zone)) = center.store.find_zone(zone_id).await else {
        warn!(%zone_id, "zone-update for unknown zone; dropping");
        return true;
    };

    let Ok(records) = center.store.list_records(zone_id).await else {
        warn!(%zone_id, "failed to list records");
        return false;
    };

    let params = ZoneFileParams {
        ns1_host: &center.config.ns1_host,
        ns2_host: &center.config.ns2_host,
        soa_admin: &center.config.soa_admin,
        script_ns_host: &center.config.script_ns_host,
        proxy_anycast_v4: &center.config.proxy_anycast_v4,
        proxy_anycast_v6: &center.config.proxy_anycast_v6,
    };
    let contents = build_zone_file(&zone, &records, &params);

    let local_path: Utf8PathBuf = center.config.cache_dir.join("zones").join(zone_file_name(&zone));
    match write_if_diff(&local_path, contents.as_bytes()) {
        Ok(false) => {
            debug!(fqdn = %zone.fqdn, "zone file unchanged; deploying anyway to catch drift");
        }
        Err(err) => {
            warn!(%zone_id, %err, "failed to write zone file locally");
            return false;
        }
        Ok(true) => {}
    }

    let ok = push_and_reload(center, &local_path, "/opt/packetframe/dns/zones").await;
    if ok {
        info!(fqdn = %zone.fqdn, serial = zone.serial, "zone update deployed to all nodes");
    }
    ok
}

async fn dispatch_manifest_update(center: &Arc<Center>) -> bool {
    let Ok(zones) = center.store.list_zones().await else {
        warn!("failed to list zones for manifest rebuild");
        return false;
    };

    let contents = build_manifest(&zones);
    let local_path = center.config.cache_dir.join("knot.zones.conf");
    if let Err(err) = write_if_diff(&local_path, contents.as_bytes()) {
        warn!(%err, "failed to write manifest locally");
        return false;
    }

    let ok = push_and_reload(center, &local_path, "/opt/packetframe/dns/knot.zones.conf").await;
    if ok {
        info!(zones = zones.len(), "manifest deployed to all nodes");
    }
    ok
}

async fn dispatch_zone_purge(center: &Arc<Center>) -> bool {
    let Ok(zones) = center.store.list_zones().await else {
        warn!("failed to list zones for purge");
        return false;
    };

    let zones_dir = center.config.cache_dir.join("zones");
    if let Err(err) = std::fs::create_dir_all(&zones_dir) {
        warn!(%err, "failed to ensure zones cache directory exists");
        return false;
    }

    let live: std::collections::HashSet<String> = zones.iter().map(zone_file_name).collect();
    let stale = match std::fs::read_dir(&zones_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(|name| !live.contains(name))
                    .unwrap_or(false)
            })
            .map(|e| e.path())
            .collect::<Vec<_>>(),
        Err(err) => {
            warn!(%err, "failed to read zones cache directory");
            return false;
        }
    };

    for path in &stale {
        if let Err(err) = std::fs::remove_file(path) {
            warn!(path = %path.display(), %err, "failed to remove stale zone file");
            return false;
        }
    }

    let ok = push_and_reload(center, &zones_dir, "/opt/packetframe/dns/zones").await;
    if ok {
        info!(removed = stale.len(), "zone purge deployed to all nodes");
    }
    ok
}

async fn push_and_reload(center: &Arc<Center>, local_path: &Utf8PathBuf, remote_dir: &str) -> bool {
    let nodes = center.nodes.load();
    if nodes.nodes.is_empty() {
        warn!("no edge nodes configured; nothing to fan out to");
        return false;
    }

    let outcomes = fanout::fan_out(
        &center.config.ssh_key,
        center.config.ssh_port,
        &nodes.nodes,
        local_path,
        remote_dir,
        "systemctl reload knot",
        std::time::Duration::from_secs(center.config.subprocess_timeout_secs),
    )
    .await;

    outcomes.iter().all(|o| o.ok)
}
