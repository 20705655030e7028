//! Reverse-proxy ("caddy") reconciler: renders proxied-domain config and
//! keeps per-domain TLS credentials in sync with the store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use packetframe_artifacts::diskwrite::write_if_diff;
use packetframe_artifacts::proxy::{build_proxy_config, ProxyDomain, ProxyParams};
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
                tracing::info!("proxy reconciler shutting down");
                return;
            }
        }
    }
}

async fn tick(center: &Arc<Center>) {
    let zones = match center.store.list_zones().await {
        Ok(zones) => zones,
        Err(err) => {
            warn!(%err, "proxy: failed to list zones from the store");
            return;
        }
    };

    let mut upstreams_by_domain: HashMap<String, Vec<String>> = HashMap::new();
    for zone in &zones {
        let records = match center.store.list_records(zone.id).await {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, fqdn = %zone.fqdn, "proxy: failed to list records");
                continue;
            }
        };
        for record in records.into_iter().filter(|r| r.proxy) {
            let domain = qualify(&record.label, &zone.fqdn);
            upstreams_by_domain.entry(domain).or_default().push(record.value);
        }
    }

    let mut domains: Vec<ProxyDomain> = upstreams_by_domain
        .into_iter()
        .map(|(domain, upstreams)| ProxyDomain { domain, upstreams })
        .collect();
    domains.sort_by(|a, b| a.domain.cmp(&b.domain));

    let params = ProxyParams {
        node_label: &center.config.node_label,
        acme_responder_addr: center.config.acme_responder_addr,
    };
    let config_text = build_proxy_config(&domains, &params);
    let config_changed = match write_if_diff(&center.config.proxy_config_path, config_text.as_bytes()) {
        Ok(changed) => changed,
        Err(err) => {
            error!(%err, "proxy: failed to write configuration file");
            false
        }
    };

    let credentials_changed = sync_credentials(center).await;

    if config_changed || credentials_changed {
        reload_proxy(center).await;
    }
}

fn qualify(label: &str, fqdn: &str) -> String {
    let fqdn = fqdn.trim_end_matches('.');
    if label == "@" {
        fqdn.to_string()
    } else {
        format!("{label}.{fqdn}")
    }
}

/// Write each credential's cert/key pair on content change, then remove any
/// on-disk pair whose fqdn is no longer in the store. Returns whether any
/// file was written or removed.
async fn sync_credentials(center: &Arc<Center>) -> bool {
    let credentials = match center.store.list_credentials().await {
        Ok(credentials) => credentials,
        Err(err) => {
            warn!(%err, "proxy: failed to list credentials");
            return false;
        }
    };

    let mut changed = false;
    let mut live: HashSet<String> = HashSet::new();

    for cred in &credentials {
        live.insert(cred.fqdn.clone());
        let cert_path = center.config.cert_dir.join(format!("{}.cert", cred.fqdn));
        let key_path = center.config.cert_dir.join(format!("{}.key", cred.fqdn));

        match write_if_diff(&cert_path, cred.certificate_pem.as_bytes()) {
            Ok(true) => {
                changed = true;
                debug!(fqdn = %cred.fqdn, "proxy: wrote certificate");
            }
            Ok(false) => {}
            Err(err) => error!(%err, fqdn = %cred.fqdn, "proxy: failed to write certificate"),
        }

        match write_if_diff(&key_path, cred.private_key_pem.as_bytes()) {
            Ok(true) => {
                changed = true;
                debug!(fqdn = %cred.fqdn, "proxy: wrote private key");
            }
            Ok(false) => {}
            Err(err) => error!(%err, fqdn = %cred.fqdn, "proxy: failed to write private key"),
        }
    }

    let Ok(mut entries) = tokio::fs::read_dir(&center.config.cert_dir).await else {
        return changed;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let Ok(name) = entry.file_name().into_string() else { continue };
        let fqdn = name.strip_suffix(".cert").or_else(|| name.strip_suffix(".key"));
        let Some(fqdn) = fqdn else { continue };
        if !live.contains(fqdn) {
            if let Err(err) = tokio::fs::remove_file(entry.path()).await {
                warn!(%err, file = %name, "proxy: failed to remove stale credential file");
            } else {
                changed = true;
            }
        }
    }

    changed
}

async fn reload_proxy(center: &Arc<Center>) {
    let outcome = tokio::time::timeout(
        Duration::from_secs(center.config.tick_interval_secs.max(5)),
        tokio::process::Command::new("sh").args(["-c", &center.config.proxy_reload_cmd]).status(),
    )
    .await;

    match outcome {
        Ok(Ok(status)) if status.success() => debug!("proxy: reloaded reverse proxy"),
        Ok(Ok(status)) => warn!(?status, "proxy: reload command exited non-zero"),
        Ok(Err(err)) => warn!(%err, "proxy: failed to spawn reload command"),
        Err(_) => warn!("proxy: reload command timed out"),
    }
}

#[cfg(test)]
mod tests {
    use packetframe_store::{AnyStore, Credential, RecordType};

    use super::*;
    use crate::testutil::seeded_center;

    #[test]
    fn qualify_maps_apex_label_to_bare_fqdn() {
        assert_eq!(qualify("@", "example.com."), "example.com");
        assert_eq!(qualify("www", "example.com."), "www.example.com");
    }

    #[tokio::test]
    async fn proxied_records_are_grouped_by_domain() {
        let dir = tempfile::tempdir().unwrap();
        let dir = camino::Utf8Path::from_path(dir.path()).unwrap();
        let (center, user) = seeded_center(dir).await;

        let zone = center.store.create_zone("example.com.", user).await.unwrap();
        center.store.create_record(zone.id, RecordType::A, "www", "10.0.0.1", 300, true).await.unwrap();
        center.store.create_record(zone.id, RecordType::A, "www", "10.0.0.2", 300, true).await.unwrap();
        center.store.create_record(zone.id, RecordType::A, "@", "10.0.0.3", 300, false).await.unwrap();

        tick(&center).await;

        let config = tokio::fs::read_to_string(&center.config.proxy_config_path).await.unwrap();
        assert!(config.contains("www.example.com"));
        assert!(!config.contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn credential_files_are_written_and_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let dir = camino::Utf8Path::from_path(dir.path()).unwrap();
        let (center, _user) = seeded_center(dir).await;

        let AnyStore::Memory(store) = &center.store else { unreachable!() };
        store.seed_credential(Credential {
            fqdn: "www.example.com".into(),
            certificate_pem: "CERT".into(),
            private_key_pem: "KEY".into(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        });

        tick(&center).await;
        let cert_path = center.config.cert_dir.join("www.example.com.cert");
        assert_eq!(tokio::fs::read_to_string(&cert_path).await.unwrap(), "CERT");

        // Credential deletion isn't modeled by `Store`; simulate expiry by
        // emptying the backing map directly and re-ticking.
        store.clear_credentials();
        tick(&center).await;
        assert!(!cert_path.exists());
    }
}
