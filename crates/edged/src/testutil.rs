//! Shared fixtures for this crate's reconciler tests.

use std::sync::{Arc, OnceLock};

use packetframe_cfg::EdgedConfig;
use packetframe_log::Logger;
use packetframe_store::memory::MemoryStore;
use packetframe_store::{AnyStore, User, UserId};

use crate::center::Center;

/// `Logger::launch` panics if a global subscriber is already installed, so
/// every test in this process shares a single one.
pub fn test_logger() -> &'static Logger {
    static LOGGER: OnceLock<&'static Logger> = OnceLock::new();
    *LOGGER.get_or_init(|| Logger::launch(&test_config(camino::Utf8Path::new(".")).logging()).expect("launch test logger"))
}

pub fn test_config(dir: &camino::Utf8Path) -> EdgedConfig {
    EdgedConfig {
        config: None,
        node_label: "test-node".into(),
        db_url: String::new(),
        dns_listen: "127.0.0.1:0".parse().unwrap(),
        rpc_listen: "127.0.0.1:0".parse().unwrap(),
        metrics_listen: "127.0.0.1:0".parse().unwrap(),
        zones_dir: dir.join("zones"),
        manifest_path: dir.join("knot.zones.conf"),
        ns1_host: "ns1.packetframe.com.".into(),
        ns2_host: "ns2.packetframe.com.".into(),
        soa_admin: "info.packetframe.com.".into(),
        script_ns_host: "script-ns.packetframe.com.".into(),
        proxy_anycast_v4: "66.248.234.7".into(),
        proxy_anycast_v6: "2602:809:3004::7".into(),
        cert_dir: dir.join("certs"),
        proxy_config_path: dir.join("Caddyfile"),
        acme_responder_addr: "127.0.0.1:0".parse().unwrap(),
        ns_reload_cmd: "true".into(),
        proxy_reload_cmd: "true".into(),
        tick_interval_secs: 5,
        sentry_dsn: None,
        verbose: 0,
        log_level: Default::default(),
        log_target: "stderr".into(),
    }
}

pub async fn seeded_center(dir: &camino::Utf8Path) -> (Arc<Center>, UserId) {
    let store = MemoryStore::new();
    let user = User {
        id: UserId::new(),
        email: "alice@example.com".into(),
        password_hash: String::new(),
        api_key: None,
        session_token: None,
        groups: Vec::new(),
        refer: None,
        password_reset_token: None,
        password_reset_token_created_at: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    let user_id = user.id;
    store.seed_user(user);

    let center = Center::new(test_config(dir), test_logger(), AnyStore::Memory(store));
    tokio::fs::create_dir_all(&center.config.zones_dir).await.unwrap();
    tokio::fs::create_dir_all(&center.config.cert_dir).await.unwrap();
    (center, user_id)
}
