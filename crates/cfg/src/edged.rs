//! Configuration for the `edged` process.

use std::net::SocketAddr;

use camino::Utf8PathBuf;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::logging::{LogLevel, LogTarget, LoggingConfig};

/// Configuration for a single edge node's reconciler agent.
#[derive(Clone, Debug, Parser, Serialize, Deserialize)]
#[command(name = "edged", about = "Packetframe edge reconciler agent")]
pub struct EdgedConfig {
    #[arg(long, env = "PACKETFRAME_CONFIG")]
    #[serde(skip)]
    pub config: Option<Utf8PathBuf>,

    /// This node's label, as it appears in the orchestrator's node file.
    #[arg(long, env = "PACKETFRAME_NODE_LABEL")]
    pub node_label: String,

    /// Postgres connection string for the authoritative store (read-only role).
    #[arg(long, env = "PACKETFRAME_DB_URL")]
    pub db_url: String,

    /// Address the DNS listener binds (UDP and TCP) for script-DNS.
    #[arg(long, env = "PACKETFRAME_DNS_LISTEN", default_value = "0.0.0.0:5453")]
    pub dns_listen: SocketAddr,

    /// Address the `/refresh` RPC endpoint listens on.
    #[arg(long, env = "PACKETFRAME_RPC_LISTEN", default_value = "127.0.0.1:8081")]
    pub rpc_listen: SocketAddr,

    /// Address the Prometheus metrics endpoint listens on.
    #[arg(long, env = "PACKETFRAME_METRICS_LISTEN", default_value = "127.0.0.1:9091")]
    pub metrics_listen: SocketAddr,

    /// Directory this node serves zone files and the manifest from.
    #[arg(long, env = "PACKETFRAME_ZONES_DIR", default_value = "/opt/packetframe/dns/zones")]
    pub zones_dir: Utf8PathBuf,

    /// Path to the generated nameserver manifest.
    #[arg(long, env = "PACKETFRAME_MANIFEST_PATH", default_value = "/opt/packetframe/dns/knot.zones.conf")]
    pub manifest_path: Utf8PathBuf,

    /// Primary authoritative nameserver hostname, used in generated SOA/NS records.
    #[arg(long, env = "PACKETFRAME_NS1_HOST", default_value = "ns1.packetframe.com.")]
    pub ns1_host: String,

    /// Secondary authoritative nameserver hostname.
    #[arg(long, env = "PACKETFRAME_NS2_HOST", default_value = "ns2.packetframe.com.")]
    pub ns2_host: String,

    /// SOA admin contact, in zone-file form (first `@` replaced by `.`).
    #[arg(long, env = "PACKETFRAME_SOA_ADMIN", default_value = "info.packetframe.com.")]
    pub soa_admin: String,

    /// Hostname to which `SCRIPT` records are delegated.
    #[arg(long, env = "PACKETFRAME_SCRIPT_NS_HOST", default_value = "script-ns.packetframe.com.")]
    pub script_ns_host: String,

    /// Anycast IPv4 address used for proxied records.
    #[arg(long, env = "PACKETFRAME_PROXY_V4", default_value = "66.248.234.7")]
    pub proxy_anycast_v4: String,

    /// Anycast IPv6 address used for proxied records.
    #[arg(long, env = "PACKETFRAME_PROXY_V6", default_value = "2602:809:3004::7")]
    pub proxy_anycast_v6: String,

    /// Directory holding per-domain TLS certificate/key pairs.
    #[arg(long, env = "PACKETFRAME_CERT_DIR", default_value = "/opt/packetframe/certs")]
    pub cert_dir: Utf8PathBuf,

    /// Path to the generated reverse-proxy configuration file.
    #[arg(long, env = "PACKETFRAME_PROXY_CONFIG_PATH", default_value = "/opt/packetframe/proxy/Caddyfile")]
    pub proxy_config_path: Utf8PathBuf,

    /// Address the ACME HTTP-01 responder listens on, referenced from proxy config.
    #[arg(long, env = "PACKETFRAME_ACME_RESPONDER", default_value = "127.0.0.1:8079")]
    pub acme_responder_addr: SocketAddr,

    /// Shell command run to reload the authoritative nameserver.
    #[arg(long, env = "PACKETFRAME_NS_RELOAD_CMD", default_value = "systemctl reload knot")]
    pub ns_reload_cmd: String,

    /// Shell command run to reload the reverse proxy.
    #[arg(long, env = "PACKETFRAME_PROXY_RELOAD_CMD", default_value = "systemctl reload caddy")]
    pub proxy_reload_cmd: String,

    /// Interval between reconciler ticks.
    #[arg(long, env = "PACKETFRAME_TICK_SECS", default_value_t = 5)]
    pub tick_interval_secs: u64,

    /// Optional Sentry DSN for error reporting.
    #[arg(long, env = "PACKETFRAME_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    #[serde(default)]
    pub verbose: u8,

    #[arg(long, env = "PACKETFRAME_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    #[serde(default)]
    pub log_level: LogLevel,

    #[arg(long, env = "PACKETFRAME_LOG_TARGET", default_value = "stderr")]
    #[serde(default)]
    pub log_target: String,
}

impl EdgedConfig {
    /// Parse flags and environment, then layer a `--config` TOML file
    /// underneath any field still holding its built-in default.
    pub fn load() -> Result<Self, String> {
        crate::filecfg::load(|cfg: &Self| cfg.config.as_deref())
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tick_interval_secs)
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level,
            target: LogTarget::parse(&self.log_target),
            trace_targets: Vec::new(),
        }
        .with_verbosity(self.verbose)
    }
}
