//! Configuration for the `orchestrator` process.

use std::net::SocketAddr;

use camino::Utf8PathBuf;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::logging::{LogLevel, LogTarget, LoggingConfig};

/// Configuration for the change-propagation orchestrator.
///
/// Every field can be set from the environment, so the process can be run
/// under a plain process supervisor without a config file. A `--config` file
/// (TOML) is merged underneath the environment and flags: flags win, then
/// environment, then file, then the built-in defaults.
#[derive(Clone, Debug, Parser, Serialize, Deserialize)]
#[command(name = "orchestrator", about = "Packetframe change-propagation orchestrator")]
pub struct OrchestratorConfig {
    /// Path to a TOML config file to load before applying flags/environment.
    #[arg(long, env = "PACKETFRAME_CONFIG")]
    #[serde(skip)]
    pub config: Option<Utf8PathBuf>,

    /// Postgres connection string for the authoritative store.
    #[arg(long, env = "PACKETFRAME_DB_URL")]
    pub db_url: String,

    /// Address the orchestrator's RPC surface listens on.
    #[arg(long, env = "PACKETFRAME_RPC_LISTEN", default_value = "127.0.0.1:8080")]
    pub rpc_listen: SocketAddr,

    /// Address the Prometheus metrics endpoint listens on.
    #[arg(long, env = "PACKETFRAME_METRICS_LISTEN", default_value = "127.0.0.1:9090")]
    pub metrics_listen: SocketAddr,

    /// Directory holding generated zone files and the nameserver manifest.
    #[arg(long, env = "PACKETFRAME_CACHE_DIR", default_value = "/var/lib/packetframe/cache")]
    pub cache_dir: Utf8PathBuf,

    /// YAML file mapping edge node labels to addresses, watched for changes.
    #[arg(long, env = "PACKETFRAME_NODE_FILE", default_value = "/etc/packetframe/nodes.yaml")]
    pub node_file: Utf8PathBuf,

    /// SSH private key used to reach edge nodes for rsync fan-out.
    #[arg(long, env = "PACKETFRAME_SSH_KEY", default_value = "/etc/packetframe/id_ed25519")]
    pub ssh_key: Utf8PathBuf,

    /// SSH port used to reach edge nodes.
    #[arg(long, env = "PACKETFRAME_SSH_PORT", default_value_t = 22)]
    pub ssh_port: u16,

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

    /// How often the scheduler examines the queue.
    #[arg(long, env = "PACKETFRAME_TICK_SECS", default_value_t = 2)]
    pub tick_interval_secs: u64,

    /// Maximum age of a queued message before it's discarded unexecuted.
    #[arg(long, env = "PACKETFRAME_MESSAGE_LIFESPAN_SECS", default_value_t = 3600)]
    pub message_lifespan_secs: u64,

    /// Timeout applied to each rsync/ssh subprocess spawned during fan-out.
    #[arg(long, env = "PACKETFRAME_SUBPROCESS_TIMEOUT_SECS", default_value_t = 30)]
    pub subprocess_timeout_secs: u64,

    /// Optional Sentry DSN for error reporting.
    #[arg(long, env = "PACKETFRAME_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,

    /// Raise the log level by one step per occurrence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    #[serde(default)]
    pub verbose: u8,

    /// Minimum severity logged.
    #[arg(long, env = "PACKETFRAME_LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    #[serde(default)]
    pub log_level: LogLevel,

    /// Where to send log output: `stderr`, `stdout`, `syslog`, or a file path.
    #[arg(long, env = "PACKETFRAME_LOG_TARGET", default_value = "stderr")]
    #[serde(default)]
    pub log_target: String,
}

impl OrchestratorConfig {
    /// Parse flags and environment, then layer a `--config` TOML file
    /// underneath any field still holding its built-in default.
    pub fn load() -> Result<Self, String> {
        crate::filecfg::load(|cfg: &Self| cfg.config.as_deref())
    }

    pub fn message_lifespan(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.message_lifespan_secs)
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
