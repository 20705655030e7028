use clap::Parser;
use packetframe_cfg::logging::LogLevel;
use tracing::level_filters::LevelFilter;

use super::client::RpcClient;
use super::commands::Command;

#[derive(Clone, Debug, Parser)]
#[command(version, disable_help_subcommand = true)]
pub struct Args {
    /// The orchestrator instance to connect to. Ignored by `edge` commands,
    /// which address a specific node instead.
    #[arg(short = 's', long = "server", value_name = "IP:PORT", default_value = "127.0.0.1:8080", global = true)]
    pub server: String,

    /// The minimum severity of messages to log
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warning", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub async fn execute(self) -> Result<(), String> {
        let client = RpcClient::new(format!("http://{}", self.server));
        self.command.execute(client).await
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self.log_level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}
