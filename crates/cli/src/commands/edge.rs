use crate::ansi;
use crate::client::{format_http_error, RpcClient};
use crate::println;

/// Operate on a single edge agent's RPC surface.
///
/// Unlike `queue`, which always talks to the orchestrator, this targets one
/// particular node, so the node's RPC address is taken here rather than from
/// the top-level `--server` flag.
#[derive(Clone, Debug, clap::Args)]
pub struct Edge {
    /// The edge node's RPC address, e.g. `http://10.0.0.5:8081`.
    #[arg(long, short = 'n')]
    node: String,

    #[command(subcommand)]
    command: EdgeCommand,
}

#[derive(Clone, Debug, clap::Subcommand)]
pub enum EdgeCommand {
    /// Force an immediate script-DNS refresh, bypassing the tick interval.
    #[command(name = "refresh")]
    Refresh,
}

impl Edge {
    pub async fn execute(self) -> Result<(), String> {
        let client = RpcClient::new(self.node.as_str());
        match self.command {
            EdgeCommand::Refresh => {
                client.post("refresh").send().await.map_err(format_http_error)?;
                println!("{}\u{2713}{} requested a script-DNS refresh on {}", ansi::GREEN, ansi::RESET, self.node);
            }
        }
        Ok(())
    }
}
