//! The commands of the Packetframe operator CLI.

pub mod edge;
pub mod queue;

use super::client::RpcClient;

#[derive(Clone, Debug, clap::Subcommand)]
pub enum Command {
    /// Operate on the orchestrator's change-propagation queue
    #[command(name = "queue")]
    Queue(self::queue::Queue),

    /// Operate on a single edge agent
    #[command(name = "edge")]
    Edge(self::edge::Edge),
}

impl Command {
    /// `client` targets the orchestrator; `Edge` ignores it and builds its
    /// own, since it addresses a specific node instead.
    pub async fn execute(self, client: RpcClient) -> Result<(), String> {
        match self {
            Self::Queue(queue) => queue.execute(client).await,
            Self::Edge(edge) => edge.execute().await,
        }
    }
}
