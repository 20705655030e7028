use futures_util::TryFutureExt;
use uuid::Uuid;

use crate::ansi;
use crate::client::{format_http_error, RpcClient};
use crate::println;

/// Operate on the orchestrator's change-propagation queue.
#[derive(Clone, Debug, clap::Args)]
pub struct Queue {
    #[command(subcommand)]
    command: QueueCommand,
}

#[derive(Clone, Debug, clap::Subcommand)]
pub enum QueueCommand {
    /// Enqueue a zone-update for a single zone.
    #[command(name = "update-zone")]
    UpdateZone {
        /// The zone's id, as returned by the store.
        id: Uuid,
    },

    /// Enqueue a nameserver-manifest rebuild.
    #[command(name = "update-manifest")]
    UpdateManifest,

    /// Enqueue a full zone purge-and-rebuild.
    #[command(name = "purge-zones")]
    PurgeZones,

    /// Drop every pending message without dispatching it.
    #[command(name = "clear")]
    Clear,

    /// Dump the queue's current contents.
    #[command(name = "show")]
    Show,
}

impl Queue {
    pub async fn execute(self, client: RpcClient) -> Result<(), String> {
        match self.command {
            QueueCommand::UpdateZone { id } => {
                client.get(&format!("update_zone?id={id}")).send().await.map_err(format_http_error)?;
                println!("{}\u{2713}{} enqueued zone-update for {id}", ansi::GREEN, ansi::RESET);
            }
            QueueCommand::UpdateManifest => {
                client.get("update_manifest").send().await.map_err(format_http_error)?;
                println!("{}\u{2713}{} enqueued manifest-update", ansi::GREEN, ansi::RESET);
            }
            QueueCommand::PurgeZones => {
                client.get("purge_zones").send().await.map_err(format_http_error)?;
                println!("{}\u{2713}{} enqueued zone-purge", ansi::GREEN, ansi::RESET);
            }
            QueueCommand::Clear => {
                client.get("clear_queue").send().await.map_err(format_http_error)?;
                println!("{}\u{2713}{} queue cleared", ansi::GREEN, ansi::RESET);
            }
            QueueCommand::Show => {
                let text = client
                    .get("queue_content")
                    .send()
                    .and_then(|r| r.text())
                    .await
                    .map_err(format_http_error)?;
                if text.is_empty() {
                    println!("the queue is empty");
                } else {
                    print!("{text}");
                }
            }
        }
        Ok(())
    }
}
