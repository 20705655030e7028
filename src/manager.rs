//! Spawning and shutting down the orchestrator's units.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::info;

use crate::center::Center;
use crate::units::{http_server, metrics_server, node_watch, scheduler};

/// A handle to every running unit, used to request a clean shutdown.
pub struct Units {
    shutdown_txs: Vec<oneshot::Sender<()>>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Units {
    /// Spawn the scheduler, RPC, metrics, and node-watch units.
    pub fn spawn(center: &Arc<Center>) -> Self {
        let mut shutdown_txs = Vec::new();
        let mut handles = Vec::new();

        macro_rules! spawn_unit {
            ($name:literal, $module:path) => {{
                info!("starting unit '{}'", $name);
                let (tx, rx) = oneshot::channel();
                shutdown_txs.push(tx);
                handles.push(tokio::spawn($module(center.clone(), rx)));
            }};
        }

        spawn_unit!("scheduler", scheduler::run);
        spawn_unit!("rpc", http_server::run);
        spawn_unit!("metrics", metrics_server::run);
        spawn_unit!("node-watch", node_watch::run);

        Self { shutdown_txs, handles }
    }

    /// Signal every unit to stop and wait for them all to finish.
    pub async fn shutdown(self) {
        for tx in self.shutdown_txs {
            let _ = tx.send(());
        }
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}
