//! Spawning and shutting down the edge agent's reconciler loops.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::info;

use crate::center::Center;
use crate::{dns, metrics, proxy, rpc, scriptrefresh, zonegen};

/// A handle to every running unit, used to request a clean shutdown.
pub struct Units {
    shutdown_txs: Vec<oneshot::Sender<()>>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Units {
    /// Spawn the four reconciler loops, the DNS listener, the RPC
    /// endpoint, and the metrics server.
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

        spawn_unit!("zone-gen", zonegen::run);
        spawn_unit!("proxy", proxy::run);
        spawn_unit!("script-refresh", scriptrefresh::run);
        spawn_unit!("dns", dns::run);
        spawn_unit!("rpc", rpc::run);
        spawn_unit!("metrics", metrics::run);

        Self { shutdown_txs, handles }
    }

    pub async fn shutdown(self) {
        for tx in self.shutdown_txs {
            let _ = tx.send(());
        }
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}
