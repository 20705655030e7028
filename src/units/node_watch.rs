//! Hot-reloads the edge node file whenever it changes on disk.

use std::sync::Arc;

use packetframe_cfg::NodeFile;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::center::Center;

/// Polling interval for the node-file mtime check.
///
/// The file is small and local; a short poll is simpler than wiring up
/// `inotify` for a file that changes on the order of minutes, not seconds.
const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);

pub async fn run(center: Arc<Center>, mut shutdown: oneshot::Receiver<()>) {
    let mut last_modified = std::fs::metadata(&center.config.node_file).and_then(|m| m.modified()).ok();
    let mut ticker = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let modified = match std::fs::metadata(&center.config.node_file).and_then(|m| m.modified()) {
                    Ok(modified) => modified,
                    Err(err) => {
                        warn!(%err, path = %center.config.node_file, "could not stat node file");
                        continue;
                    }
                };

                if last_modified == Some(modified) {
                    continue;
                }

                match NodeFile::load(&center.config.node_file) {
                    Ok(nodes) => {
                        debug!(count = nodes.nodes.len(), "reloaded edge node file");
                        center.nodes.store(Arc::new(nodes));
                        last_modified = Some(modified);
                    }
                    Err(err) => error!(%err, "failed to parse reloaded node file; keeping previous map"),
                }
            }
            _ = &mut shutdown => return,
        }
    }
}
