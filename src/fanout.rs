//! Pushing generated artifacts out to the edge fleet over rsync+ssh.

use std::time::Duration;

use camino::Utf8Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// One edge node's push+reload result.
pub struct NodeOutcome {
    pub label: String,
    pub ok: bool,
}

/// `rsync --delete --archive --compress --partial` of `local_path` to
/// `address`'s `remote_dir`, over SSH with `ssh_key`/`ssh_port`, host-key
/// checking disabled (edge nodes are ephemeral and provisioned by the same
/// automation that populates the node file).
pub async fn push(
    ssh_key: &Utf8Path,
    ssh_port: u16,
    address: &str,
    local_path: &Utf8Path,
    remote_dir: &str,
    timeout: Duration,
) -> bool {
    let ssh_opts = format!(
        "ssh -i {ssh_key} -p {ssh_port} -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null"
    );
    let destination = format!("{address}:{remote_dir}");

    run(
        Command::new("rsync")
            .arg("--delete")
            .arg("--archive")
            .arg("--compress")
            .arg("--partial")
            .arg("-e")
            .arg(&ssh_opts)
            .arg(local_path.as_str())
            .arg(&destination),
        timeout,
    )
    .await
}

/// Run `reload_cmd` over SSH on `address` (e.g. `systemctl reload knot`).
pub async fn reload(ssh_key: &Utf8Path, ssh_port: u16, address: &str, reload_cmd: &str, timeout: Duration) -> bool {
    run(
        Command::new("ssh")
            .arg("-i")
            .arg(ssh_key.as_str())
            .arg("-p")
            .arg(ssh_port.to_string())
            .arg("-o")
            .arg("StrictHostKeyChecking=no")
            .arg("-o")
            .arg("UserKnownHostsFile=/dev/null")
            .arg(address)
            .arg(reload_cmd),
        timeout,
    )
    .await
}

/// Push `local_path` to every node's `remote_dir`, then reload each with
/// `reload_cmd`, per-node ordering preserved (push, then reload, before
/// moving to the next node). Returns the outcome of every node so the
/// caller can log failures; overall success is `outcomes.iter().all(ok)`.
pub async fn fan_out(
    ssh_key: &Utf8Path,
    ssh_port: u16,
    nodes: &std::collections::HashMap<String, String>,
    local_path: &Utf8Path,
    remote_dir: &str,
    reload_cmd: &str,
    timeout: Duration,
) -> Vec<NodeOutcome> {
    let mut outcomes = Vec::with_capacity(nodes.len());
    for (label, address) in nodes {
        let pushed = push(ssh_key, ssh_port, address, local_path, remote_dir, timeout).await;
        let reloaded = pushed && reload(ssh_key, ssh_port, address, reload_cmd, timeout).await;
        if pushed && reloaded {
            debug!(node = %label, "pushed and reloaded");
        } else {
            warn!(node = %label, pushed, reloaded, "fan-out step failed");
        }
        outcomes.push(NodeOutcome {
            label: label.clone(),
            ok: pushed && reloaded,
        });
    }
    outcomes
}

async fn run(command: &mut Command, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, command.status()).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(err)) => {
            warn!(%err, "failed to spawn fan-out subprocess");
            false
        }
        Err(_) => {
            warn!("fan-out subprocess exceeded its timeout");
            false
        }
    }
}
