//! The change-propagation queue.
//!
//! A single in-memory FIFO, guarded by one mutex so enqueue verbs and the
//! scheduler tick never interleave. Deliberately not persisted: a crash
//! loses in-flight messages, but every enqueue verb is re-derivable from
//! the store (re-request a zone update, re-run a manifest rebuild), so
//! durability wasn't worth the complexity.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use jiff::Timestamp;
use packetframe_store::ZoneId;

/// One pending change-propagation job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    ZoneUpdate(ZoneId),
    ManifestUpdate,
    ZonePurge,
}

#[derive(Clone, Debug)]
pub struct QueueMessage {
    pub operation: Operation,
    pub created_at: Timestamp,
    /// Set by the scheduler before dispatch; cleared again if the dispatch
    /// only partially succeeds, releasing the message for retry.
    pub acked: bool,
}

impl QueueMessage {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            created_at: Timestamp::now(),
            acked: false,
        }
    }

    fn is_expired(&self, lifespan: Duration) -> bool {
        let age = Timestamp::now().duration_since(self.created_at);
        age.unsigned_abs() > lifespan
    }
}

impl std::fmt::Display for QueueMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match &self.operation {
            Operation::ZoneUpdate(id) => format!("zone-update({id})"),
            Operation::ManifestUpdate => "manifest-update".to_string(),
            Operation::ZonePurge => "zone-purge".to_string(),
        };
        write!(f, "{op} created={} acked={}", self.created_at, self.acked)
    }
}

/// The change-propagation queue shared between the RPC unit and the
/// scheduler unit.
#[derive(Default)]
pub struct Queue {
    messages: Mutex<VecDeque<QueueMessage>>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// `enqueue-zone-update`: append unless an unacked update for this zone
    /// is already pending.
    pub fn enqueue_zone_update(&self, zone: ZoneId) {
        self.enqueue_if_absent(Operation::ZoneUpdate(zone));
    }

    /// `enqueue-manifest-update`.
    pub fn enqueue_manifest_update(&self) {
        self.enqueue_if_absent(Operation::ManifestUpdate);
    }

    /// `enqueue-zone-purge`.
    pub fn enqueue_zone_purge(&self) {
        self.enqueue_if_absent(Operation::ZonePurge);
    }

    fn enqueue_if_absent(&self, operation: Operation) {
        let mut messages = self.messages.lock().unwrap();
        let already_pending = messages
            .iter()
            .any(|m| !m.acked && m.operation == operation);
        if !already_pending {
            messages.push_back(QueueMessage::new(operation));
        }
    }

    /// `clear-queue`: drop every pending message.
    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }

    /// `read-queue`: a plaintext dump for operator diagnostics.
    pub fn render(&self) -> String {
        let messages = self.messages.lock().unwrap();
        messages.iter().map(|m| format!("{m}\n")).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run one scheduler tick: discard expired messages, then dispatch the
    /// rest head-to-tail, sequentially, through `dispatch`.
    ///
    /// `dispatch` returns `true` on full success (the message is removed)
    /// and `false` on partial failure (the message's `acked` flag is
    /// cleared and it stays at the front for the next tick).
    pub async fn tick<F, Fut>(&self, lifespan: Duration, mut dispatch: F)
    where
        F: FnMut(Operation) -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        loop {
            let next = {
                let mut messages = self.messages.lock().unwrap();
                while let Some(front) = messages.front() {
                    if front.is_expired(lifespan) {
                        messages.pop_front();
                    } else {
                        break;
                    }
                }
                match messages.front_mut() {
                    Some(message) => {
                        message.acked = true;
                        message.operation.clone()
                    }
                    None => break,
                }
            };

            let succeeded = dispatch(next).await;

            let mut messages = self.messages.lock().unwrap();
            if succeeded {
                messages.pop_front();
            } else if let Some(front) = messages.front_mut() {
                front.acked = false;
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> ZoneId {
        ZoneId::new()
    }

    #[test]
    fn duplicate_unacked_updates_are_deduped() {
        let queue = Queue::new();
        let id = zone();
        queue.enqueue_zone_update(id);
        queue.enqueue_zone_update(id);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn distinct_zones_both_enqueue() {
        let queue = Queue::new();
        queue.enqueue_zone_update(zone());
        queue.enqueue_zone_update(zone());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn clear_empties_the_queue() {
        let queue = Queue::new();
        queue.enqueue_manifest_update();
        queue.clear();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn tick_processes_fifo_and_removes_on_success() {
        let queue = Queue::new();
        queue.enqueue_manifest_update();
        queue.enqueue_zone_purge();

        let mut seen = vec![];
        queue
            .tick(Duration::from_secs(3600), |op| {
                seen.push(op);
                async { true }
            })
            .await;

        assert!(queue.is_empty());
        assert_eq!(seen, vec![Operation::ManifestUpdate, Operation::ZonePurge]);
    }

    #[tokio::test]
    async fn tick_retries_on_partial_failure() {
        let queue = Queue::new();
        queue.enqueue_manifest_update();

        queue.tick(Duration::from_secs(3600), |_| async { false }).await;

        assert_eq!(queue.len(), 1);
        assert!(!queue.render().contains("acked=true"));
    }

    #[tokio::test]
    async fn expired_messages_are_discarded_without_dispatch() {
        let queue = Queue::new();
        queue.enqueue_manifest_update();

        let mut dispatched = false;
        queue
            .tick(Duration::from_secs(0), |_| {
                dispatched = true;
                async { true }
            })
            .await;

        assert!(!dispatched);
        assert!(queue.is_empty());
    }
}
