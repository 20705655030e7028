//! The label -> compiled-isolate cache the edge agent's DNS listener
//! dispatches queries through.

use std::collections::HashMap;
use std::sync::Arc;

use packetframe_store::Store;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::ScriptError;
use crate::runtime::ScriptIsolate;
use crate::schema::{Question, ScriptAnswer};
use crate::QUERY_DEADLINE;

struct Entry {
    source: String,
    isolate: Arc<ScriptIsolate>,
}

/// Keeps one [`ScriptIsolate`] per `SCRIPT` record label, recompiling only
/// the ones whose source actually changed on each refresh tick.
///
/// A script that fails to recompile keeps serving its previous isolate
/// rather than going dark - a bad deploy shouldn't take the label offline.
#[derive(Default)]
pub struct ScriptRegistry {
    entries: RwLock<HashMap<String, Entry>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every `SCRIPT` record from `store`, compile the ones that are
    /// new or changed, and drop handlers for labels no longer present.
    pub async fn refresh<S: Store>(&self, store: &S) -> Result<(), ScriptError> {
        let records = store
            .list_script_records()
            .await
            .map_err(|e| ScriptError::Store(e.to_string()))?;

        let fresh: HashMap<String, String> = records
            .into_iter()
            .map(|record| (record.label, record.value))
            .collect();

        let mut entries = self.entries.write().await;

        for (label, source) in &fresh {
            let needs_compile = entries.get(label).is_none_or(|existing| &existing.source != source);
            if !needs_compile {
                continue;
            }
            match ScriptIsolate::compile(source).await {
                Ok(isolate) => {
                    entries.insert(
                        label.clone(),
                        Entry {
                            source: source.clone(),
                            isolate: Arc::new(isolate),
                        },
                    );
                }
                Err(err) => {
                    warn!(label, %err, "script failed to recompile; keeping previous handler in place");
                }
            }
        }

        entries.retain(|label, _| fresh.contains_key(label));
        Ok(())
    }

    /// The handler currently registered for `label`, if any.
    pub async fn handler_for(&self, label: &str) -> Option<Arc<ScriptIsolate>> {
        self.entries.read().await.get(label).map(|e| e.isolate.clone())
    }

    /// Dispatch `question` to `label`'s handler, if one is registered.
    ///
    /// Returns `None` when no `SCRIPT` record covers this label (the caller
    /// should fall through to NXDOMAIN), `Some(Err(_))` on script failure or
    /// timeout (the caller replies with an empty answer, per SPEC_FULL).
    pub async fn dispatch(&self, label: &str, question: &Question) -> Option<Result<ScriptAnswer, ScriptError>> {
        let isolate = self.handler_for(label).await?;
        Some(isolate.handle_query(question, QUERY_DEADLINE).await)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use packetframe_store::memory::MemoryStore;
    use packetframe_store::RecordType;

    use super::*;

    async fn seed_script(store: &MemoryStore, label: &str, source: &str) {
        let user = store.create_user("owner@example.com", "hash").await.unwrap();
        let zone = store.create_zone("example.com.", user.id).await.unwrap();
        store
            .create_record(zone.id, RecordType::Script, label, source, 300, false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn refresh_registers_and_dispatches() {
        let store = MemoryStore::new();
        seed_script(
            &store,
            "api",
            "async function handleQuery(q) { return {authoritative: true, rrs: []}; }",
        )
        .await;

        let registry = ScriptRegistry::new();
        registry.refresh(&store).await.unwrap();
        assert_eq!(registry.len().await, 1);

        let question = Question {
            name: "api.example.com.".into(),
            qtype: "A".into(),
            cookie: None,
            subnet: None,
        };
        let answer = registry.dispatch("api", &question).await.unwrap().unwrap();
        assert!(answer.authoritative);
    }

    #[tokio::test]
    async fn refresh_unregisters_removed_labels() {
        let store = MemoryStore::new();
        seed_script(
            &store,
            "stale",
            "async function handleQuery(q) { return {authoritative: true, rrs: []}; }",
        )
        .await;

        let registry = ScriptRegistry::new();
        registry.refresh(&store).await.unwrap();
        assert_eq!(registry.len().await, 1);

        let fresh = MemoryStore::new();
        registry.refresh(&fresh).await.unwrap();
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_label_dispatches_to_nothing() {
        let registry = ScriptRegistry::new();
        let question = Question {
            name: "ghost.example.com.".into(),
            qtype: "A".into(),
            cookie: None,
            subnet: None,
        };
        assert!(registry.dispatch("ghost", &question).await.is_none());
    }
}
