use super::{ActionDefinition, ActionStore, PaletteMetadata};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// In-memory index over an [`ActionStore`], enforcing unique, well-formed
/// action names. Reads share the index; creations are serialized.
pub struct ActionCatalog {
    store: Arc<dyn ActionStore>,
    index: RwLock<HashMap<String, ActionDefinition>>,
    create_lock: Mutex<()>,
}

impl ActionCatalog {
    /// Loads every persisted definition. Entries that fail to decode are
    /// skipped with a warning; only a failure to enumerate the store is fatal.
    pub async fn load(store: Arc<dyn ActionStore>) -> Result<Self> {
        let keys = store.list_keys().await?;
        info!("Loading {} stored action definitions", keys.len());

        let mut index = HashMap::with_capacity(keys.len());
        for key in keys {
            match Self::load_entry(store.as_ref(), &key).await {
                Ok(definition) => {
                    debug!("Loaded action '{}'", key);
                    index.insert(key, definition);
                }
                Err(e) => {
                    warn!("Skipping malformed stored action '{}': {}", key, e);
                }
            }
        }

        info!("Action catalog ready with {} actions", index.len());

        Ok(Self {
            store,
            index: RwLock::new(index),
            create_lock: Mutex::new(()),
        })
    }

    async fn load_entry(store: &dyn ActionStore, key: &str) -> Result<ActionDefinition> {
        let bytes = store.read(key).await?;
        ActionDefinition::from_stored(key, &bytes)
    }

    /// Palette summaries for the editor. Definitions without a `_palette`
    /// block are left out.
    pub async fn list(&self) -> Vec<PaletteMetadata> {
        let index = self.index.read().await;
        index
            .values()
            .filter_map(|definition| {
                let summary = definition.summary();
                if summary.is_none() {
                    warn!(
                        "Action '{}' has no '_palette' block and is hidden from the palette",
                        definition.name()
                    );
                }
                summary
            })
            .collect()
    }

    pub async fn get(&self, name: &str) -> Result<ActionDefinition> {
        self.index
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(name))
    }

    /// Finds the entry whose stored document equals `document`, preferring the
    /// one keyed by its `_palette.name`.
    pub async fn find_by_document(
        &self,
        document: &Map<String, Value>,
    ) -> Option<ActionDefinition> {
        let index = self.index.read().await;

        let hinted = document
            .get("_palette")
            .and_then(|palette| palette.get("name"))
            .and_then(Value::as_str)
            .and_then(|name| index.get(name))
            .filter(|definition| definition.document() == document);

        hinted
            .or_else(|| {
                index
                    .values()
                    .find(|definition| definition.document() == document)
            })
            .cloned()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.index.read().await.contains_key(name)
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    /// Validates, persists and indexes a new definition, returning its name.
    /// The index is only touched after the store write succeeds.
    pub async fn create(&self, payload: Value) -> Result<String> {
        let definition = ActionDefinition::from_payload(payload)?;
        let name = definition.name().to_string();

        let _guard = self.create_lock.lock().await;

        if self.contains(&name).await {
            warn!("Rejected duplicate action '{}'", name);
            return Err(Error::conflict(name));
        }

        let bytes = definition.to_bytes()?;
        self.store.write(&name, &bytes).await?;
        self.index.write().await.insert(name.clone(), definition);

        info!("Action '{}' created", name);
        Ok(name)
    }
}
