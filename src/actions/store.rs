use crate::{Error, Result};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};
use tokio::{fs, io::AsyncWriteExt, sync::RwLock};
use tracing::{debug, warn};

/// Key/document persistence behind the action catalog.
#[async_trait]
pub trait ActionStore: Send + Sync {
    /// Every key currently persisted, in no particular order.
    async fn list_keys(&self) -> Result<Vec<String>>;

    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    async fn write(&self, key: &str, document: &[u8]) -> Result<()>;
}

/// One `{key}.json` file per action in a flat directory. The directory
/// listing is the only index.
pub struct FileActionStore {
    dir: PathBuf,
}

impl FileActionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the directory if it does not exist yet.
    pub async fn init(&self) -> Result<()> {
        if !fs::try_exists(&self.dir).await.unwrap_or(false) {
            warn!(
                "Actions directory '{}' does not exist, creating it",
                self.dir.display()
            );
        }
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::storage(format!(
                "Failed to create actions directory '{}': {}",
                self.dir.display(),
                e
            ))
        })
    }

    fn document_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl ActionStore for FileActionStore {
    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(|e| {
            Error::storage(format!(
                "Failed to list actions directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::storage(format!("Failed to read directory entry: {}", e)))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }

        debug!("Found {} action documents in {}", keys.len(), self.dir.display());
        Ok(keys)
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.document_path(key);
        fs::read(&path)
            .await
            .map_err(|e| Error::storage(format!("Failed to read '{}': {}", path.display(), e)))
    }

    async fn write(&self, key: &str, document: &[u8]) -> Result<()> {
        let path = self.document_path(key);
        let temp_path = path.with_extension("json.tmp");
        let to_storage =
            |e: std::io::Error| Error::storage(format!("Failed to write '{}': {}", path.display(), e));

        let mut file = fs::File::create(&temp_path).await.map_err(to_storage)?;
        file.write_all(document).await.map_err(to_storage)?;
        file.flush().await.map_err(to_storage)?;
        file.sync_all().await.map_err(to_storage)?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(to_storage(e));
        }

        debug!("Wrote action document {}", path.display());
        Ok(())
    }
}

/// In-memory store for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryActionStore {
    documents: RwLock<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw document, bypassing any validation.
    pub async fn insert_raw(&self, key: impl Into<String>, document: impl Into<Vec<u8>>) {
        self.documents
            .write()
            .await
            .insert(key.into(), document.into());
    }

    /// Makes every subsequent `write` fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl ActionStore for MemoryActionStore {
    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.documents.read().await.keys().cloned().collect())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        self.documents
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::storage(format!("No document stored under '{}'", key)))
    }

    async fn write(&self, key: &str, document: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::storage(format!(
                "Simulated write failure for '{}'",
                key
            )));
        }
        self.documents
            .write()
            .await
            .insert(key.to_string(), document.to_vec());
        Ok(())
    }
}
