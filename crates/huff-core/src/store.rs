//! Preference store collaborators
//!
//! The store is a plain key/value record with get/set semantics. The pipeline
//! only ever reads from it; writes come from whatever options surface the host
//! provides (the `huff prefs` command for the CLI host).

use crate::error::HuffError;
use crate::preferences::{Preferences, StoredPreferences};
use crate::result::Result;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Key/value preference storage
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Read the current record; keys never written are absent
    async fn get(&self) -> Result<StoredPreferences>;

    /// Write the keys present in `values`, leaving the others untouched
    async fn set(&self, values: StoredPreferences) -> Result<()>;

    /// Read the current record and fill missing keys from `defaults`
    async fn load(&self, defaults: Preferences) -> Result<Preferences> {
        Ok(self.get().await?.with_defaults(defaults))
    }
}

/// In-memory store, used by tests and by hosts without persistence
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<StoredPreferences>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `values`
    pub fn with_values(values: StoredPreferences) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn get(&self) -> Result<StoredPreferences> {
        Ok(self.values.read().await.clone())
    }

    async fn set(&self, values: StoredPreferences) -> Result<()> {
        self.values.write().await.merge(values);
        Ok(())
    }
}

/// JSON file backed store
///
/// A missing file reads as an empty record. Writes go through a uniquely
/// named temporary file in the same directory that is then persisted over
/// the record, so readers never observe a torn record. Writers sharing one
/// store are serialized.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PreferenceStore for FileStore {
    async fn get(&self) -> Result<StoredPreferences> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preference file at {}", self.path.display());
                return Ok(StoredPreferences::default());
            }
            Err(e) => return Err(HuffError::io_error(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(StoredPreferences::default());
        }

        serde_json::from_str(&content).map_err(|e| {
            HuffError::store_error(format!(
                "Invalid preference file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn set(&self, values: StoredPreferences) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut current = self.get().await?;
        current.merge(values);

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| HuffError::io_error(&dir, e))?;

        let json = serde_json::to_string_pretty(&current)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist_record(&dir, &path, &json))
            .await
            .map_err(|e| HuffError::internal_error(format!("preference writer failed: {e}")))??;

        debug!("Wrote preferences to {}", self.path.display());
        Ok(())
    }
}

/// Write `contents` to a fresh temporary file in `dir` and move it over `path`
fn persist_record(dir: &Path, path: &Path, contents: &str) -> Result<()> {
    let mut file = NamedTempFile::new_in(dir).map_err(|e| HuffError::io_error(dir, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| HuffError::io_error(file.path(), e))?;
    file.persist(path)
        .map_err(|e| HuffError::io_error(path, e.error))?;
    Ok(())
}
