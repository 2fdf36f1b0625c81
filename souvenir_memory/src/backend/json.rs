//! One pretty-printed JSON file per record.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

use super::{MemoryBackend, validate_key};
use crate::error::Result;
use crate::record::MemoryRecord;

/// Distinguishes temp files of concurrent writers.
static WRITE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Stores `<dir>/<key>.json`, written through a temp file and a rename so a
/// reader never sees a half-written record.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Replace whatever is stored under `key` with an empty record.
    async fn reinitialize(&self, key: &str) -> MemoryRecord {
        let mut record = MemoryRecord::empty(key);
        if !self.save(key, &mut record).await {
            warn!("Could not persist fresh memory record for {key}");
        }
        record
    }

    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = self.dir.join(format!(
            ".{file_name}.{}-{}.tmp",
            std::process::id(),
            WRITE_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = tokio::fs::write(&temp_path, contents).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        Ok(())
    }
}

#[async_trait]
impl MemoryBackend for JsonFileBackend {
    async fn load(&self, key: &str) -> Result<MemoryRecord> {
        let path = self.path_for(key)?;

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let record = self.reinitialize(key).await;
                info!("Created memory record for {key}");
                return Ok(record);
            }
            Err(e) => {
                error!("Failed to read memory record {key}: {e}");
                return Ok(self.reinitialize(key).await);
            }
        };

        match serde_json::from_str::<MemoryRecord>(&raw) {
            Ok(record) => {
                debug!("Loaded memory record {key} ({} facts)", record.memories.len());
                Ok(record)
            }
            Err(e) => {
                error!("Corrupt memory record {key}, starting over: {e}");
                Ok(self.reinitialize(key).await)
            }
        }
    }

    async fn save(&self, key: &str, record: &mut MemoryRecord) -> bool {
        record.updated_at = Utc::now();

        let path = match self.path_for(key) {
            Ok(path) => path,
            Err(e) => {
                error!("Refusing to save memory record: {e}");
                return false;
            }
        };

        let contents = match serde_json::to_vec_pretty(record) {
            Ok(contents) => contents,
            Err(e) => {
                error!("Failed to serialize memory record {key}: {e}");
                return false;
            }
        };

        match self.write_atomic(&path, &contents).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save memory record {key}: {e}");
                false
            }
        }
    }

    async fn delete(&self, key: &str) -> bool {
        let Ok(path) = self.path_for(key) else {
            return false;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted memory record {key}");
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Tried to delete missing memory record {key}");
                false
            }
            Err(e) => {
                error!("Failed to delete memory record {key}: {e}");
                false
            }
        }
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if let Some(key) = file_name.strip_suffix(".json") {
                if !key.starts_with('.') {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
