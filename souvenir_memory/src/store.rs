//! Scope-aware facade over a [`MemoryBackend`].

use souvenir_core::MemoryScope;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::{JsonFileBackend, MemoryBackend};
use crate::error::{MemoryError, Result};
use crate::extractor::Extraction;
use crate::record::{Fact, MemoryRecord};
use crate::scope::{GLOBAL_RECORD_KEY, ScopeResolver, resolver_for};

/// Memory records addressed by conversation id.
///
/// Every operation goes through the scope resolver first, so with a global
/// scope all conversations read and write the same record.
#[derive(Clone)]
pub struct MemoryStore {
    backend: Arc<dyn MemoryBackend>,
    resolver: Arc<dyn ScopeResolver>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(backend: Arc<dyn MemoryBackend>, resolver: Arc<dyn ScopeResolver>) -> Self {
        Self { backend, resolver }
    }

    /// JSON files under `dir`.
    #[must_use]
    pub fn json(dir: impl Into<PathBuf>, scope: MemoryScope) -> Self {
        Self::new(Arc::new(JsonFileBackend::new(dir)), resolver_for(scope))
    }

    #[must_use]
    pub fn scope(&self) -> MemoryScope {
        self.resolver.scope()
    }

    #[must_use]
    pub fn storage_key(&self, conversation_id: &str) -> String {
        self.resolver.storage_key(conversation_id)
    }

    pub async fn load(&self, conversation_id: &str) -> Result<MemoryRecord> {
        self.backend.load(&self.storage_key(conversation_id)).await
    }

    pub async fn save(&self, conversation_id: &str, record: &mut MemoryRecord) -> bool {
        self.backend
            .save(&self.storage_key(conversation_id), record)
            .await
    }

    pub async fn delete(&self, conversation_id: &str) -> bool {
        self.backend.delete(&self.storage_key(conversation_id)).await
    }

    /// Set `category` to `value`, replacing any previous value.
    pub async fn upsert_fact(
        &self,
        conversation_id: &str,
        category: &str,
        value: &str,
    ) -> Result<MemoryRecord> {
        let key = self.storage_key(conversation_id);
        let mut record = self.backend.load(&key).await?;
        record.memories.insert(category, Fact::new(value));
        self.persist(&key, record).await
    }

    pub async fn remove_fact(&self, conversation_id: &str, category: &str) -> Result<MemoryRecord> {
        let key = self.storage_key(conversation_id);
        let mut record = self.backend.load(&key).await?;
        if record.memories.remove(category).is_none() {
            return Err(MemoryError::FactNotFound {
                id: key,
                category: category.to_string(),
            });
        }
        self.persist(&key, record).await
    }

    /// Write every extracted fact into the record, one timestamp for all.
    /// An empty extraction touches nothing and yields `None`.
    pub async fn merge_facts(
        &self,
        conversation_id: &str,
        extracted: &Extraction,
    ) -> Result<Option<MemoryRecord>> {
        if extracted.is_empty() {
            return Ok(None);
        }
        let key = self.storage_key(conversation_id);
        let mut record = self.backend.load(&key).await?;

        let now = chrono::Utc::now();
        for (category, value) in extracted.iter() {
            record.memories.insert(
                category,
                Fact {
                    value: value.to_string(),
                    updated_at: now,
                },
            );
        }
        info!("Merged {} facts into memory record {key}", extracted.len());
        self.persist(&key, record).await.map(Some)
    }

    pub async fn set_title(&self, conversation_id: &str, title: &str) -> Result<MemoryRecord> {
        let key = self.storage_key(conversation_id);
        let mut record = self.backend.load(&key).await?;
        record.title = Some(title.to_string());
        self.persist(&key, record).await
    }

    /// Drop every fact but keep the record itself.
    pub async fn clear(&self, conversation_id: &str) -> Result<MemoryRecord> {
        let key = self.storage_key(conversation_id);
        let mut record = self.backend.load(&key).await?;
        record.memories.clear();
        self.persist(&key, record).await
    }

    /// Every stored record except the global one. A record that fails to
    /// load is logged and left out.
    pub async fn list_all(&self) -> Result<BTreeMap<String, MemoryRecord>> {
        let mut records = BTreeMap::new();
        for key in self.backend.list_keys().await? {
            if key == GLOBAL_RECORD_KEY {
                continue;
            }
            match self.backend.load(&key).await {
                Ok(record) => {
                    records.insert(key, record);
                }
                Err(e) => warn!("Skipping memory record {key}: {e}"),
            }
        }
        Ok(records)
    }

    async fn persist(&self, key: &str, mut record: MemoryRecord) -> Result<MemoryRecord> {
        if self.backend.save(key, &mut record).await {
            Ok(record)
        } else {
            Err(MemoryError::SaveFailed(key.to_string()))
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("scope", &self.scope())
            .finish_non_exhaustive()
    }
}
