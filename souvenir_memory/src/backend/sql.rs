//! Relational memory store: a header row per record in `memory_records`
//! and one `conversation_memories` row per fact.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, DatabaseTransaction, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use souvenir_entities::{conversation_memories, ensure_table, memory_records};
use tracing::{debug, error, info};

use super::{MemoryBackend, validate_key};
use crate::error::Result;
use crate::record::{Fact, FactMap, MemoryRecord};

#[derive(Debug, Clone)]
pub struct SqlMemoryBackend {
    db: DatabaseConnection,
}

impl SqlMemoryBackend {
    /// Wrap an open connection, creating the memory tables if needed.
    pub async fn new(db: DatabaseConnection) -> Result<Self> {
        if ensure_table(&db, memory_records::Entity).await? {
            info!("Created table memory_records");
        }
        if ensure_table(&db, conversation_memories::Entity).await? {
            info!("Created table conversation_memories");
        }
        Ok(Self { db })
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("Connecting to memory database");
        let db = Database::connect(database_url).await?;
        Self::new(db).await
    }

    async fn facts_for(&self, key: &str) -> Result<FactMap> {
        let rows = conversation_memories::Entity::find()
            .filter(conversation_memories::Column::ConversationId.eq(key))
            .order_by_asc(conversation_memories::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.key,
                    Fact {
                        value: row.value,
                        updated_at: row.updated_at,
                    },
                )
            })
            .collect())
    }

    async fn write_record(&self, key: &str, record: &MemoryRecord) -> Result<()> {
        let txn = self.db.begin().await?;
        Self::write_header(&txn, key, record).await?;
        Self::write_facts(&txn, key, record).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn write_header(txn: &DatabaseTransaction, key: &str, record: &MemoryRecord) -> Result<()> {
        let header = memory_records::ActiveModel {
            conversation_id: Set(key.to_string()),
            title: Set(record.title.clone()),
            created_at: Set(record.created_at),
            updated_at: Set(record.updated_at),
        };

        let exists = memory_records::Entity::find_by_id(key.to_owned())
            .one(txn)
            .await?
            .is_some();
        if exists {
            header.update(txn).await?;
        } else {
            header.insert(txn).await?;
        }
        Ok(())
    }

    async fn write_facts(txn: &DatabaseTransaction, key: &str, record: &MemoryRecord) -> Result<()> {
        let existing = conversation_memories::Entity::find()
            .filter(conversation_memories::Column::ConversationId.eq(key))
            .all(txn)
            .await?;

        let mut stored = Vec::with_capacity(existing.len());
        for row in existing {
            if record.memories.contains_key(&row.key) {
                stored.push(row);
            } else {
                row.delete(txn).await?;
            }
        }

        for (category, fact) in record.memories.iter() {
            match stored.iter().find(|row| row.key == category) {
                Some(row) if row.value == fact.value && row.updated_at == fact.updated_at => {}
                Some(row) => {
                    let mut active: conversation_memories::ActiveModel = row.clone().into();
                    active.value = Set(fact.value.clone());
                    active.updated_at = Set(fact.updated_at);
                    active.update(txn).await?;
                }
                None => {
                    conversation_memories::ActiveModel {
                        conversation_id: Set(key.to_string()),
                        key: Set(category.to_string()),
                        value: Set(fact.value.clone()),
                        created_at: Set(fact.updated_at),
                        updated_at: Set(fact.updated_at),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MemoryBackend for SqlMemoryBackend {
    async fn load(&self, key: &str) -> Result<MemoryRecord> {
        validate_key(key)?;

        let Some(header) = memory_records::Entity::find_by_id(key.to_owned())
            .one(&self.db)
            .await?
        else {
            let mut record = MemoryRecord::empty(key);
            if self.save(key, &mut record).await {
                info!("Created memory record for {key}");
            }
            return Ok(record);
        };

        let memories = self.facts_for(key).await?;
        debug!("Loaded memory record {key} ({} facts)", memories.len());

        Ok(MemoryRecord {
            conversation_id: header.conversation_id,
            title: header.title,
            created_at: header.created_at,
            updated_at: header.updated_at,
            memories,
        })
    }

    async fn save(&self, key: &str, record: &mut MemoryRecord) -> bool {
        record.updated_at = Utc::now();

        if let Err(e) = validate_key(key) {
            error!("Refusing to save memory record: {e}");
            return false;
        }

        match self.write_record(key, record).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save memory record {key}: {e}");
                false
            }
        }
    }

    async fn delete(&self, key: &str) -> bool {
        let facts = conversation_memories::Entity::delete_many()
            .filter(conversation_memories::Column::ConversationId.eq(key))
            .exec(&self.db)
            .await;
        if let Err(e) = facts {
            error!("Failed to delete facts of memory record {key}: {e}");
            return false;
        }

        match memory_records::Entity::delete_by_id(key.to_owned())
            .exec(&self.db)
            .await
        {
            Ok(result) if result.rows_affected > 0 => {
                info!("Deleted memory record {key}");
                true
            }
            Ok(_) => false,
            Err(e) => {
                error!("Failed to delete memory record {key}: {e}");
                false
            }
        }
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let headers = memory_records::Entity::find()
            .order_by_asc(memory_records::Column::ConversationId)
            .all(&self.db)
            .await?;
        Ok(headers.into_iter().map(|h| h.conversation_id).collect())
    }
}
