//! sea-orm implementation of [`ConversationStore`].

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use souvenir_core::{Conversation, ConversationStore, NewMessage, Role, StoredMessage};
use souvenir_entities::{conversations, ensure_table, messages};
use tracing::info;

fn message_from_model(model: messages::Model) -> StoredMessage {
    StoredMessage {
        id: model.id,
        conversation_id: model.conversation_id,
        message_id: model.message_id,
        role: Role::from_sender(&model.sender),
        text: model.text,
    }
}

fn new_message_model(conversation_id: &str, message: NewMessage) -> messages::ActiveModel {
    messages::ActiveModel {
        conversation_id: Set(conversation_id.to_string()),
        message_id: Set(message.message_id),
        sender: Set(message.role.as_sender().to_string()),
        text: Set(message.text),
        ..Default::default()
    }
}

pub struct SqlConversationStore {
    db: DatabaseConnection,
}

impl SqlConversationStore {
    pub async fn new(db: DatabaseConnection) -> anyhow::Result<Self> {
        if ensure_table(&db, conversations::Entity).await? {
            info!("Created table conversations");
        }
        if ensure_table(&db, messages::Entity).await? {
            info!("Created table messages");
        }
        info!("SqlConversationStore initialized");
        Ok(Self { db })
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to database: {database_url}");
        let db = Database::connect(database_url).await?;
        Self::new(db).await
    }

    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn with_messages(&self, model: conversations::Model) -> anyhow::Result<Conversation> {
        let messages = self.messages(&model.id).await?;
        Ok(Conversation {
            id: model.id,
            title: model.title,
            created_at: model.created_at,
            messages,
        })
    }
}

#[async_trait]
impl ConversationStore for SqlConversationStore {
    async fn create(&self, id: &str, title: &str) -> anyhow::Result<Conversation> {
        let model = conversations::ActiveModel {
            id: Set(id.to_string()),
            title: Set(title.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        info!("Created conversation {id}");
        Ok(Conversation {
            id: model.id,
            title: model.title,
            created_at: model.created_at,
            messages: Vec::new(),
        })
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<Conversation>> {
        match conversations::Entity::find_by_id(id.to_owned())
            .one(&self.db)
            .await?
        {
            Some(model) => Ok(Some(self.with_messages(model).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, skip: u64, limit: u64) -> anyhow::Result<Vec<Conversation>> {
        let models = conversations::Entity::find()
            .order_by_asc(conversations::Column::CreatedAt)
            .offset(skip)
            .limit(limit)
            .all(&self.db)
            .await?;

        let mut result = Vec::with_capacity(models.len());
        for model in models {
            result.push(self.with_messages(model).await?);
        }
        Ok(result)
    }

    async fn rename(&self, id: &str, title: &str) -> anyhow::Result<Option<Conversation>> {
        let Some(model) = conversations::Entity::find_by_id(id.to_owned())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut active: conversations::ActiveModel = model.into();
        active.title = Set(title.to_string());
        let model = active.update(&self.db).await?;
        Ok(Some(self.with_messages(model).await?))
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let txn = self.db.begin().await?;
        messages::Entity::delete_many()
            .filter(messages::Column::ConversationId.eq(id))
            .exec(&txn)
            .await?;
        let result = conversations::Entity::delete_by_id(id.to_owned())
            .exec(&txn)
            .await?;
        txn.commit().await?;

        let deleted = result.rows_affected > 0;
        if deleted {
            info!("Deleted conversation {id}");
        }
        Ok(deleted)
    }

    async fn add_message(&self, id: &str, message: NewMessage) -> anyhow::Result<StoredMessage> {
        let model = new_message_model(id, message).insert(&self.db).await?;
        Ok(message_from_model(model))
    }

    async fn messages(&self, id: &str) -> anyhow::Result<Vec<StoredMessage>> {
        let models = messages::Entity::find()
            .filter(messages::Column::ConversationId.eq(id))
            .order_by_asc(messages::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(message_from_model).collect())
    }

    async fn save_with_messages(
        &self,
        id: &str,
        title: &str,
        messages: Vec<NewMessage>,
    ) -> anyhow::Result<Conversation> {
        let txn = self.db.begin().await?;

        let existing = conversations::Entity::find_by_id(id.to_owned())
            .one(&txn)
            .await?;
        let model = if let Some(model) = existing {
            messages::Entity::delete_many()
                .filter(messages::Column::ConversationId.eq(id))
                .exec(&txn)
                .await?;
            let mut active: conversations::ActiveModel = model.into();
            active.title = Set(title.to_string());
            active.update(&txn).await?
        } else {
            conversations::ActiveModel {
                id: Set(id.to_string()),
                title: Set(title.to_string()),
                created_at: Set(Utc::now()),
            }
            .insert(&txn)
            .await?
        };

        for message in messages {
            new_message_model(id, message).insert(&txn).await?;
        }
        txn.commit().await?;

        self.with_messages(model).await
    }
}
