#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub mod util;

pub use util::{
    DEFAULT_IMAGE_QUESTION, DEFAULT_PDF_QUESTION, DEFAULT_SYSTEM_PROMPT, GENERATION_ERROR_PREFIX,
};

/// Who authored a chat turn.
///
/// The relational store keeps the legacy sender strings (`user` / `ai`),
/// see [`Role::as_sender`] and [`Role::from_sender`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Speaker label used when a turn is rendered into a prompt.
    #[must_use]
    pub const fn prompt_label(self) -> &'static str {
        match self {
            Self::User => "Utilisateur",
            Self::Assistant => "Assistant",
            Self::System => "Système",
        }
    }

    #[must_use]
    pub const fn as_sender(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "ai",
            Self::System => "system",
        }
    }

    #[must_use]
    pub fn from_sender(sender: &str) -> Self {
        match sender {
            "ai" | "assistant" => Self::Assistant,
            "system" => Self::System,
            _ => Self::User,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Key space of memory records: one record per conversation, or a single
/// record shared by every conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryScope {
    #[default]
    Conversation,
    Global,
}

/// Image attached to a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// Everything the text generator needs for one completion.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: Option<ImageInput>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            max_tokens: 250,
            temperature: 0.7,
            top_p: 0.9,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }

    #[must_use]
    pub const fn with_sampling(mut self, max_tokens: u32, temperature: f32, top_p: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self.top_p = top_p;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutput {
    pub generated_text: String,
}

/// The pretrained model behind the chat. Opaque: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<GenerationOutput>;
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<G: TextGenerator + ?Sized> TextGenerator for Arc<G> {
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<GenerationOutput> {
        (**self).generate(request).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Turns an uploaded document into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract_pdf(&self, bytes: &[u8]) -> anyhow::Result<String>;
}

/// A persisted chat message row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: i64,
    pub conversation_id: String,
    pub message_id: String,
    pub role: Role,
    pub text: String,
}

impl From<&StoredMessage> for ChatMessage {
    fn from(message: &StoredMessage) -> Self {
        Self::new(message.role, message.text.clone())
    }
}

/// A message about to be written; the store assigns the row id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMessage {
    pub message_id: String,
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<StoredMessage>,
}

/// CRUD over conversations and their transcripts.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create(&self, id: &str, title: &str) -> anyhow::Result<Conversation>;
    async fn get(&self, id: &str) -> anyhow::Result<Option<Conversation>>;
    async fn list(&self, skip: u64, limit: u64) -> anyhow::Result<Vec<Conversation>>;
    async fn rename(&self, id: &str, title: &str) -> anyhow::Result<Option<Conversation>>;
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
    async fn add_message(&self, id: &str, message: NewMessage) -> anyhow::Result<StoredMessage>;
    async fn messages(&self, id: &str) -> anyhow::Result<Vec<StoredMessage>>;
    /// Replace the whole transcript, creating the conversation if needed.
    async fn save_with_messages(
        &self,
        id: &str,
        title: &str,
        messages: Vec<NewMessage>,
    ) -> anyhow::Result<Conversation>;
}

#[async_trait]
impl<S: ConversationStore + ?Sized> ConversationStore for Arc<S> {
    async fn create(&self, id: &str, title: &str) -> anyhow::Result<Conversation> {
        (**self).create(id, title).await
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<Conversation>> {
        (**self).get(id).await
    }

    async fn list(&self, skip: u64, limit: u64) -> anyhow::Result<Vec<Conversation>> {
        (**self).list(skip, limit).await
    }

    async fn rename(&self, id: &str, title: &str) -> anyhow::Result<Option<Conversation>> {
        (**self).rename(id, title).await
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        (**self).delete(id).await
    }

    async fn add_message(&self, id: &str, message: NewMessage) -> anyhow::Result<StoredMessage> {
        (**self).add_message(id, message).await
    }

    async fn messages(&self, id: &str) -> anyhow::Result<Vec<StoredMessage>> {
        (**self).messages(id).await
    }

    async fn save_with_messages(
        &self,
        id: &str,
        title: &str,
        messages: Vec<NewMessage>,
    ) -> anyhow::Result<Conversation> {
        (**self).save_with_messages(id, title, messages).await
    }
}
