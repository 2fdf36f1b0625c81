use thiserror::Error;

/// Errors that can occur while handling a chat turn.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Generation error: {0}")]
    Generation(#[source] anyhow::Error),

    #[error("Conversation storage error: {0}")]
    Storage(#[source] anyhow::Error),

    #[error("Memory error: {0}")]
    Memory(#[from] souvenir_memory::MemoryError),

    #[error("Document error: {0}")]
    Document(#[source] anyhow::Error),

    #[error("Empty message")]
    EmptyMessage,

    #[error("Conversation not found: {0}")]
    NotFound(String),
}
