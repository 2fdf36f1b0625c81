use thiserror::Error;

pub type Result<T> = std::result::Result<T, MemoryError>;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Memory record not found: {0}")]
    NotFound(String),

    #[error("Fact '{category}' not found in memory record {id}")]
    FactNotFound { id: String, category: String },

    #[error("Invalid memory record id: {0:?}")]
    InvalidKey(String),

    #[error("Failed to persist memory record {0}")]
    SaveFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}
