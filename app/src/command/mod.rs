//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type.

use sea_orm::{Database, DatabaseConnection};
use souvenir_config::{Config, MemoryBackendKind};
use souvenir_core::MemoryScope;
use souvenir_memory::{MemoryStore, SqlMemoryBackend, resolver_for};
use std::sync::Arc;
use tracing::info;

mod chat;
mod conversations;
mod info;
mod init;
mod memory;
mod version;

pub use chat::{ChatArgs, ChatStrategy};
pub use conversations::{ConversationAction, ConversationsStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use memory::{MemoryAction, MemoryArgs, MemoryStrategy};
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Things every data-touching command needs.
pub struct CommonComponents {
    pub config: Config,
    pub db: DatabaseConnection,
    pub memory: MemoryStore,
}

/// Load the config, open the database and build the memory store.
///
/// `scope` overrides the configured memory scope.
pub async fn init_common_components(scope: Option<MemoryScope>) -> anyhow::Result<CommonComponents> {
    let config = Config::load()?;
    info!("Loaded config from {}", Config::config_path()?.display());

    Config::ensure_data_dir()?;
    let database_url = config.database_url()?;
    let db = Database::connect(&database_url).await?;

    let scope = scope.unwrap_or(config.memory.scope);
    let memory = match config.memory.backend {
        MemoryBackendKind::Json => {
            let dir = config.memory_dir()?;
            info!("Memory records in {}", dir.display());
            MemoryStore::json(dir, scope)
        }
        MemoryBackendKind::Database => {
            info!("Memory records in the conversation_memories table");
            let backend = SqlMemoryBackend::new(db.clone()).await?;
            MemoryStore::new(Arc::new(backend), resolver_for(scope))
        }
    };

    Ok(CommonComponents { config, db, memory })
}
