use clap::Subcommand;
use souvenir_conversation::SqlConversationStore;
use souvenir_core::{ConversationStore, MemoryScope};
use tracing::warn;

use super::init_common_components;

#[derive(Debug, Clone, Subcommand)]
pub enum ConversationAction {
    /// List conversations
    List {
        #[arg(long, default_value_t = 0)]
        skip: u64,
        #[arg(long, default_value_t = 100)]
        limit: u64,
    },
    /// Print a conversation transcript
    Show { id: String },
    /// Change a conversation title
    Rename { id: String, title: String },
    /// Delete a conversation and its memory
    Delete { id: String },
}

/// Strategy for the `conversations` command family.
#[derive(Debug, Clone, Copy)]
pub struct ConversationsStrategy;

impl super::CommandStrategy for ConversationsStrategy {
    type Input = ConversationAction;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let common = init_common_components(None).await?;
        let store = SqlConversationStore::new(common.db.clone()).await?;
        let per_conversation = common.memory.scope() == MemoryScope::Conversation;

        match input {
            ConversationAction::List { skip, limit } => {
                let conversations = store.list(skip, limit).await?;
                if conversations.is_empty() {
                    println!("No conversations.");
                }
                for conversation in conversations {
                    println!(
                        "{}  {}  ({} messages, {})",
                        conversation.id,
                        conversation.title,
                        conversation.messages.len(),
                        conversation.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
            ConversationAction::Show { id } => {
                let conversation = store
                    .get(&id)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("Conversation not found: {id}"))?;
                println!("=== {} ===\n", conversation.title);
                for message in &conversation.messages {
                    println!("{}: {}\n", message.role.prompt_label(), message.text);
                }
            }
            ConversationAction::Rename { id, title } => {
                store
                    .rename(&id, &title)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("Conversation not found: {id}"))?;
                if per_conversation {
                    if let Err(e) = common.memory.set_title(&id, &title).await {
                        warn!("Could not rename memory record {id}: {e}");
                    }
                }
                println!("✅ Renamed {id} to {title}");
            }
            ConversationAction::Delete { id } => {
                if !store.delete(&id).await? {
                    anyhow::bail!("Conversation not found: {id}");
                }
                // The global record is shared and outlives any conversation.
                if per_conversation {
                    common.memory.delete(&id).await;
                }
                println!("✅ Deleted conversation {id}");
            }
        }

        Ok(())
    }
}
