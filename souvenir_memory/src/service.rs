//! The two entry points the chat pipeline uses: learn from a user message,
//! and recall what is known as prompt context.

use tracing::{error, info, warn};

use crate::context::format_context;
use crate::extractor::{Extraction, Extractor, default_extractor};
use crate::store::MemoryStore;

pub struct MemoryService {
    store: MemoryStore,
    extractor: Option<Extractor>,
}

impl MemoryService {
    /// Uses the built-in French pattern library.
    #[must_use]
    pub const fn new(store: MemoryStore) -> Self {
        Self {
            store,
            extractor: None,
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    #[must_use]
    pub const fn store(&self) -> &MemoryStore {
        &self.store
    }

    fn extractor(&self) -> &Extractor {
        self.extractor.as_ref().unwrap_or_else(|| default_extractor())
    }

    /// Extract facts from `message` and merge them into the conversation's
    /// memory. Storage failures are logged; the extraction is returned
    /// either way.
    pub async fn process_user_message(&self, conversation_id: &str, message: &str) -> Extraction {
        if conversation_id.is_empty() || message.is_empty() {
            warn!("Missing conversation id or message, skipping fact extraction");
            return Extraction::default();
        }

        let extraction = self.extractor().extract(message);
        if extraction.is_empty() {
            return extraction;
        }

        match self.store.merge_facts(conversation_id, &extraction).await {
            Ok(_) => info!("Saved user facts for conversation {conversation_id}"),
            Err(e) => error!("Failed to store facts for conversation {conversation_id}: {e}"),
        }
        extraction
    }

    /// Formatted memory for the prompt, empty when nothing is known or the
    /// record cannot be read.
    pub async fn conversation_context(&self, conversation_id: &str) -> String {
        if conversation_id.is_empty() {
            warn!("Context requested without a conversation id");
            return String::new();
        }

        match self.store.load(conversation_id).await {
            Ok(record) => format_context(&record),
            Err(e) => {
                error!("Failed to read memory for conversation {conversation_id}: {e}");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use souvenir_core::MemoryScope;

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn learns_then_recalls() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let service = MemoryService::new(MemoryStore::json(dir.path(), MemoryScope::Conversation));

        let extraction = service
            .process_user_message("c1", "Je m'appelle Paul et j'ai 40 ans")
            .await;
        assert_eq!(extraction.get("name"), Some("Paul"));

        let context = service.conversation_context("c1").await;
        assert!(context.contains("s'appelle Paul"));
        assert!(context.contains("- Âge: 40"));

        assert_eq!(service.conversation_context("c2").await, "");
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn unmatched_message_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let service = MemoryService::new(MemoryStore::json(dir.path(), MemoryScope::Conversation));

        assert!(service.process_user_message("c1", "Bonjour").await.is_empty());
        assert!(!dir.path().join("c1.json").exists());
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn global_scope_shares_facts() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let service = MemoryService::new(MemoryStore::json(dir.path(), MemoryScope::Global));

        service.process_user_message("c1", "J'habite à Lyon").await;
        let context = service.conversation_context("c2").await;
        assert!(context.contains("- Lieu de résidence: lyon"));
        assert!(dir.path().join("user_memory.json").exists());
    }

    #[tokio::test]
    async fn missing_id_is_ignored() {
        let service = MemoryService::new(MemoryStore::json("/nonexistent", MemoryScope::Conversation));
        assert!(service.process_user_message("", "J'ai 20 ans").await.is_empty());
        assert_eq!(service.conversation_context("").await, "");
    }
}
