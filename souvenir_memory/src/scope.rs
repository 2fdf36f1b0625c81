//! Key space strategies for memory records.

use souvenir_core::MemoryScope;
use std::sync::Arc;

/// Storage key of the record shared by every conversation.
pub const GLOBAL_RECORD_KEY: &str = "user_memory";

/// Maps a conversation id to the key its memory is stored under.
pub trait ScopeResolver: Send + Sync {
    fn storage_key(&self, conversation_id: &str) -> String;
    fn scope(&self) -> MemoryScope;
}

/// One record per conversation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerConversation;

impl ScopeResolver for PerConversation {
    fn storage_key(&self, conversation_id: &str) -> String {
        conversation_id.to_string()
    }

    fn scope(&self) -> MemoryScope {
        MemoryScope::Conversation
    }
}

/// A single record, whatever the conversation.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalMemory;

impl ScopeResolver for GlobalMemory {
    fn storage_key(&self, _conversation_id: &str) -> String {
        GLOBAL_RECORD_KEY.to_string()
    }

    fn scope(&self) -> MemoryScope {
        MemoryScope::Global
    }
}

#[must_use]
pub fn resolver_for(scope: MemoryScope) -> Arc<dyn ScopeResolver> {
    match scope {
        MemoryScope::Conversation => Arc::new(PerConversation),
        MemoryScope::Global => Arc::new(GlobalMemory),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_scope_uses_id() {
        let resolver = resolver_for(MemoryScope::Conversation);
        assert_eq!(resolver.storage_key("abc"), "abc");
        assert_eq!(resolver.scope(), MemoryScope::Conversation);
    }

    #[test]
    fn global_scope_ignores_id() {
        let resolver = resolver_for(MemoryScope::Global);
        assert_eq!(resolver.storage_key("abc"), GLOBAL_RECORD_KEY);
        assert_eq!(resolver.storage_key("xyz"), GLOBAL_RECORD_KEY);
    }
}
