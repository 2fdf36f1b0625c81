//! Integration tests for the memory store.
//!
//! These tests verify:
//! - Self-healing loads (missing and corrupt records)
//! - Save/load round trips on both backends
//! - Fact upsert/removal and listing

use std::sync::Arc;

use souvenir_core::MemoryScope;
use souvenir_memory::{
    GLOBAL_RECORD_KEY, JsonFileBackend, MemoryBackend, MemoryError, MemoryRecord, MemoryStore,
    PerConversation, SqlMemoryBackend, default_extractor, format_context,
};

/// Two loads of a missing id give equal empty records, and a third load
/// returns the persisted one unchanged.
#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_load_creates_and_persists_empty_record() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let backend = JsonFileBackend::new(dir.path());

    let first = backend.load("abc").await.expect("first load");
    assert!(dir.path().join("abc.json").exists());
    let second = backend.load("abc").await.expect("second load");
    let third = backend.load("abc").await.expect("third load");

    assert_eq!(first.conversation_id, "abc");
    assert!(first.memories.is_empty());
    assert_eq!(first.memories, second.memories);
    assert_eq!(first.conversation_id, second.conversation_id);
    assert_eq!(second, third);
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_save_then_load_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let backend = JsonFileBackend::new(dir.path());

    let mut record = MemoryRecord::empty("r1");
    record.title = Some("Vacances".to_string());
    record.set_fact("name", "Marie");
    record.set_fact("location", "lyon");
    let before_save = record.updated_at;

    assert!(backend.save("r1", &mut record).await);
    assert!(record.updated_at >= before_save);

    let loaded = backend.load("r1").await.expect("load after save");
    assert_eq!(loaded, record);
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_corrupt_file_yields_fresh_record() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    std::fs::write(dir.path().join("broken.json"), b"{ not json").expect("write corrupt file");

    let backend = JsonFileBackend::new(dir.path());
    let record = backend.load("broken").await.expect("corrupt load heals");
    assert!(record.memories.is_empty());

    let raw = std::fs::read_to_string(dir.path().join("broken.json")).expect("file rewritten");
    let reparsed: MemoryRecord = serde_json::from_str(&raw).expect("rewritten file parses");
    assert_eq!(reparsed.conversation_id, "broken");
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_upsert_then_remove_fact() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = MemoryStore::json(dir.path(), MemoryScope::Conversation);

    let record = store.upsert_fact("c1", "hobby", "escalade").await.expect("upsert");
    assert_eq!(
        record.memories.get("hobby").map(|f| f.value.as_str()),
        Some("escalade")
    );

    let record = store.remove_fact("c1", "hobby").await.expect("remove");
    assert!(!record.memories.contains_key("hobby"));

    let again = store.remove_fact("c1", "hobby").await;
    assert!(matches!(again, Err(MemoryError::FactNotFound { .. })));
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_concurrent_upserts_on_distinct_ids() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = MemoryStore::json(dir.path(), MemoryScope::Conversation);

    let mut handles = Vec::new();
    for id in ["alpha", "beta"] {
        for n in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert_fact(id, &format!("fact{n}"), &format!("{id}-{n}"))
                    .await
            }));
        }
    }
    for handle in handles {
        handle.await.expect("task joins").expect("upsert succeeds");
    }

    let alpha = store.load("alpha").await.expect("alpha loads");
    let beta = store.load("beta").await.expect("beta loads");
    assert!(alpha.memories.iter().all(|(_, f)| f.value.starts_with("alpha-")));
    assert!(beta.memories.iter().all(|(_, f)| f.value.starts_with("beta-")));
    assert!(!alpha.memories.is_empty());
    assert!(!beta.memories.is_empty());
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_list_all_skips_global_record() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = MemoryStore::json(dir.path(), MemoryScope::Conversation);
    let global = MemoryStore::json(dir.path(), MemoryScope::Global);

    store.upsert_fact("c1", "age", "25").await.expect("c1 upsert");
    store.set_title("c2", "Cuisine").await.expect("c2 title");
    global.upsert_fact("any", "name", "Paul").await.expect("global upsert");
    assert!(dir.path().join(format!("{GLOBAL_RECORD_KEY}.json")).exists());

    let all = store.list_all().await.expect("listing works");
    assert_eq!(all.keys().collect::<Vec<_>>(), vec!["c1", "c2"]);
    assert_eq!(all["c2"].title.as_deref(), Some("Cuisine"));
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_clear_and_delete() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = MemoryStore::json(dir.path(), MemoryScope::Conversation);

    store.upsert_fact("c1", "age", "25").await.expect("upsert");
    let cleared = store.clear("c1").await.expect("clear");
    assert!(cleared.memories.is_empty());
    assert!(dir.path().join("c1.json").exists());

    assert!(store.delete("c1").await);
    assert!(!store.delete("c1").await);
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_extracted_facts_reach_the_context() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = MemoryStore::json(dir.path(), MemoryScope::Conversation);

    let extraction = default_extractor().extract("Je m'appelle Marie Dupont et je travaille comme infirmière");
    let record = store
        .merge_facts("c1", &extraction)
        .await
        .expect("merge")
        .expect("facts were written");
    let context = format_context(&record);

    assert!(context.starts_with("### Informations importantes"));
    assert!(context.contains("s'appelle Marie Dupont"));
    assert!(context.contains("- Profession: infirmière"));
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_empty_extraction_creates_no_record() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = MemoryStore::json(dir.path(), MemoryScope::Conversation);

    let extraction = default_extractor().extract("Quel temps fait-il demain ?");
    assert!(extraction.is_empty());

    let merged = store.merge_facts("c1", &extraction).await.expect("merge");
    assert!(merged.is_none());
    assert!(!dir.path().join("c1.json").exists());
}

/// The relational backend honors the same contract as the JSON one.
#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_sql_backend_contract() {
    let backend = SqlMemoryBackend::connect("sqlite::memory:")
        .await
        .expect("in-memory database opens");

    let empty = backend.load("c1").await.expect("first load creates");
    assert!(empty.memories.is_empty());
    assert_eq!(backend.list_keys().await.expect("list"), vec!["c1".to_string()]);

    let mut record = empty;
    record.set_fact("location", "nantes");
    record.set_fact("age", "31");
    assert!(backend.save("c1", &mut record).await);

    record.set_fact("location", "rennes");
    record.memories.remove("age");
    record.set_fact("job", "plombier");
    assert!(backend.save("c1", &mut record).await);

    let loaded = backend.load("c1").await.expect("reload");
    assert_eq!(
        loaded.memories.keys().collect::<Vec<_>>(),
        vec!["location", "job"]
    );
    assert_eq!(
        loaded.memories.get("location").map(|f| f.value.as_str()),
        Some("rennes")
    );

    assert!(backend.delete("c1").await);
    assert!(!backend.delete("c1").await);
    assert!(backend.list_keys().await.expect("list").is_empty());
}

#[tokio::test]
#[expect(clippy::expect_used, reason = "Test failure should panic with context")]
async fn test_store_over_sql_backend() {
    let backend = SqlMemoryBackend::connect("sqlite::memory:")
        .await
        .expect("in-memory database opens");
    let store = MemoryStore::new(Arc::new(backend), Arc::new(PerConversation));

    store.upsert_fact("c9", "name", "Léa").await.expect("upsert");
    let again = store.remove_fact("c9", "age").await;
    assert!(matches!(again, Err(MemoryError::FactNotFound { .. })));

    let context = format_context(&store.load("c9").await.expect("load"));
    assert!(context.contains("s'appelle Léa"));
}
