#![warn(
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

//! sea-orm entities for the relational store.

pub mod conversation_memories;
pub mod conversations;
pub mod memory_records;
pub mod messages;

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};

fn is_table_already_exists_error(err: &DbErr) -> bool {
    err.to_string().contains("table") && err.to_string().contains("already exists")
}

/// Create the table backing `entity`. Returns `false` when it already existed.
pub async fn ensure_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<bool, DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let stmt = schema.create_table_from_entity(entity);
    match db.execute_unprepared(&backend.build(&stmt).to_string()).await {
        Ok(_) => Ok(true),
        Err(e) if is_table_already_exists_error(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Database;

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    async fn ensure_table_is_idempotent() {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("in-memory database opens");

        assert!(ensure_table(&db, conversations::Entity).await.expect("create"));
        assert!(!ensure_table(&db, conversations::Entity).await.expect("exists"));
        assert!(ensure_table(&db, memory_records::Entity).await.expect("create"));
    }
}
