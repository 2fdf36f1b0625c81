//! Persistence backends for memory records.

use async_trait::async_trait;

use crate::error::Result;
use crate::record::MemoryRecord;

mod json;
mod sql;

pub use json::JsonFileBackend;
pub use sql::SqlMemoryBackend;

/// Persists memory records by storage key.
///
/// `load` is not read-only: a missing or unreadable record is replaced by a
/// fresh empty one, which is persisted before being returned.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    async fn load(&self, key: &str) -> Result<MemoryRecord>;

    /// Stamps `updated_at` and writes the record. Never raises.
    async fn save(&self, key: &str, record: &mut MemoryRecord) -> bool;

    /// `false` when nothing is stored under `key`.
    async fn delete(&self, key: &str) -> bool;

    async fn list_keys(&self) -> Result<Vec<String>>;
}

/// Keys end up in file names, so path-like ids are refused.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(crate::error::MemoryError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys() {
        assert!(validate_key("1714558800000").is_ok());
        assert!(validate_key("0190a3c2-7c1e-7d3a-9a57-1f2c3d4e5f60").is_ok());
        assert!(validate_key("user_memory").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("..").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a/b").is_err());
    }
}
