//! # Converter Repository
//!
//! Concrete persistence adapters and the stores built on top of them.
//!
//! - `memory` / `sqlite` - adapters implementing the `KeyValueStore` port
//! - `history`, `favorites`, `cache`, `preferences` - stores that hydrate from
//!   the gateway once and write a full copy of their key on every mutation

use async_trait::async_trait;
use converter_types::{KeyValueStore, RepoError};

pub mod cache;
mod codec;
pub mod favorites;
pub mod history;
pub mod keys;
pub mod memory;
pub mod preferences;
#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use cache::RateCache;
pub use favorites::FavoritesStore;
pub use history::{HISTORY_CAPACITY, HistoryStore};
pub use memory::MemoryStore;
pub use preferences::PreferencesStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Unified key/value gateway selected at startup from a URL.
pub enum Store {
    Memory(MemoryStore),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteStore),
}

/// Build and initialize a key/value gateway from a store URL.
///
/// - `memory://` - process-local, nothing survives a restart
/// - `sqlite://path/to/file.db`, `sqlite::memory:` - requires the `sqlite` feature
///
/// # Examples
///
/// ```ignore
/// let store = build_store("sqlite://converter.db").await?;
/// ```
pub async fn build_store(url: &str) -> anyhow::Result<Store> {
    match url {
        u if u.starts_with("memory:") => Ok(Store::Memory(MemoryStore::new())),
        #[cfg(feature = "sqlite")]
        u if u.starts_with("sqlite:") => Ok(Store::Sqlite(SqliteStore::new(u).await?)),
        other => anyhow::bail!("Unsupported store URL: {}", other),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Implement KeyValueStore for Store (delegation)
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl KeyValueStore for Store {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RepoError> {
        match self {
            Store::Memory(inner) => inner.get(key).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(inner) => inner.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), RepoError> {
        match self {
            Store::Memory(inner) => inner.set(key, value).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(inner) => inner.set(key, value).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_memory_store() {
        let store = build_store("memory://").await.unwrap();
        store.set("k", b"v".to_vec()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_unsupported_url() {
        assert!(build_store("redis://localhost").await.is_err());
    }
}
