//! Persistence gateway port.
//!
//! A passive key/value mirror. Stores hydrate from it once and push a full
//! copy of the affected key on every mutation. Writes are atomic per key;
//! there are no multi-key transactions.

use crate::error::RepoError;

#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the bytes stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RepoError>;

    /// Replaces the bytes stored under `key`.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), RepoError>;
}
