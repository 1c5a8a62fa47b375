//! Favorite currency pairs.

use std::sync::Arc;

use tracing::{debug, instrument};

use converter_types::{CurrencyPair, FavoriteConversion, FavoriteId, KeyValueStore, RepoError};

use crate::codec::{read_json, write_json};
use crate::keys;

/// Bookmarked pairs in insertion order, unique by pair.
///
/// Unlike history, write failures propagate: the in-memory list only changes
/// once the gateway has accepted the new list.
pub struct FavoritesStore<S: KeyValueStore> {
    kv: Arc<S>,
    favorites: Vec<FavoriteConversion>,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    #[instrument(skip(kv))]
    pub async fn load(kv: Arc<S>) -> Result<Self, RepoError> {
        let favorites: Vec<FavoriteConversion> = read_json(&*kv, keys::FAVORITE_CONVERSIONS)
            .await?
            .unwrap_or_default();
        debug!(count = favorites.len(), "Favorites loaded");
        Ok(Self { kv, favorites })
    }

    /// A store with nothing loaded, for when hydration failed.
    pub fn empty(kv: Arc<S>) -> Self {
        Self {
            kv,
            favorites: Vec::new(),
        }
    }

    /// Appends `pair`. `Ok(None)` when it is already bookmarked.
    pub async fn add(&mut self, pair: CurrencyPair) -> Result<Option<FavoriteConversion>, RepoError> {
        if self.contains(pair) {
            return Ok(None);
        }

        let favorite = FavoriteConversion::new(pair);
        let mut next = self.favorites.clone();
        next.push(favorite.clone());

        write_json(&*self.kv, keys::FAVORITE_CONVERSIONS, &next).await?;
        self.favorites = next;
        Ok(Some(favorite))
    }

    /// Removes by id. `Ok(false)` when no such favorite exists.
    pub async fn remove(&mut self, id: FavoriteId) -> Result<bool, RepoError> {
        if self.get(id).is_none() {
            return Ok(false);
        }

        let next: Vec<FavoriteConversion> = self
            .favorites
            .iter()
            .filter(|f| f.id != id)
            .cloned()
            .collect();

        write_json(&*self.kv, keys::FAVORITE_CONVERSIONS, &next).await?;
        self.favorites = next;
        Ok(true)
    }

    pub fn list(&self) -> &[FavoriteConversion] {
        &self.favorites
    }

    pub fn contains(&self, pair: CurrencyPair) -> bool {
        self.favorites.iter().any(|f| f.pair == pair)
    }

    pub fn get(&self, id: FavoriteId) -> Option<&FavoriteConversion> {
        self.favorites.iter().find(|f| f.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use async_trait::async_trait;
    use converter_types::Currency;

    /// Reads succeed, every write fails.
    #[derive(Default)]
    struct ReadOnlyStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RepoError> {
            self.inner.get(key).await
        }

        async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), RepoError> {
            Err(RepoError::Storage("read-only".into()))
        }
    }

    fn usd_eur() -> CurrencyPair {
        CurrencyPair::new(Currency::USD, Currency::EUR)
    }

    #[tokio::test]
    async fn test_add_and_reload() {
        let kv = Arc::new(MemoryStore::new());
        let mut store = FavoritesStore::load(kv.clone()).await.unwrap();

        let added = store.add(usd_eur()).await.unwrap().unwrap();
        store
            .add(CurrencyPair::new(Currency::GBP, Currency::RUB))
            .await
            .unwrap();

        let reloaded = FavoritesStore::load(kv).await.unwrap();
        assert_eq!(reloaded.list().len(), 2);
        assert_eq!(reloaded.list()[0], added);
    }

    #[tokio::test]
    async fn test_duplicate_pair_is_ignored() {
        let kv = Arc::new(MemoryStore::new());
        let mut store = FavoritesStore::load(kv).await.unwrap();

        assert!(store.add(usd_eur()).await.unwrap().is_some());
        assert!(store.add(usd_eur()).await.unwrap().is_none());
        assert_eq!(store.list().len(), 1);
    }

    #[tokio::test]
    async fn test_reverse_pair_is_distinct() {
        let kv = Arc::new(MemoryStore::new());
        let mut store = FavoritesStore::load(kv).await.unwrap();

        store.add(usd_eur()).await.unwrap();
        assert!(store.add(usd_eur().swapped()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove() {
        let kv = Arc::new(MemoryStore::new());
        let mut store = FavoritesStore::load(kv).await.unwrap();
        let added = store.add(usd_eur()).await.unwrap().unwrap();

        assert!(store.remove(added.id).await.unwrap());
        assert!(!store.contains(usd_eur()));
        assert!(!store.remove(added.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_data_is_an_error() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(keys::FAVORITE_CONVERSIONS, b"{oops".to_vec())
            .await
            .unwrap();

        let result = FavoritesStore::load(kv).await;
        assert!(matches!(result, Err(RepoError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_untouched() {
        let kv = Arc::new(ReadOnlyStore::default());
        let mut store = FavoritesStore::load(kv).await.unwrap();

        let result = store.add(usd_eur()).await;

        assert!(matches!(result, Err(RepoError::Storage(_))));
        assert!(store.list().is_empty());
    }
}
