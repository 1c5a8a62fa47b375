//! Cached rate snapshot and last selected pair.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use converter_types::{CurrencyPair, KeyValueStore, RateEntry, RepoError};

use crate::codec::{read_json, write_json};
use crate::keys;

/// Persists what the converter needs to come back up offline.
pub struct RateCache<S: KeyValueStore> {
    kv: Arc<S>,
}

impl<S: KeyValueStore> RateCache<S> {
    pub fn new(kv: Arc<S>) -> Self {
        Self { kv }
    }

    /// Stores the snapshot, then the time it was fetched.
    pub async fn save_rates(&self, entries: &[RateEntry], now: DateTime<Utc>) -> Result<(), RepoError> {
        write_json(&*self.kv, keys::EXCHANGE_RATES, entries).await?;
        write_json(&*self.kv, keys::LAST_UPDATE_TIME, &now).await
    }

    /// The stored snapshot, or nothing when missing or unreadable.
    pub async fn load_rates(&self) -> Vec<RateEntry> {
        match read_json(&*self.kv, keys::EXCHANGE_RATES).await {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cached rates");
                Vec::new()
            }
        }
    }

    pub async fn last_update_time(&self) -> Option<DateTime<Utc>> {
        match read_json(&*self.kv, keys::LAST_UPDATE_TIME).await {
            Ok(at) => at,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable last update time");
                None
            }
        }
    }

    pub async fn save_pair(&self, pair: CurrencyPair) -> Result<(), RepoError> {
        write_json(&*self.kv, keys::CURRENCY_PAIR, &pair).await
    }

    pub async fn load_pair(&self) -> Option<CurrencyPair> {
        match read_json(&*self.kv, keys::CURRENCY_PAIR).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable saved pair");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use converter_types::Currency;

    #[tokio::test]
    async fn test_rates_roundtrip_with_timestamp() {
        let cache = RateCache::new(Arc::new(MemoryStore::new()));
        let now = Utc::now();
        let entries = vec![RateEntry::new(Currency::USD, Currency::EUR, 0.92, now)];

        assert!(cache.load_rates().await.is_empty());
        assert_eq!(cache.last_update_time().await, None);

        cache.save_rates(&entries, now).await.unwrap();

        assert_eq!(cache.load_rates().await, entries);
        assert_eq!(cache.last_update_time().await, Some(now));
    }

    #[tokio::test]
    async fn test_unreadable_rates_are_empty() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(keys::EXCHANGE_RATES, b"[{]".to_vec()).await.unwrap();

        let cache = RateCache::new(kv);
        assert!(cache.load_rates().await.is_empty());
    }

    #[tokio::test]
    async fn test_pair_roundtrip() {
        let cache = RateCache::new(Arc::new(MemoryStore::new()));
        let pair = CurrencyPair::new(Currency::GBP, Currency::CHF);

        assert_eq!(cache.load_pair().await, None);
        cache.save_pair(pair).await.unwrap();
        assert_eq!(cache.load_pair().await, Some(pair));
    }
}
