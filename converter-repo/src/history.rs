//! Conversion history store.
//!
//! Records are held newest first and mirrored to the gateway after every
//! mutation. The store is best-effort: a failed write is logged and the
//! in-memory state stays authoritative for the rest of the session.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, instrument, warn};

use converter_types::{ConversionRecord, HistoryQuery, HistoryStats, KeyValueStore, RecordId};

use crate::codec::{read_json, write_json};
use crate::keys;

/// Maximum number of records kept; older ones are dropped on insert.
pub const HISTORY_CAPACITY: usize = 1000;

pub struct HistoryStore<S: KeyValueStore> {
    kv: Arc<S>,
    records: Vec<ConversionRecord>,
    favorite_ids: HashSet<RecordId>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Hydrates from the gateway. Undecodable data starts the store empty.
    #[instrument(skip(kv))]
    pub async fn load(kv: Arc<S>) -> Self {
        let mut records = match read_json::<Vec<ConversionRecord>, _>(&*kv, keys::CONVERSION_HISTORY).await {
            Ok(records) => records.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable conversion history");
                Vec::new()
            }
        };
        let favorite_ids = match read_json::<HashSet<RecordId>, _>(&*kv, keys::FAVORITE_RECORD_IDS).await {
            Ok(ids) => ids.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable favorite record ids");
                HashSet::new()
            }
        };

        records.truncate(HISTORY_CAPACITY);
        for record in &mut records {
            record.is_favorite = favorite_ids.contains(&record.id);
        }

        debug!(records = records.len(), favorites = favorite_ids.len(), "History loaded");
        Self {
            kv,
            records,
            favorite_ids,
        }
    }

    /// Inserts `record` as the newest entry, evicting beyond [`HISTORY_CAPACITY`].
    pub async fn add(&mut self, mut record: ConversionRecord) {
        record.is_favorite = self.favorite_ids.contains(&record.id);
        self.records.insert(0, record);

        if self.records.len() > HISTORY_CAPACITY {
            let evicted = self.records.split_off(HISTORY_CAPACITY);
            let before = self.favorite_ids.len();
            for record in &evicted {
                self.favorite_ids.remove(&record.id);
            }
            debug!(evicted = evicted.len(), "History truncated");
            if self.favorite_ids.len() != before {
                self.persist_favorite_ids().await;
            }
        }

        self.persist_records().await;
    }

    /// Removes the record and its favorite mark. Returns whether it existed.
    pub async fn delete(&mut self, id: RecordId) -> bool {
        let Some(index) = self.records.iter().position(|r| r.id == id) else {
            return false;
        };
        self.records.remove(index);
        self.persist_records().await;

        if self.favorite_ids.remove(&id) {
            self.persist_favorite_ids().await;
        }
        true
    }

    pub fn query(&self, query: &HistoryQuery) -> Vec<ConversionRecord> {
        query.apply(&self.records)
    }

    pub async fn clear(&mut self) {
        self.records.clear();
        self.favorite_ids.clear();
        self.persist_records().await;
        self.persist_favorite_ids().await;
    }

    pub fn stats(&self, now: DateTime<Utc>) -> HistoryStats {
        let this_month = self
            .records
            .iter()
            .filter(|r| r.is_this_month(now))
            .count();
        let distinct_pairs = self
            .records
            .iter()
            .map(|r| r.pair())
            .collect::<HashSet<_>>()
            .len();

        HistoryStats {
            total: self.records.len(),
            this_month,
            distinct_pairs,
        }
    }

    /// Flips the favorite mark. `None` when no such record exists.
    pub async fn toggle_favorite(&mut self, id: RecordId) -> Option<bool> {
        let record = self.records.iter_mut().find(|r| r.id == id)?;

        let marked = if self.favorite_ids.remove(&id) {
            false
        } else {
            self.favorite_ids.insert(id);
            true
        };
        record.is_favorite = marked;

        self.persist_favorite_ids().await;
        self.persist_records().await;
        Some(marked)
    }

    pub fn is_favorite(&self, id: RecordId) -> bool {
        self.favorite_ids.contains(&id)
    }

    /// Replaces the tags and note of a record. Returns whether it existed.
    pub async fn annotate(&mut self, id: RecordId, tags: Vec<String>, note: Option<String>) -> bool {
        let Some(record) = self.records.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        record.tags = tags;
        record.note = note.filter(|n| !n.trim().is_empty());
        self.persist_records().await;
        true
    }

    pub fn get(&self, id: RecordId) -> Option<&ConversionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// All records, newest first.
    pub fn records(&self) -> &[ConversionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    async fn persist_records(&self) {
        if let Err(e) = write_json(&*self.kv, keys::CONVERSION_HISTORY, &self.records).await {
            error!(error = %e, "Failed to persist conversion history");
        }
    }

    async fn persist_favorite_ids(&self) {
        if let Err(e) = write_json(&*self.kv, keys::FAVORITE_RECORD_IDS, &self.favorite_ids).await {
            error!(error = %e, "Failed to persist favorite record ids");
        }
    }
}
