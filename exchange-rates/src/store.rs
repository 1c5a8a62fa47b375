//! Rate snapshot store.
//!
//! The store holds the latest fetched rates keyed by ordered pair and
//! resolves any requested pair through direct, inverse or USD-triangulated
//! lookup. Snapshots are replaced wholesale; readers always see either the
//! previous or the next snapshot, never a mix.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::{Currency, CurrencyPair, RateEntry};

/// Abstraction over rate lookup so callers can substitute a fixed table in tests.
pub trait RateCalculator: Send + Sync {
    /// Replaces the whole snapshot with `entries`.
    fn update_rates(&self, entries: Vec<RateEntry>);

    /// Units of `to` per unit of `from`, or `0.0` when no path exists.
    fn get_rate(&self, from: Currency, to: Currency) -> f64;
}

/// Ticket identifying one snapshot update, issued in strictly increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UpdateTicket(u64);

impl UpdateTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    generation: u64,
    rates: HashMap<CurrencyPair, RateEntry>,
}

/// Default [`RateCalculator`] backed by an atomically swapped snapshot.
#[derive(Debug, Default)]
pub struct RateStore {
    snapshot: RwLock<Arc<Snapshot>>,
    issued: AtomicU64,
}

impl RateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `entries`.
    pub fn with_rates(entries: Vec<RateEntry>) -> Self {
        let store = Self::new();
        store.update_rates(entries);
        store
    }

    /// Issues a ticket for an update that is about to start.
    ///
    /// Take the ticket before starting the fetch, not after it completes:
    /// ordering is by start, and only the newest started update may land.
    pub fn begin_update(&self) -> UpdateTicket {
        UpdateTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Installs `entries` as the new snapshot if `ticket` is newer than the
    /// installed one. Returns `false` when the update was superseded.
    pub fn commit(&self, ticket: UpdateTicket, entries: Vec<RateEntry>) -> bool {
        let mut rates = HashMap::with_capacity(entries.len());
        for entry in entries {
            if entry.is_usable() {
                rates.insert(entry.pair(), entry);
            } else {
                debug!(from = %entry.from, to = %entry.to, rate = entry.rate, "Dropping unusable rate entry");
            }
        }

        let mut guard = self.snapshot.write();
        if ticket.0 <= guard.generation {
            debug!(
                ticket = ticket.0,
                installed = guard.generation,
                "Discarding superseded rate snapshot"
            );
            return false;
        }
        *guard = Arc::new(Snapshot {
            generation: ticket.0,
            rates,
        });
        true
    }

    /// Replaces the whole snapshot unconditionally.
    pub fn update_rates(&self, entries: Vec<RateEntry>) {
        let ticket = self.begin_update();
        self.commit(ticket, entries);
    }

    /// Resolves `from -> to`, returning `0.0` when no path exists.
    ///
    /// Resolution order, first match wins:
    /// 1. identical currencies: `1.0`
    /// 2. direct entry
    /// 3. inverse entry: `1 / rate`
    /// 4. triangulation through USD when neither side is USD
    pub fn get_rate(&self, from: Currency, to: Currency) -> f64 {
        if from == to {
            return 1.0;
        }

        let snapshot = self.current();
        let lookup = |from: Currency, to: Currency| {
            snapshot
                .rates
                .get(&CurrencyPair::new(from, to))
                .map(|e| e.rate)
        };

        if let Some(rate) = lookup(from, to) {
            return rate;
        }

        if let Some(inverse) = lookup(to, from) {
            if inverse > 0.0 {
                return 1.0 / inverse;
            }
        }

        if from != Currency::USD && to != Currency::USD {
            if let (Some(usd_from), Some(usd_to)) = (
                lookup(Currency::USD, from),
                lookup(Currency::USD, to),
            ) {
                if usd_from > 0.0 {
                    return usd_to / usd_from;
                }
            }
        }

        0.0
    }

    /// The rate of the `from -> to` entry itself, without inversion or
    /// triangulation.
    pub fn direct_rate(&self, from: Currency, to: Currency) -> Option<f64> {
        self.current()
            .rates
            .get(&CurrencyPair::new(from, to))
            .map(|e| e.rate)
    }

    /// The entries of the installed snapshot, ordered by pair for stable output.
    pub fn entries(&self) -> Vec<RateEntry> {
        let snapshot = self.current();
        let mut entries: Vec<RateEntry> = snapshot.rates.values().cloned().collect();
        entries.sort_by_key(|e| (e.from, e.to));
        entries
    }

    pub fn len(&self) -> usize {
        self.current().rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn current(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }
}

impl RateCalculator for RateStore {
    fn update_rates(&self, entries: Vec<RateEntry>) {
        RateStore::update_rates(self, entries)
    }

    fn get_rate(&self, from: Currency, to: Currency) -> f64 {
        RateStore::get_rate(self, from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(from: Currency, to: Currency, rate: f64) -> RateEntry {
        RateEntry::new(from, to, rate, Utc::now())
    }

    #[test]
    fn test_same_currency_is_one() {
        let store = RateStore::new();
        for &c in Currency::all() {
            assert_eq!(store.get_rate(c, c), 1.0);
        }
    }

    #[test]
    fn test_direct_lookup() {
        let store = RateStore::with_rates(vec![entry(Currency::USD, Currency::EUR, 0.92)]);
        assert_eq!(store.get_rate(Currency::USD, Currency::EUR), 0.92);
    }

    #[test]
    fn test_inverse_lookup() {
        let store = RateStore::with_rates(vec![entry(Currency::USD, Currency::RUB, 80.0)]);
        assert_eq!(store.get_rate(Currency::RUB, Currency::USD), 1.0 / 80.0);
    }

    #[test]
    fn test_direct_wins_over_inverse() {
        let store = RateStore::with_rates(vec![
            entry(Currency::EUR, Currency::GBP, 0.85),
            entry(Currency::GBP, Currency::EUR, 1.2),
        ]);
        assert_eq!(store.get_rate(Currency::GBP, Currency::EUR), 1.2);
    }

    #[test]
    fn test_triangulation_through_usd() {
        let store = RateStore::with_rates(vec![
            entry(Currency::USD, Currency::EUR, 2.0),
            entry(Currency::USD, Currency::GBP, 5.0),
        ]);
        assert_eq!(store.get_rate(Currency::EUR, Currency::GBP), 2.5);
    }

    #[test]
    fn test_no_triangulation_with_non_usd_base() {
        let store = RateStore::with_rates(vec![
            entry(Currency::EUR, Currency::GBP, 0.85),
            entry(Currency::EUR, Currency::CHF, 0.95),
        ]);
        assert_eq!(store.get_rate(Currency::GBP, Currency::CHF), 0.0);
    }

    #[test]
    fn test_unknown_pair_is_zero() {
        let store = RateStore::new();
        assert_eq!(store.get_rate(Currency::USD, Currency::EUR), 0.0);
        assert_eq!(store.direct_rate(Currency::USD, Currency::EUR), None);
    }

    #[test]
    fn test_unusable_entries_are_dropped() {
        let store = RateStore::with_rates(vec![
            entry(Currency::USD, Currency::EUR, 0.0),
            entry(Currency::USD, Currency::USD, 3.0),
            entry(Currency::USD, Currency::GBP, 0.79),
        ]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_rate(Currency::EUR, Currency::USD), 0.0);
    }

    #[test]
    fn test_update_replaces_snapshot() {
        let store = RateStore::with_rates(vec![entry(Currency::USD, Currency::EUR, 0.92)]);
        store.update_rates(vec![entry(Currency::USD, Currency::GBP, 0.79)]);

        assert_eq!(store.get_rate(Currency::USD, Currency::EUR), 0.0);
        assert_eq!(store.get_rate(Currency::USD, Currency::GBP), 0.79);
    }

    #[test]
    fn test_superseded_commit_is_rejected() {
        let store = RateStore::new();
        let older = store.begin_update();
        let newer = store.begin_update();

        assert!(store.commit(newer, vec![entry(Currency::USD, Currency::EUR, 0.90)]));
        assert!(!store.commit(older, vec![entry(Currency::USD, Currency::EUR, 0.80)]));
        assert_eq!(store.get_rate(Currency::USD, Currency::EUR), 0.90);
    }

    #[test]
    fn test_direct_rate_ignores_derived_paths() {
        let store = RateStore::with_rates(vec![
            entry(Currency::USD, Currency::EUR, 0.92),
            entry(Currency::USD, Currency::GBP, 0.79),
        ]);
        assert_eq!(store.direct_rate(Currency::USD, Currency::EUR), Some(0.92));
        assert_eq!(store.direct_rate(Currency::EUR, Currency::USD), None);
        assert_eq!(store.direct_rate(Currency::EUR, Currency::GBP), None);
        assert!(store.get_rate(Currency::EUR, Currency::GBP) > 0.0);
    }

    #[test]
    fn test_entries_roundtrip_through_calculator() {
        let store = RateStore::with_rates(vec![
            entry(Currency::USD, Currency::GBP, 0.79),
            entry(Currency::USD, Currency::EUR, 0.92),
        ]);
        let copy = RateStore::new();
        RateCalculator::update_rates(&copy, store.entries());

        assert_eq!(copy.entries(), store.entries());
        assert_eq!(copy.entries()[0].to, Currency::EUR);
    }
}
