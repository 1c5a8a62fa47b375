//! Data Transfer Objects for the rate API and the service boundary.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exchange_rates::{Currency, CurrencyPair, RateEntry};

// ─────────────────────────────────────────────────────────────────────────────
// Rate API DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Body of the remote "latest rates" endpoint: `{"data": {"EUR": 0.92, ...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestRatesResponse {
    pub data: HashMap<String, f64>,
}

impl LatestRatesResponse {
    /// Converts the response into entries from `base`, dropping unknown codes.
    pub fn into_entries(self, base: Currency, timestamp: DateTime<Utc>) -> Vec<RateEntry> {
        let mut entries: Vec<RateEntry> = self
            .data
            .into_iter()
            .filter_map(|(code, rate)| {
                let target = code.parse::<Currency>().ok()?;
                Some(RateEntry::new(base, target, rate, timestamp))
            })
            .collect();
        entries.sort_by_key(|e| e.to);
        entries
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a refresh request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshOutcome {
    /// The cached snapshot is recent enough; nothing was fetched
    Fresh,
    /// Another fetch is already outstanding; this request was coalesced
    InFlight,
    /// A new snapshot was installed
    Updated { entries: usize },
    /// The fetch finished after a newer snapshot was installed and was dropped
    Superseded,
    /// The fetch failed; the previous snapshot stays in use
    Failed { message: String },
}

/// One observed rate for the selected pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateHistoryPoint {
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate figures over the whole conversion history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total: usize,
    /// Records saved since the start of the current calendar month
    pub this_month: usize,
    /// Distinct `"FROM-TO"` pairs across all records
    pub distinct_pairs: usize,
}

/// Snapshot of the live converter, as a presentation layer would render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterState {
    pub pair: CurrencyPair,
    /// Source amount exactly as entered
    pub amount: String,
    /// Converted amount with two decimals, or `"0.00"`
    pub result: String,
    /// Rate used for `result`; `0.0` when unavailable
    pub rate: f64,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    /// Oldest first
    pub rate_history: Vec<RateHistoryPoint>,
}
