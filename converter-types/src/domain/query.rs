//! History query state: search, filters and sort order.
//!
//! A query never mutates records; it derives an ordered view of them.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use super::record::ConversionRecord;
use crate::error::DomainError;
use exchange_rates::Currency;

/// Inclusive `[min, max]` bound that only applies when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter<T> {
    pub enabled: bool,
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> RangeFilter<T> {
    /// A disabled filter remembering the given bounds.
    pub fn disabled(min: T, max: T) -> Self {
        Self {
            enabled: false,
            min,
            max,
        }
    }

    pub fn enabled(min: T, max: T) -> Self {
        Self {
            enabled: true,
            min,
            max,
        }
    }

    pub fn admits(&self, value: T) -> bool {
        !self.enabled || (value >= self.min && value <= self.max)
    }
}

/// Ordering applied after filtering.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    DateNewest,
    DateOldest,
    AmountHighest,
    AmountLowest,
    /// Lexicographic by `"FROM-TO"`
    CurrencyPair,
}

impl SortOrder {
    pub fn all() -> &'static [SortOrder] {
        &[
            SortOrder::DateNewest,
            SortOrder::DateOldest,
            SortOrder::AmountHighest,
            SortOrder::AmountLowest,
            SortOrder::CurrencyPair,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            SortOrder::DateNewest => "date-newest",
            SortOrder::DateOldest => "date-oldest",
            SortOrder::AmountHighest => "amount-highest",
            SortOrder::AmountLowest => "amount-lowest",
            SortOrder::CurrencyPair => "currency-pair",
        }
    }

    /// Stable sort of `records` in place.
    pub fn sort(&self, records: &mut [ConversionRecord]) {
        match self {
            SortOrder::DateNewest => records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            SortOrder::DateOldest => records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            SortOrder::AmountHighest => {
                records.sort_by(|a, b| b.from_amount.total_cmp(&a.from_amount))
            }
            SortOrder::AmountLowest => {
                records.sort_by(|a, b| a.from_amount.total_cmp(&b.from_amount))
            }
            SortOrder::CurrencyPair => records.sort_by_cached_key(|r| r.pair_key()),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        SortOrder::all()
            .iter()
            .copied()
            .find(|o| o.id() == s)
            .ok_or_else(|| DomainError::ValidationError(format!("Unknown sort order: {}", s)))
    }
}

/// Transient filter and sort parameters for the history view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Matched case-insensitively against codes and names of both sides
    pub search: String,
    pub date_range: RangeFilter<DateTime<Utc>>,
    pub from_currency: Option<Currency>,
    pub to_currency: Option<Currency>,
    /// Applies to the source amount
    pub amount_range: RangeFilter<f64>,
    pub sort: SortOrder,
}

impl HistoryQuery {
    pub const DEFAULT_MIN_AMOUNT: f64 = 0.0;
    pub const DEFAULT_MAX_AMOUNT: f64 = 10_000.0;

    /// The default query relative to `now`: everything, newest first.
    ///
    /// The (disabled) date range is preset to the last month.
    pub fn new(now: DateTime<Utc>) -> Self {
        let month_ago = now.checked_sub_months(Months::new(1)).unwrap_or(now);
        Self {
            search: String::new(),
            date_range: RangeFilter::disabled(month_ago, now),
            from_currency: None,
            to_currency: None,
            amount_range: RangeFilter::disabled(Self::DEFAULT_MIN_AMOUNT, Self::DEFAULT_MAX_AMOUNT),
            sort: SortOrder::default(),
        }
    }

    /// Restores every parameter to its default.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self::new(now);
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    pub fn with_date_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.date_range = RangeFilter::enabled(start, end);
        self
    }

    pub fn with_from_currency(mut self, currency: Currency) -> Self {
        self.from_currency = Some(currency);
        self
    }

    pub fn with_to_currency(mut self, currency: Currency) -> Self {
        self.to_currency = Some(currency);
        self
    }

    pub fn with_amount_range(mut self, min: f64, max: f64) -> Self {
        self.amount_range = RangeFilter::enabled(min, max);
        self
    }

    pub fn sorted_by(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Whether `record` passes every enabled filter.
    pub fn matches(&self, record: &ConversionRecord) -> bool {
        let needle = self.search.trim();
        (needle.is_empty() || record.matches_text(needle))
            && self.date_range.admits(record.timestamp)
            && self.from_currency.is_none_or(|c| record.from_currency == c)
            && self.to_currency.is_none_or(|c| record.to_currency == c)
            && self.amount_range.admits(record.from_amount)
    }

    /// Filters then sorts `records`, returning the derived view.
    pub fn apply(&self, records: &[ConversionRecord]) -> Vec<ConversionRecord> {
        let mut view: Vec<ConversionRecord> =
            records.iter().filter(|r| self.matches(r)).cloned().collect();
        self.sort.sort(&mut view);
        view
    }
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}
