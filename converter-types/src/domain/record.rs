//! Conversion record domain model.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::format::format_grouped;
use crate::error::DomainError;
use exchange_rates::{Currency, CurrencyPair};

/// Unique identifier for a ConversionRecord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a new random RecordId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a RecordId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A saved conversion.
///
/// Records are immutable once created, except for the favorite flag and the
/// tags/note annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    /// Unique identifier
    pub id: RecordId,
    pub from_currency: Currency,
    pub to_currency: Currency,
    /// Source amount, always positive
    pub from_amount: f64,
    /// Converted amount, always positive
    pub to_amount: f64,
    /// Effective rate at creation: `to_amount / from_amount`
    pub rate: f64,
    /// When the conversion was saved
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ConversionRecord {
    /// Creates a new record.
    ///
    /// # Validation
    /// - Both amounts must be finite and greater than zero
    pub fn new(
        pair: CurrencyPair,
        from_amount: f64,
        to_amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(from_amount) || !positive(to_amount) {
            return Err(DomainError::InvalidAmount);
        }

        Ok(Self {
            id: RecordId::new(),
            from_currency: pair.from,
            to_currency: pair.to,
            from_amount,
            to_amount,
            rate: to_amount / from_amount,
            timestamp,
            is_favorite: false,
            tags: Vec::new(),
            note: None,
        })
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.from_currency, self.to_currency)
    }

    /// `"FROM/TO"`.
    pub fn display_pair(&self) -> String {
        self.pair().display_name()
    }

    /// `"FROM-TO"`, the key used for sorting and statistics.
    pub fn pair_key(&self) -> String {
        self.pair().key()
    }

    pub fn formatted_from_amount(&self) -> String {
        format_grouped(self.from_amount, 2, 2)
    }

    pub fn formatted_to_amount(&self) -> String {
        format_grouped(self.to_amount, 2, 2)
    }

    pub fn formatted_rate(&self) -> String {
        format_grouped(self.rate, 2, 6)
    }

    pub fn is_today(&self, now: DateTime<Utc>) -> bool {
        self.timestamp.date_naive() == now.date_naive()
    }

    /// Same ISO week (and week-based year) as `now`.
    pub fn is_this_week(&self, now: DateTime<Utc>) -> bool {
        self.timestamp.iso_week() == now.iso_week()
    }

    pub fn is_this_month(&self, now: DateTime<Utc>) -> bool {
        self.timestamp.year() == now.year() && self.timestamp.month() == now.month()
    }

    /// Case-insensitive match of `needle` against either side's code or name.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [self.from_currency, self.to_currency].iter().any(|c| {
            c.code().to_lowercase().contains(&needle) || c.name().to_lowercase().contains(&needle)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pair() -> CurrencyPair {
        CurrencyPair::new(Currency::USD, Currency::EUR)
    }

    #[test]
    fn test_record_creation() {
        let record = ConversionRecord::new(pair(), 100.0, 92.0, Utc::now()).unwrap();
        assert_eq!(record.from_currency, Currency::USD);
        assert_eq!(record.to_currency, Currency::EUR);
        assert_eq!(record.rate, 0.92);
        assert!(!record.is_favorite);
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_non_positive_amounts_fail() {
        let now = Utc::now();
        assert!(matches!(
            ConversionRecord::new(pair(), 0.0, 1.0, now),
            Err(DomainError::InvalidAmount)
        ));
        assert!(matches!(
            ConversionRecord::new(pair(), 1.0, -1.0, now),
            Err(DomainError::InvalidAmount)
        ));
        assert!(matches!(
            ConversionRecord::new(pair(), f64::INFINITY, 1.0, now),
            Err(DomainError::InvalidAmount)
        ));
    }

    #[test]
    fn test_pair_strings() {
        let record = ConversionRecord::new(pair(), 1.0, 0.92, Utc::now()).unwrap();
        assert_eq!(record.display_pair(), "USD/EUR");
        assert_eq!(record.pair_key(), "USD-EUR");
    }

    #[test]
    fn test_formatted_values() {
        let record = ConversionRecord::new(pair(), 1500.0, 1380.5, Utc::now()).unwrap();
        assert_eq!(record.formatted_from_amount(), "1,500.00");
        assert_eq!(record.formatted_to_amount(), "1,380.50");
        assert_eq!(record.formatted_rate(), "0.920333");
    }

    #[test]
    fn test_calendar_helpers() {
        let now = Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap();
        let mut record = ConversionRecord::new(pair(), 1.0, 1.0, now).unwrap();
        assert!(record.is_today(now));
        assert!(record.is_this_week(now));
        assert!(record.is_this_month(now));

        record.timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert!(!record.is_today(now));
        assert!(!record.is_this_week(now));
        assert!(record.is_this_month(now));

        record.timestamp = Utc.with_ymd_and_hms(2023, 3, 14, 12, 0, 0).unwrap();
        assert!(!record.is_this_month(now));
    }

    #[test]
    fn test_text_match() {
        let record = ConversionRecord::new(pair(), 1.0, 1.0, Utc::now()).unwrap();
        assert!(record.matches_text("usd"));
        assert!(record.matches_text("Dollar"));
        assert!(record.matches_text("euro"));
        assert!(!record.matches_text("yuan"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut record = ConversionRecord::new(pair(), 10.0, 9.2, Utc::now()).unwrap();
        record.tags = vec!["travel".into()];
        let json = serde_json::to_string(&record).unwrap();
        let back: ConversionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
