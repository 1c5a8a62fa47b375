//! Conversion engine and amount validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::ConversionRecord;
use crate::error::DomainError;
use exchange_rates::{Currency, CurrencyPair, RateCalculator};

/// Result text shown when there is nothing to convert.
pub const NEUTRAL_AMOUNT: &str = "0.00";

/// Parsing and validation rules for user-entered amounts.
pub trait AmountValidator: Send + Sync {
    /// Parses `text` as a decimal number. Surrounding whitespace is ignored.
    fn parse_amount(&self, text: &str) -> Option<f64>;

    /// A non-empty, non-neutral amount that parses.
    fn is_valid_amount(&self, text: &str) -> bool {
        let text = text.trim();
        !text.is_empty() && text != NEUTRAL_AMOUNT && self.parse_amount(text).is_some()
    }

    /// Whether the current source/result pair may be saved.
    fn is_valid_conversion(&self, from_amount: &str, to_amount: &str, is_loading: bool) -> bool {
        let to_amount = to_amount.trim();
        !to_amount.is_empty()
            && to_amount != NEUTRAL_AMOUNT
            && !is_loading
            && self.is_valid_amount(from_amount)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAmountValidator;

impl AmountValidator for DefaultAmountValidator {
    fn parse_amount(&self, text: &str) -> Option<f64> {
        text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// Output of a live conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    /// Converted amount, two decimals
    pub amount: String,
    /// Rate used; `0.0` means no rate was available
    pub rate: f64,
}

impl Conversion {
    /// The zero/zero state used for absent or invalid input.
    pub fn neutral() -> Self {
        Self {
            amount: NEUTRAL_AMOUNT.to_string(),
            rate: 0.0,
        }
    }

    /// False when the rate store had no path for the pair.
    pub fn is_available(&self) -> bool {
        self.rate > 0.0
    }
}

/// Turns amount text plus a rate source into converted amounts and records.
#[derive(Debug, Default, Clone)]
pub struct ConversionEngine<V: AmountValidator = DefaultAmountValidator> {
    validator: V,
}

impl ConversionEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V: AmountValidator> ConversionEngine<V> {
    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Converts `amount_text` from `from` to `to`.
    ///
    /// Never fails: unparsable or non-positive input, or a product too large
    /// to represent, yields [`Conversion::neutral`].
    pub fn convert<R>(&self, amount_text: &str, from: Currency, to: Currency, rates: &R) -> Conversion
    where
        R: RateCalculator + ?Sized,
    {
        let Some(amount) = self
            .validator
            .parse_amount(amount_text)
            .filter(|a| *a > 0.0)
        else {
            return Conversion::neutral();
        };

        let rate = rates.get_rate(from, to);
        let converted = amount * rate;
        if !converted.is_finite() {
            return Conversion::neutral();
        }
        Conversion {
            amount: format!("{:.2}", converted),
            rate,
        }
    }

    /// Builds the record to persist for the current conversion.
    ///
    /// Fails with [`DomainError::RefreshInProgress`] while rates are being
    /// fetched and with [`DomainError::InvalidAmount`] unless both amounts
    /// parse to positive values.
    pub fn build_record(
        &self,
        pair: CurrencyPair,
        from_text: &str,
        to_text: &str,
        refreshing: bool,
        timestamp: DateTime<Utc>,
    ) -> Result<ConversionRecord, DomainError> {
        if refreshing {
            return Err(DomainError::RefreshInProgress);
        }
        if !self.validator.is_valid_conversion(from_text, to_text, refreshing) {
            return Err(DomainError::InvalidAmount);
        }

        let (Some(from_amount), Some(to_amount)) = (
            self.validator.parse_amount(from_text),
            self.validator.parse_amount(to_text),
        ) else {
            return Err(DomainError::InvalidAmount);
        };

        ConversionRecord::new(pair, from_amount, to_amount, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange_rates::{RateEntry, RateStore};

    fn store_with(from: Currency, to: Currency, rate: f64) -> RateStore {
        RateStore::with_rates(vec![RateEntry::new(from, to, rate, Utc::now())])
    }

    #[test]
    fn test_convert_formats_two_decimals() {
        let engine = ConversionEngine::new();
        let rates = store_with(Currency::USD, Currency::EUR, 1.2);

        let result = engine.convert("100", Currency::USD, Currency::EUR, &rates);

        assert_eq!(result.amount, "120.00");
        assert_eq!(result.rate, 1.2);
        assert!(result.is_available());
    }

    #[test]
    fn test_convert_rounds() {
        let engine = ConversionEngine::new();
        let rates = store_with(Currency::USD, Currency::RUB, 92.4567);

        let result = engine.convert("3", Currency::USD, Currency::RUB, &rates);

        assert_eq!(result.amount, "277.37");
    }

    #[test]
    fn test_invalid_input_is_neutral() {
        let engine = ConversionEngine::new();
        let rates = store_with(Currency::USD, Currency::EUR, 1.2);

        for input in ["", "abc", "0", "-5", "NaN", "inf"] {
            let result = engine.convert(input, Currency::USD, Currency::EUR, &rates);
            assert_eq!(result, Conversion::neutral(), "input {input:?}");
        }
    }

    #[test]
    fn test_overflowing_product_is_neutral() {
        let engine = ConversionEngine::new();
        let rates = store_with(Currency::USD, Currency::RUB, 80.0);

        let result = engine.convert("1e308", Currency::USD, Currency::RUB, &rates);

        assert_eq!(result, Conversion::neutral());
        assert!(!result.is_available());
    }

    #[test]
    fn test_missing_rate_is_unavailable() {
        let engine = ConversionEngine::new();
        let rates = RateStore::new();

        let result = engine.convert("10", Currency::USD, Currency::EUR, &rates);

        assert_eq!(result.amount, "0.00");
        assert!(!result.is_available());
    }

    #[test]
    fn test_validator_rules() {
        let v = DefaultAmountValidator;
        assert!(v.is_valid_amount("12.5"));
        assert!(!v.is_valid_amount(""));
        assert!(!v.is_valid_amount("0.00"));
        assert!(!v.is_valid_amount("abc"));

        assert!(v.is_valid_conversion("10", "9.20", false));
        assert!(!v.is_valid_conversion("10", "9.20", true));
        assert!(!v.is_valid_conversion("10", "0.00", false));
        assert!(!v.is_valid_conversion("", "9.20", false));
    }

    #[test]
    fn test_build_record() {
        let engine = ConversionEngine::new();
        let pair = CurrencyPair::new(Currency::USD, Currency::EUR);

        let record = engine
            .build_record(pair, "100", "92.00", false, Utc::now())
            .unwrap();

        assert_eq!(record.from_amount, 100.0);
        assert_eq!(record.to_amount, 92.0);
        assert_eq!(record.pair(), pair);
    }

    #[test]
    fn test_build_record_rejects_invalid_amounts() {
        let engine = ConversionEngine::new();
        let pair = CurrencyPair::new(Currency::USD, Currency::EUR);
        let now = Utc::now();

        for (from, to) in [("abc", "1"), ("1", "0.00"), ("-1", "1"), ("", "")] {
            let result = engine.build_record(pair, from, to, false, now);
            assert!(matches!(result, Err(DomainError::InvalidAmount)), "{from:?} {to:?}");
        }
    }

    #[test]
    fn test_build_record_rejected_while_refreshing() {
        let engine = ConversionEngine::new();
        let pair = CurrencyPair::new(Currency::USD, Currency::EUR);

        let result = engine.build_record(pair, "100", "92.00", true, Utc::now());

        assert!(matches!(result, Err(DomainError::RefreshInProgress)));
    }
}
