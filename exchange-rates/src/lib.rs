//! Exchange Rates Library with Macro-Based Currency Generation
//!
//! This library owns everything the converter knows about currencies and rates:
//! - the closed set of supported currencies, generated by `define_currencies!`
//! - ordered currency pairs and fetched rate entries
//! - the rate snapshot store that resolves direct, inverse and USD-triangulated rates
//! - the staleness policy that decides when a snapshot must be refreshed
//!
//! # Adding a New Currency
//! Add a line to the `define_currencies!` macro invocation:
//! ```ignore
//! define_currencies! {
//!     // ... existing currencies ...
//!     JPY => ("JPY", "Japanese Yen", "¥", "🇯🇵"),
//! }
//! ```
//!
//! # Example
//! ```
//! use chrono::Utc;
//! use exchange_rates::{Currency, RateCalculator, RateEntry, RateStore};
//!
//! let store = RateStore::new();
//! store.update_rates(vec![
//!     RateEntry::new(Currency::USD, Currency::EUR, 0.92, Utc::now()),
//!     RateEntry::new(Currency::USD, Currency::GBP, 0.79, Utc::now()),
//! ]);
//!
//! assert_eq!(store.get_rate(Currency::EUR, Currency::EUR), 1.0);
//! assert!(store.get_rate(Currency::EUR, Currency::GBP) > 0.0);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod staleness;
mod store;

pub use staleness::{DEFAULT_STALE_AFTER, StalenessPolicy};
pub use store::{RateCalculator, RateStore, UpdateTicket};

/// Error returned when a currency code is not part of the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown currency: {0}")]
pub struct UnknownCurrency(pub String);

// ─────────────────────────────────────────────────────────────────────────────
// THE MACRO: Defines the Currency enum and its metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Macro to define the supported currencies with their display metadata.
///
/// # Syntax
/// ```ignore
/// define_currencies! {
///     Variant => ("CODE", "Display name", "SYMBOL", "FLAG"),
/// }
/// ```
#[macro_export]
macro_rules! define_currencies {
    (
        $(
            $name:ident => ($code:literal, $display:literal, $symbol:literal, $flag:literal)
        ),* $(,)?
    ) => {
        /// A currency from the closed set supported by the converter.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum Currency {
            $($name),*
        }

        impl Currency {
            /// ISO 4217 code.
            pub fn code(&self) -> &'static str {
                match self {
                    $(Currency::$name => $code),*
                }
            }

            /// Human-readable name.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Currency::$name => $display),*
                }
            }

            pub fn symbol(&self) -> &'static str {
                match self {
                    $(Currency::$name => $symbol),*
                }
            }

            pub fn flag(&self) -> &'static str {
                match self {
                    $(Currency::$name => $flag),*
                }
            }

            /// Every supported currency, in declaration order.
            pub fn all() -> &'static [Currency] {
                &[$(Currency::$name),*]
            }
        }

        impl std::fmt::Display for Currency {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.code())
            }
        }

        impl std::str::FromStr for Currency {
            type Err = $crate::UnknownCurrency;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_uppercase().as_str() {
                    $($code => Ok(Currency::$name),)*
                    _ => Err($crate::UnknownCurrency(s.to_string())),
                }
            }
        }
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// CURRENCY DEFINITIONS - Add new currencies here!
// ─────────────────────────────────────────────────────────────────────────────

define_currencies! {
    RUB => ("RUB", "Russian Ruble", "₽", "🇷🇺"),
    USD => ("USD", "US Dollar", "$", "🇺🇸"),
    EUR => ("EUR", "Euro", "€", "🇪🇺"),
    GBP => ("GBP", "British Pound", "£", "🇬🇧"),
    CHF => ("CHF", "Swiss Franc", "CHF", "🇨🇭"),
    CNY => ("CNY", "Chinese Yuan", "¥", "🇨🇳"),
}

impl Currency {
    /// Every supported currency except `self`.
    pub fn others(&self) -> Vec<Currency> {
        Currency::all()
            .iter()
            .copied()
            .filter(|c| c != self)
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Currency Pair
// ─────────────────────────────────────────────────────────────────────────────

/// An ordered `(from, to)` pair. `(A, B)` and `(B, A)` are different pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub from: Currency,
    pub to: Currency,
}

impl CurrencyPair {
    pub fn new(from: Currency, to: Currency) -> Self {
        Self { from, to }
    }

    /// The same pair in the opposite direction.
    pub fn swapped(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }

    /// `"FROM/TO"`, as shown to users.
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.from.code(), self.to.code())
    }

    /// `"FROM-TO"`, used for sorting and distinct-pair statistics.
    pub fn key(&self) -> String {
        format!("{}-{}", self.from.code(), self.to.code())
    }

    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }
}

impl Default for CurrencyPair {
    fn default() -> Self {
        Self::new(Currency::USD, Currency::RUB)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate Entry
// ─────────────────────────────────────────────────────────────────────────────

/// One fetched rate: how many units of `to` one unit of `from` buys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub from: Currency,
    pub to: Currency,
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
}

impl RateEntry {
    pub fn new(from: Currency, to: Currency, rate: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            rate,
            timestamp,
        }
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.from, self.to)
    }

    /// Whether the rate store may hold this entry.
    pub fn is_usable(&self) -> bool {
        self.from != self.to && self.rate.is_finite() && self.rate > 0.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
