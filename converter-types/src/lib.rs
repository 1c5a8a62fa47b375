//! # Converter Types
//!
//! Domain types, the conversion engine and port traits for the currency
//! converter. This crate has ZERO external IO dependencies - only data
//! structures, business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (ConversionRecord, FavoriteConversion, HistoryQuery)
//!   and the conversion engine
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for the rate API and service boundaries
//! - `error/` - Domain, repository and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    AmountValidator, AppTheme, Conversion, ConversionEngine, ConversionRecord,
    DefaultAmountValidator, FavoriteConversion, FavoriteId, HistoryQuery, NEUTRAL_AMOUNT,
    Preferences, RangeFilter, RecordId, SortOrder,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use exchange_rates::{Currency, CurrencyPair, RateEntry};
pub use ports::{Clock, FetchError, KeyValueStore, RateFetcher, SystemClock};
