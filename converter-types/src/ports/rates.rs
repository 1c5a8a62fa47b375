//! Exchange rate fetcher port.
//!
//! This trait defines the interface for remote rate sources.
//! Implementations can be HTTP clients, mock providers, etc.

use exchange_rates::{Currency, RateEntry};

/// Error type for rate fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error occurred: {0}")]
    Network(String),

    #[error("Rate service responded with status {0}")]
    Status(u16),

    #[error("Failed to decode response: {0}")]
    Decoding(String),
}

/// Port trait for remote exchange rate sources.
#[async_trait::async_trait]
pub trait RateFetcher: Send + Sync + 'static {
    /// Fetches rates from `base` to each of `targets`.
    ///
    /// Every returned entry has `from == base`. Currencies the source reports
    /// but the converter does not support are dropped, not errored.
    async fn fetch_rates(
        &self,
        base: Currency,
        targets: &[Currency],
    ) -> Result<Vec<RateEntry>, FetchError>;
}
