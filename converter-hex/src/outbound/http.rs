//! HTTP client for the "latest rates" API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, instrument};

use converter_types::{Currency, FetchError, LatestRatesResponse, RateEntry, RateFetcher};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// [`RateFetcher`] backed by `GET {url}?apikey=..&base_currency=..&currencies=A,B`.
pub struct HttpRateFetcher {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

impl HttpRateFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            http: Client::new(),
        }
    }

    /// Sets the API key sent as the `apikey` query parameter.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RateFetcher for HttpRateFetcher {
    #[instrument(skip(self, targets), fields(base = %base, targets = targets.len()))]
    async fn fetch_rates(
        &self,
        base: Currency,
        targets: &[Currency],
    ) -> Result<Vec<RateEntry>, FetchError> {
        let url = Url::parse(&self.base_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let currencies = targets
            .iter()
            .map(|c| c.code())
            .collect::<Vec<_>>()
            .join(",");

        let mut request = self
            .http
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[("base_currency", base.code()), ("currencies", currencies.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("apikey", key.as_str())]);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let parsed: LatestRatesResponse =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decoding(e.to_string()))?;

        let entries = parsed.into_entries(base, Utc::now());
        debug!(count = entries.len(), "Fetched rates");
        Ok(entries)
    }
}
