//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_STORE_URL: &str = "sqlite://converter.db";
const DEFAULT_RATES_API_URL: &str = "https://api.freecurrencyapi.com/v1/latest";
const DEFAULT_STALE_AFTER_SECS: u64 = 300;
const DEFAULT_LOG_FILTER: &str = "info,converter_hex=debug,converter_repo=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

impl LogFormat {
    /// Installs the global subscriber. Logs go to stderr; stdout carries
    /// command output.
    pub fn init(self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
        let registry = tracing_subscriber::registry().with(filter);

        match self {
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init(),
            LogFormat::Pretty => registry
                .with(fmt::layer().with_writer(std::io::stderr))
                .init(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_url: String,
    pub rates_api_url: String,
    pub rates_api_key: Option<String>,
    /// Scheduler period; unset defers to the stored preference
    pub refresh_interval: Option<Duration>,
    pub stale_after: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<L>(lookup: L) -> anyhow::Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secs = |key: &str| -> anyhow::Result<Option<Duration>> {
            let Some(raw) = non_empty(key) else {
                return Ok(None);
            };
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| anyhow::anyhow!("{} must be a whole number of seconds: {}", key, e))?;
            if secs == 0 {
                anyhow::bail!("{} must be positive", key);
            }
            Ok(Some(Duration::from_secs(secs)))
        };

        let log_format = match non_empty("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            store_url: non_empty("CONVERTER_STORE_URL").unwrap_or_else(|| DEFAULT_STORE_URL.into()),
            rates_api_url: non_empty("RATES_API_URL")
                .unwrap_or_else(|| DEFAULT_RATES_API_URL.into()),
            rates_api_key: non_empty("RATES_API_KEY"),
            refresh_interval: secs("REFRESH_INTERVAL_SECS")?,
            stale_after: secs("STALE_AFTER_SECS")?
                .unwrap_or(Duration::from_secs(DEFAULT_STALE_AFTER_SECS)),
            log_format,
        })
    }
}
