//! # Converter
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the storage gateway and the rate API client
//! - Create the converter service
//! - Run one command, or the refresh scheduler for `watch`

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use converter_hex::{ConverterService, HttpRateFetcher, RefreshScheduler, ServiceConfig};
use converter_repo::{Store, build_store};
use converter_types::{
    AppTheme, ConversionRecord, Currency, CurrencyPair, FavoriteId, HistoryQuery, Preferences,
    RecordId, SortOrder,
};

type Service = ConverterService<HttpRateFetcher, Store>;

#[derive(Parser)]
#[command(name = "converter")]
#[command(author, version, about = "Currency converter with offline rate cache", long_about = None)]
struct Cli {
    /// Storage URL (memory://, sqlite://path)
    #[arg(long, env = "CONVERTER_STORE_URL")]
    store_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an amount with the cached rates, refreshing them if stale
    Convert {
        /// Amount in the source currency
        amount: String,
        /// Source currency (defaults to the last selected pair)
        #[arg(long)]
        from: Option<Currency>,
        /// Target currency (defaults to the last selected pair)
        #[arg(long)]
        to: Option<Currency>,
        /// Save the conversion to history
        #[arg(long)]
        save: bool,
    },
    /// Rate snapshot operations
    Rates {
        #[command(subcommand)]
        action: RatesCommands,
    },
    /// Conversion history operations
    History {
        #[command(subcommand)]
        action: HistoryCommands,
    },
    /// Favorite pair operations
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommands,
    },
    /// Preference operations
    Prefs {
        #[command(subcommand)]
        action: PrefsCommands,
    },
    /// Keep rates fresh until Ctrl-C
    Watch {
        /// Seconds between staleness checks (defaults to REFRESH_INTERVAL_SECS,
        /// then the stored auto-refresh preference)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[derive(Subcommand)]
enum RatesCommands {
    /// Print the cached snapshot
    Show,
    /// Fetch new rates for the selected base currency
    Refresh {
        /// Fetch even if the snapshot is fresh
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List saved conversions
    List {
        /// Match against currency codes and names
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        from: Option<Currency>,
        #[arg(long)]
        to: Option<Currency>,
        /// Earliest timestamp (RFC 3339)
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Latest timestamp (RFC 3339)
        #[arg(long)]
        until: Option<DateTime<Utc>>,
        /// Minimum source amount
        #[arg(long)]
        min: Option<f64>,
        /// Maximum source amount
        #[arg(long)]
        max: Option<f64>,
        /// date-newest, date-oldest, amount-highest, amount-lowest, currency-pair
        #[arg(long, default_value = "date-newest")]
        sort: SortOrder,
        /// One formatted line per record instead of JSON
        #[arg(long)]
        table: bool,
    },
    /// Print totals
    Stats,
    /// Delete a record
    Delete { id: RecordId },
    /// Toggle the favorite mark of a record
    Favorite { id: RecordId },
    /// Replace the tags and note of a record
    Annotate {
        id: RecordId,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Delete every record
    Clear,
}

#[derive(Subcommand)]
enum FavoritesCommands {
    /// List bookmarked pairs
    List,
    /// Bookmark a pair
    Add { from: Currency, to: Currency },
    /// Remove a bookmark
    Remove { id: FavoriteId },
    /// Make a bookmarked pair the selected one
    Select { id: FavoriteId },
}

#[derive(Subcommand)]
enum PrefsCommands {
    /// Print preferences
    Show,
    /// Change preferences
    Set {
        #[arg(long)]
        theme: Option<AppTheme>,
        /// Seconds between scheduled refresh checks
        #[arg(long)]
        refresh_interval: Option<u64>,
        #[arg(long)]
        haptics: Option<bool>,
        #[arg(long)]
        show_rate_changes: Option<bool>,
        #[arg(long)]
        default_from: Option<Currency>,
        #[arg(long)]
        default_to: Option<Currency>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = config::Config::from_env()?;
    if let Some(url) = cli.store_url {
        config.store_url = url;
    }
    config.log_format.init();

    debug!(store = %config.store_url, api = %config.rates_api_url, "Configuration loaded");

    // Build storage (handles connection and migration)
    let store = build_store(&config.store_url).await?;

    let mut fetcher = HttpRateFetcher::new(&config.rates_api_url);
    match &config.rates_api_key {
        Some(key) => fetcher = fetcher.with_api_key(key),
        None => warn!("RATES_API_KEY is not set; the rate API may reject requests"),
    }

    let service = Arc::new(
        ConverterService::new(
            fetcher,
            Arc::new(store),
            ServiceConfig {
                stale_after: config.stale_after,
            },
        )
        .await,
    );

    match cli.command {
        Commands::Convert {
            amount,
            from,
            to,
            save,
        } => {
            let current = service.state().pair;
            let pair = CurrencyPair::new(from.unwrap_or(current.from), to.unwrap_or(current.to));
            if pair != current {
                service.select_pair(pair).await;
            } else {
                service.refresh_if_needed().await;
            }

            service.set_amount(amount);
            if save {
                let record = service.save_conversion().await?;
                print_json(&record)?;
            } else {
                print_json(&service.state())?;
            }
        }

        Commands::Rates { action } => match action {
            RatesCommands::Show => {
                let state = service.state();
                print_json(&json!({
                    "last_update": state.last_update,
                    "entries": service.rates(),
                }))?;
            }
            RatesCommands::Refresh { force } => {
                let outcome = service.refresh(force).await;
                print_json(&outcome)?;
            }
        },

        Commands::History { action } => match action {
            HistoryCommands::List {
                search,
                from,
                to,
                since,
                until,
                min,
                max,
                sort,
                table,
            } => {
                let now = Utc::now();
                let mut query = HistoryQuery::new(now).sorted_by(sort);
                if let Some(text) = search {
                    query = query.with_search(text);
                }
                if let Some(c) = from {
                    query = query.with_from_currency(c);
                }
                if let Some(c) = to {
                    query = query.with_to_currency(c);
                }
                if since.is_some() || until.is_some() {
                    query = query.with_date_range(
                        since.unwrap_or(DateTime::<Utc>::MIN_UTC),
                        until.unwrap_or(now),
                    );
                }
                if min.is_some() || max.is_some() {
                    query = query.with_amount_range(min.unwrap_or(0.0), max.unwrap_or(f64::MAX));
                }
                let records = service.history(&query).await;
                if table {
                    for record in &records {
                        println!("{}", history_line(record, now));
                    }
                } else {
                    print_json(&records)?;
                }
            }
            HistoryCommands::Stats => {
                print_json(&service.history_stats().await)?;
            }
            HistoryCommands::Delete { id } => {
                service.delete_record(id).await?;
                println!("✓ Record deleted");
            }
            HistoryCommands::Favorite { id } => {
                let marked = service.toggle_record_favorite(id).await?;
                println!("{}", if marked { "★ Marked as favorite" } else { "☆ Unmarked" });
            }
            HistoryCommands::Annotate { id, tags, note } => {
                let record = service.annotate_record(id, tags, note).await?;
                print_json(&record)?;
            }
            HistoryCommands::Clear => {
                service.clear_history().await;
                println!("✓ History cleared");
            }
        },

        Commands::Favorites { action } => match action {
            FavoritesCommands::List => {
                print_json(&service.favorites().await)?;
            }
            FavoritesCommands::Add { from, to } => {
                match service.add_favorite(CurrencyPair::new(from, to)).await? {
                    Some(favorite) => print_json(&favorite)?,
                    None => println!("{}/{} is already a favorite", from, to),
                }
            }
            FavoritesCommands::Remove { id } => {
                service.remove_favorite(id).await?;
                println!("✓ Favorite removed");
            }
            FavoritesCommands::Select { id } => {
                service.select_favorite(id).await?;
                print_json(&service.state())?;
            }
        },

        Commands::Prefs { action } => match action {
            PrefsCommands::Show => {
                print_json(&service.preferences())?;
            }
            PrefsCommands::Set {
                theme,
                refresh_interval,
                haptics,
                show_rate_changes,
                default_from,
                default_to,
            } => {
                let mut prefs = service.preferences();
                if let Some(theme) = theme {
                    prefs.theme = theme;
                }
                if let Some(secs) = refresh_interval {
                    prefs.auto_refresh_interval_secs = secs;
                }
                if let Some(enabled) = haptics {
                    prefs.haptics_enabled = enabled;
                }
                if let Some(enabled) = show_rate_changes {
                    prefs.show_rate_changes = enabled;
                }
                if let Some(c) = default_from {
                    prefs.default_pair.from = c;
                }
                if let Some(c) = default_to {
                    prefs.default_pair.to = c;
                }
                service.update_preferences(prefs).await?;
                print_json(&service.preferences())?;
            }
        },

        Commands::Watch { interval } => {
            let interval = watch_interval(
                interval,
                config.refresh_interval,
                &service.preferences(),
            );
            watch(service.clone(), interval).await;
        }
    }

    if let Some(message) = service.state().last_error {
        eprintln!("warning: {}", message);
    }

    Ok(())
}

/// Refreshes once, then lets the scheduler keep rates fresh until Ctrl-C.
async fn watch(service: Arc<Service>, interval: Duration) {
    let outcome = service.refresh_if_needed().await;
    println!("{}: {:?}", service.state().pair, outcome);

    let scheduler = RefreshScheduler::new(service, interval);
    scheduler
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
}

/// Flag, then environment, then the stored preference.
fn watch_interval(flag: Option<u64>, env: Option<Duration>, prefs: &Preferences) -> Duration {
    flag.map(Duration::from_secs)
        .or(env)
        .unwrap_or_else(|| prefs.auto_refresh_interval())
}

/// `"today  ★ USD/EUR  1,500.00 → 1,380.50 @ 0.920333"`
fn history_line(record: &ConversionRecord, now: DateTime<Utc>) -> String {
    let when = if record.is_today(now) {
        "today".to_string()
    } else if record.is_this_week(now) {
        "this week".to_string()
    } else {
        record.timestamp.format("%Y-%m-%d").to_string()
    };
    let mark = if record.is_favorite { "★" } else { " " };
    format!(
        "{:<10} {} {}  {} → {} @ {}  {}",
        when,
        mark,
        record.display_pair(),
        record.formatted_from_amount(),
        record.formatted_to_amount(),
        record.formatted_rate(),
        record.id,
    )
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_watch_interval_precedence() {
        let prefs = Preferences {
            auto_refresh_interval_secs: 600,
            ..Preferences::default()
        };
        let env = Some(Duration::from_secs(60));

        assert_eq!(watch_interval(Some(5), env, &prefs), Duration::from_secs(5));
        assert_eq!(watch_interval(None, env, &prefs), Duration::from_secs(60));
        assert_eq!(watch_interval(None, None, &prefs), Duration::from_secs(600));
    }

    #[test]
    fn test_history_line_formats_amounts() {
        let pair = CurrencyPair::new(Currency::USD, Currency::EUR);
        let mut record = ConversionRecord::new(pair, 1500.0, 1380.5, now()).unwrap();
        record.is_favorite = true;

        let line = history_line(&record, now());

        assert!(line.starts_with("today"));
        assert!(line.contains("★ USD/EUR  1,500.00 → 1,380.50 @ 0.920333"));
    }

    #[test]
    fn test_history_line_labels_older_records() {
        let pair = CurrencyPair::new(Currency::USD, Currency::EUR);
        // 2024-03-14 is a Thursday
        let monday = now() - TimeDelta::days(3);
        let record = ConversionRecord::new(pair, 1.0, 0.9, monday).unwrap();
        assert!(history_line(&record, now()).starts_with("this week"));

        let older = ConversionRecord::new(pair, 1.0, 0.9, now() - TimeDelta::days(30)).unwrap();
        assert!(history_line(&older, now()).starts_with("2024-02-13"));
    }
}
