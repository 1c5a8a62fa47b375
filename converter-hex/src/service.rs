//! Converter Application Service
//!
//! Orchestrates the rate snapshot, the conversion engine and the history,
//! favorites and preferences stores. Contains NO infrastructure logic: the
//! rate source, the storage gateway and the clock are injected.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument, warn};

use converter_repo::{FavoritesStore, HistoryStore, PreferencesStore, RateCache};
use converter_types::{
    AmountValidator, AppError, Clock, Conversion, ConversionEngine, ConversionRecord,
    ConverterState, CurrencyPair, FavoriteConversion, FavoriteId, HistoryQuery, HistoryStats,
    KeyValueStore, Preferences, RateEntry, RateFetcher, RateHistoryPoint, RecordId,
    RefreshOutcome, SystemClock,
};
use exchange_rates::{DEFAULT_STALE_AFTER, RateStore, StalenessPolicy};

/// Number of rate observations kept for the selected pair.
pub const RATE_HISTORY_LIMIT: usize = 100;

/// Tunables for [`ConverterService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Age after which the cached snapshot is refetched
    pub stale_after: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

/// Live converter fields. `is_loading` is derived from the in-flight flag.
struct LiveState {
    pair: CurrencyPair,
    amount: String,
    conversion: Conversion,
    last_error: Option<String>,
    last_update: Option<chrono::DateTime<chrono::Utc>>,
    rate_history: Vec<RateHistoryPoint>,
}

/// Clears the in-flight flag when the refresh finishes or is cancelled.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Application service for the currency converter.
///
/// Generic over the rate source, the storage gateway and the clock, so each
/// can be swapped for an in-memory stand-in in tests.
pub struct ConverterService<F: RateFetcher, S: KeyValueStore, C: Clock = SystemClock> {
    fetcher: F,
    clock: C,
    policy: StalenessPolicy,
    engine: ConversionEngine,
    rates: RateStore,
    cache: RateCache<S>,
    preferences_store: PreferencesStore<S>,
    history: AsyncMutex<HistoryStore<S>>,
    favorites: AsyncMutex<FavoritesStore<S>>,
    preferences: RwLock<Preferences>,
    state: Mutex<LiveState>,
    refreshing: AtomicBool,
}

impl<F: RateFetcher, S: KeyValueStore> ConverterService<F, S, SystemClock> {
    /// Starts a service on wall-clock time.
    pub async fn new(fetcher: F, kv: Arc<S>, config: ServiceConfig) -> Self {
        Self::start(fetcher, kv, SystemClock, config).await
    }
}

impl<F: RateFetcher, S: KeyValueStore, C: Clock> ConverterService<F, S, C> {
    /// Hydrates every store from `kv` and performs the initial conversion.
    ///
    /// Never fails: unreadable cached data falls back to empty state. A
    /// favorites load failure is reported through `last_error`.
    #[instrument(skip_all)]
    pub async fn start(fetcher: F, kv: Arc<S>, clock: C, config: ServiceConfig) -> Self {
        let cache = RateCache::new(kv.clone());
        let preferences_store = PreferencesStore::new(kv.clone());

        let preferences = preferences_store.load().await;
        let rates = RateStore::with_rates(cache.load_rates().await);
        let last_update = cache.last_update_time().await;
        let pair = cache
            .load_pair()
            .await
            .unwrap_or(preferences.default_pair);
        let history = HistoryStore::load(kv.clone()).await;

        let mut last_error = None;
        let favorites = match FavoritesStore::load(kv.clone()).await {
            Ok(favorites) => favorites,
            Err(e) => {
                warn!(error = %e, "Failed to load favorites, starting with none");
                last_error = Some(format!("Failed to load favorites: {}", e));
                FavoritesStore::empty(kv)
            }
        };

        info!(
            pair = %pair,
            cached_rates = rates.len(),
            history = history.len(),
            favorites = favorites.list().len(),
            "Converter started"
        );

        Self {
            fetcher,
            clock,
            policy: StalenessPolicy::new(config.stale_after),
            engine: ConversionEngine::new(),
            rates,
            cache,
            preferences_store,
            history: AsyncMutex::new(history),
            favorites: AsyncMutex::new(favorites),
            preferences: RwLock::new(preferences),
            state: Mutex::new(LiveState {
                pair,
                amount: String::new(),
                conversion: Conversion::neutral(),
                last_error,
                last_update,
                rate_history: Vec::new(),
            }),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Returns a reference to the injected rate source.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Returns a reference to the injected clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Live Conversion
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> ConverterState {
        let state = self.state.lock();
        ConverterState {
            pair: state.pair,
            amount: state.amount.clone(),
            result: state.conversion.amount.clone(),
            rate: state.conversion.rate,
            is_loading: self.is_refreshing(),
            last_error: state.last_error.clone(),
            last_update: state.last_update,
            rate_history: state.rate_history.clone(),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Sets the source amount text and reconverts.
    pub fn set_amount(&self, text: impl Into<String>) -> Conversion {
        let mut state = self.state.lock();
        state.amount = text.into();
        self.reconvert(&mut state)
    }

    /// Reconverts the current amount against the installed snapshot.
    pub fn convert(&self) -> Conversion {
        let mut state = self.state.lock();
        self.reconvert(&mut state)
    }

    /// Selects `pair`, persists it and refreshes when the snapshot is stale.
    pub async fn select_pair(&self, pair: CurrencyPair) -> RefreshOutcome {
        {
            let mut state = self.state.lock();
            state.pair = pair;
            self.reconvert(&mut state);
        }
        self.persist_pair(pair).await;
        self.refresh_if_needed().await
    }

    /// Reverses the pair. A valid result becomes the new source amount.
    pub async fn swap(&self) -> RefreshOutcome {
        let pair = {
            let mut state = self.state.lock();
            state.pair = state.pair.swapped();
            if self
                .engine
                .validator()
                .is_valid_amount(&state.conversion.amount)
            {
                state.amount = state.conversion.amount.clone();
            }
            self.reconvert(&mut state);
            state.pair
        };
        debug!(pair = %pair, "Pair swapped");
        self.persist_pair(pair).await;
        self.refresh_if_needed().await
    }

    /// Entries of the installed snapshot.
    pub fn rates(&self) -> Vec<RateEntry> {
        self.rates.entries()
    }

    fn reconvert(&self, state: &mut LiveState) -> Conversion {
        let conversion =
            self.engine
                .convert(&state.amount, state.pair.from, state.pair.to, &self.rates);
        state.conversion = conversion.clone();
        conversion
    }

    async fn persist_pair(&self, pair: CurrencyPair) {
        if let Err(e) = self.cache.save_pair(pair).await {
            warn!(error = %e, pair = %pair, "Failed to persist selected pair");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Rate Refresh
    // ─────────────────────────────────────────────────────────────────────────────

    /// Refreshes only when the snapshot is stale or missing.
    pub async fn refresh_if_needed(&self) -> RefreshOutcome {
        self.refresh(false).await
    }

    /// Fetches a new snapshot for the selected base currency.
    ///
    /// At most one fetch is outstanding; a request arriving meanwhile returns
    /// [`RefreshOutcome::InFlight`]. A failed fetch keeps the previous
    /// snapshot and records the message as the last error.
    #[instrument(skip(self))]
    pub async fn refresh(&self, force: bool) -> RefreshOutcome {
        let last_update = self.state.lock().last_update;
        if !self.policy.should_refresh(last_update, self.clock.now(), force) {
            debug!("Rates are fresh");
            return RefreshOutcome::Fresh;
        }

        let Some(_guard) = InFlightGuard::acquire(&self.refreshing) else {
            debug!("Refresh already in flight");
            return RefreshOutcome::InFlight;
        };

        let ticket = self.rates.begin_update();
        let base = self.state.lock().pair.from;
        let targets = base.others();

        let outcome = match self.fetcher.fetch_rates(base, &targets).await {
            Ok(entries) => {
                if self.rates.commit(ticket, entries) {
                    let now = self.clock.now();
                    let snapshot = self.rates.entries();
                    if let Err(e) = self.cache.save_rates(&snapshot, now).await {
                        warn!(error = %e, "Failed to persist rate snapshot");
                    }
                    self.record_update(now);
                    info!(base = %base, entries = snapshot.len(), "Rates updated");
                    RefreshOutcome::Updated {
                        entries: snapshot.len(),
                    }
                } else {
                    debug!(ticket = ticket.value(), "Fetched snapshot superseded");
                    RefreshOutcome::Superseded
                }
            }
            Err(e) => {
                warn!(error = %e, base = %base, "Rate refresh failed, keeping cached rates");
                let message = e.to_string();
                self.state.lock().last_error = Some(message.clone());
                RefreshOutcome::Failed { message }
            }
        };

        self.convert();
        outcome
    }

    /// Stamps the update and appends a rate point when the snapshot quotes
    /// the selected pair directly.
    fn record_update(&self, now: chrono::DateTime<chrono::Utc>) {
        let mut state = self.state.lock();
        state.last_update = Some(now);
        state.last_error = None;

        if let Some(rate) = self.rates.direct_rate(state.pair.from, state.pair.to) {
            state.rate_history.push(RateHistoryPoint {
                rate,
                timestamp: now,
            });
            let excess = state.rate_history.len().saturating_sub(RATE_HISTORY_LIMIT);
            state.rate_history.drain(..excess);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Saving
    // ─────────────────────────────────────────────────────────────────────────────

    /// Saves the current conversion to history and bookmarks its pair.
    ///
    /// Rejected while a refresh is in flight or when either amount is invalid.
    /// A failure to bookmark is reported through `last_error`; the record is
    /// still returned.
    #[instrument(skip(self))]
    pub async fn save_conversion(&self) -> Result<ConversionRecord, AppError> {
        let (pair, amount, result) = {
            let state = self.state.lock();
            (state.pair, state.amount.clone(), state.conversion.amount.clone())
        };

        let record = self.engine.build_record(
            pair,
            &amount,
            &result,
            self.is_refreshing(),
            self.clock.now(),
        )?;

        self.history.lock().await.add(record.clone()).await;

        let bookmarked = self.favorites.lock().await.add(pair).await;
        if let Err(e) = bookmarked {
            warn!(error = %e, pair = %pair, "Failed to bookmark saved pair");
            self.state.lock().last_error = Some(format!("Failed to save favorite: {}", e));
        }

        info!(id = %record.id, pair = %pair, "Conversion saved");
        Ok(record)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Favorites
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn favorites(&self) -> Vec<FavoriteConversion> {
        self.favorites.lock().await.list().to_vec()
    }

    /// Bookmarks `pair`. `Ok(None)` when it already is.
    pub async fn add_favorite(
        &self,
        pair: CurrencyPair,
    ) -> Result<Option<FavoriteConversion>, AppError> {
        self.favorites
            .lock()
            .await
            .add(pair)
            .await
            .map_err(Into::into)
    }

    pub async fn remove_favorite(&self, id: FavoriteId) -> Result<(), AppError> {
        let removed = self.favorites.lock().await.remove(id).await?;
        if !removed {
            return Err(AppError::NotFound(format!("Favorite {}", id)));
        }
        Ok(())
    }

    /// Makes a bookmarked pair the selected one.
    pub async fn select_favorite(&self, id: FavoriteId) -> Result<RefreshOutcome, AppError> {
        let pair = self
            .favorites
            .lock()
            .await
            .get(id)
            .map(|f| f.pair)
            .ok_or_else(|| AppError::NotFound(format!("Favorite {}", id)))?;
        Ok(self.select_pair(pair).await)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────────

    /// Filtered and ordered view of the history.
    pub async fn history(&self, query: &HistoryQuery) -> Vec<ConversionRecord> {
        self.history.lock().await.query(query)
    }

    pub async fn get_record(&self, id: RecordId) -> Result<ConversionRecord, AppError> {
        self.history
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Record {}", id)))
    }

    pub async fn delete_record(&self, id: RecordId) -> Result<(), AppError> {
        if !self.history.lock().await.delete(id).await {
            return Err(AppError::NotFound(format!("Record {}", id)));
        }
        Ok(())
    }

    /// Flips the favorite mark of a record, returning the new state.
    pub async fn toggle_record_favorite(&self, id: RecordId) -> Result<bool, AppError> {
        self.history
            .lock()
            .await
            .toggle_favorite(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Record {}", id)))
    }

    pub async fn annotate_record(
        &self,
        id: RecordId,
        tags: Vec<String>,
        note: Option<String>,
    ) -> Result<ConversionRecord, AppError> {
        let mut history = self.history.lock().await;
        if !history.annotate(id, tags, note).await {
            return Err(AppError::NotFound(format!("Record {}", id)));
        }
        history
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Record {}", id)))
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear().await;
        info!("History cleared");
    }

    pub async fn history_stats(&self) -> HistoryStats {
        self.history.lock().await.stats(self.clock.now())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Preferences & Errors
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn preferences(&self) -> Preferences {
        self.preferences.read().clone()
    }

    pub async fn update_preferences(&self, prefs: Preferences) -> Result<(), AppError> {
        self.preferences_store.save(&prefs).await?;
        *self.preferences.write() = prefs;
        Ok(())
    }

    pub fn clear_error(&self) {
        self.state.lock().last_error = None;
    }
}
