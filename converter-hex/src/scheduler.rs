//! Periodic refresh driver.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

use converter_types::{Clock, KeyValueStore, RateFetcher, RefreshOutcome};

use crate::ConverterService;

/// Lower bound on the tick period.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Calls [`ConverterService::refresh_if_needed`] on a fixed period.
pub struct RefreshScheduler<F: RateFetcher, S: KeyValueStore, C: Clock> {
    service: Arc<ConverterService<F, S, C>>,
    interval: Duration,
}

impl<F: RateFetcher, S: KeyValueStore, C: Clock> RefreshScheduler<F, S, C> {
    pub fn new(service: Arc<ConverterService<F, S, C>>, interval: Duration) -> Self {
        Self {
            service,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs until `shutdown` resolves. The first check happens one period
    /// after start, not immediately.
    #[instrument(skip_all)]
    pub async fn run_until<Fut>(self, shutdown: Fut)
    where
        Fut: Future<Output = ()>,
    {
        info!(interval_secs = self.interval.as_secs(), "Starting refresh scheduler");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Refresh scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match self.service.refresh_if_needed().await {
                        RefreshOutcome::Fresh => debug!("Scheduled check: rates fresh"),
                        outcome => info!(?outcome, "Scheduled refresh"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use converter_repo::MemoryStore;

    use super::*;
    use crate::ServiceConfig;
    use crate::service_tests::tests::{FixedClock, MockFetcher, t0};

    async fn scheduler_with(fetcher: MockFetcher) -> RefreshScheduler<MockFetcher, MemoryStore, FixedClock> {
        let service = ConverterService::start(
            fetcher,
            Arc::new(MemoryStore::new()),
            FixedClock::at(t0()),
            ServiceConfig::default(),
        )
        .await;
        RefreshScheduler::new(Arc::new(service), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_skipped() {
        let scheduler = scheduler_with(MockFetcher::failing()).await;
        let service = scheduler.service.clone();

        scheduler.run_until(async {}).await;

        assert_eq!(service.fetcher().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_shutdown() {
        // A failing source never records an update, so every tick fetches.
        let scheduler = scheduler_with(MockFetcher::failing()).await;
        let service = scheduler.service.clone();

        scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(2500)))
            .await;

        assert_eq!(service.fetcher().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_snapshot_is_not_refetched() {
        let scheduler = scheduler_with(MockFetcher::usd_quotes()).await;
        let service = scheduler.service.clone();

        scheduler
            .run_until(tokio::time::sleep(Duration::from_millis(3500)))
            .await;

        // The fixed clock never advances, so only the first tick finds it stale.
        assert_eq!(service.fetcher().calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_interval_is_clamped() {
        let scheduler = scheduler_with(MockFetcher::failing()).await;
        let zero = RefreshScheduler::new(scheduler.service.clone(), Duration::ZERO);
        assert_eq!(zero.interval(), MIN_INTERVAL);
    }
}
