//! Staleness policy for cached rate snapshots.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default age after which a snapshot must be refreshed.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

/// Decides from the last successful update whether rates must be refetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    stale_after: Duration,
}

impl StalenessPolicy {
    pub fn new(stale_after: Duration) -> Self {
        Self { stale_after }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// True when there is no recorded update or it is older than the threshold.
    ///
    /// A timestamp in the future counts as fresh.
    pub fn should_update(&self, last_update: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(last_update) = last_update else {
            return true;
        };
        match (now - last_update).to_std() {
            Ok(elapsed) => elapsed > self.stale_after,
            Err(_) => false,
        }
    }

    /// Like [`should_update`](Self::should_update), but `force` always wins.
    pub fn should_refresh(
        &self,
        last_update: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        force: bool,
    ) -> bool {
        force || self.should_update(last_update, now)
    }
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_AFTER)
    }
}
