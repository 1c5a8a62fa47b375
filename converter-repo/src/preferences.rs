//! User preferences store.

use std::sync::Arc;

use tracing::warn;

use converter_types::{KeyValueStore, Preferences, RepoError};

use crate::codec::{read_json, write_json};
use crate::keys;

pub struct PreferencesStore<S: KeyValueStore> {
    kv: Arc<S>,
}

impl<S: KeyValueStore> PreferencesStore<S> {
    pub fn new(kv: Arc<S>) -> Self {
        Self { kv }
    }

    /// Stored preferences, or defaults when missing or unreadable.
    pub async fn load(&self) -> Preferences {
        match read_json(&*self.kv, keys::PREFERENCES).await {
            Ok(prefs) => prefs.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable preferences");
                Preferences::default()
            }
        }
    }

    /// Validates, then persists.
    pub async fn save(&self, prefs: &Preferences) -> Result<(), RepoError> {
        prefs.validate()?;
        write_json(&*self.kv, keys::PREFERENCES, prefs).await
    }
}
