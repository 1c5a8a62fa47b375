//! Favorite currency pair bookmark.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use exchange_rates::CurrencyPair;

/// Unique identifier for a FavoriteConversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteId(Uuid);

impl FavoriteId {
    /// Creates a new random FavoriteId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a FavoriteId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for FavoriteId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FavoriteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FavoriteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A bookmarked currency pair. Identity is the id; uniqueness is by pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteConversion {
    pub id: FavoriteId,
    pub pair: CurrencyPair,
}

impl FavoriteConversion {
    pub fn new(pair: CurrencyPair) -> Self {
        Self {
            id: FavoriteId::new(),
            pair,
        }
    }

    pub fn display_name(&self) -> String {
        self.pair.display_name()
    }
}
