//! Storage keys. Each value is the JSON encoding of the named collection.

/// Latest rate snapshot as a list of `RateEntry`.
pub const EXCHANGE_RATES: &str = "exchangeRates";

/// Timestamp of the last successful rate refresh.
pub const LAST_UPDATE_TIME: &str = "lastUpdateTime";

/// Last selected currency pair.
pub const CURRENCY_PAIR: &str = "currencyPair";

/// Conversion history, newest first.
pub const CONVERSION_HISTORY: &str = "conversionHistory";

/// Ids of history records marked as favorite.
pub const FAVORITE_RECORD_IDS: &str = "favoriteRecordIds";

/// Bookmarked currency pairs.
pub const FAVORITE_CONVERSIONS: &str = "favoriteConversions";

/// User preferences.
pub const PREFERENCES: &str = "preferences";
