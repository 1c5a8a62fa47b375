//! Domain models for the converter.

pub mod conversion;
pub mod favorite;
pub mod format;
pub mod preferences;
pub mod query;
pub mod record;

pub use conversion::{
    AmountValidator, Conversion, ConversionEngine, DefaultAmountValidator, NEUTRAL_AMOUNT,
};
pub use favorite::{FavoriteConversion, FavoriteId};
pub use preferences::{AppTheme, Preferences};
pub use query::{HistoryQuery, RangeFilter, SortOrder};
pub use record::{ConversionRecord, RecordId};
