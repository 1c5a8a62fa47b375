//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod clock;
mod rates;
mod storage;

pub use clock::{Clock, SystemClock};
pub use rates::{FetchError, RateFetcher};
pub use storage::KeyValueStore;
