//! # Converter Hex
//!
//! Application service layer and outbound adapters for the currency converter.
//!
//! ## Architecture
//!
//! - `service/` - Application service (orchestrates rates, history and favorites)
//! - `scheduler/` - Periodic refresh driver
//! - `outbound/` - HTTP adapter for the remote rate API
//!
//! The service is generic over `F: RateFetcher`, `S: KeyValueStore` and
//! `C: Clock`, allowing different adapters to be injected.

pub mod outbound;
pub mod scheduler;
pub mod service;


pub use outbound::HttpRateFetcher;
pub use scheduler::RefreshScheduler;
pub use service::{ConverterService, RATE_HISTORY_LIMIT, ServiceConfig};
