//! Outbound adapters.

mod http;

pub use http::HttpRateFetcher;
