/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod auth;
pub mod client;
pub mod conversations;
pub mod error;
pub mod listings;
pub mod payments;
pub mod subscriptions;

pub use error::{MarketError, Result};

pub use client::{ClientConfig, DEFAULT_BASE_URL, MarketClient};
