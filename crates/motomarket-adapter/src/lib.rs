/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public MotoMarket client crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod http;
pub mod store;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    Access,
    AuthSession,
    AuthState,
    FileTokenStorage,
    JwtManager,
    MemoryTokenStorage,
    TokenData,
    TokenStorage,
    check_access,
};

// Re-export commonly used types from http
pub use http::{
    ClientConfig,
    DEFAULT_BASE_URL,
    MarketClient,
    MarketError,
    Result,
};

// Re-export the stores
pub use store::{
    ListingLimit,
    ListingStore,
    Marketplace,
    MessageStore,
    OpStatus,
    PLANS,
    PaymentStore,
    Plan,
    SubscriptionStore,
};

// Re-export all types
pub use types::*;
