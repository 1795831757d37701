/*
[INPUT]:  Error sources (HTTP, API, serialization, session, token storage)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the marketplace adapter
#[derive(Error, Debug)]
pub enum MarketError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response; `message` is the server's own text
    #[error("API error (status {status}): {}", describe_api(.status, .message))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// API answered 2xx but flagged the call as unsuccessful
    #[error("Request rejected: {message}")]
    Rejected { message: String },

    /// Operation needs a signed-in user
    #[error("Not signed in")]
    NotSignedIn,

    /// Bearer token missing or refused by the server
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Token storage could not be read or written
    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimit {
        retry_after: u64,
        message: Option<String>,
    },
}

impl MarketError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            MarketError::Http(err) => err.is_timeout() || err.is_connect(),
            MarketError::RateLimit { .. } | MarketError::InvalidResponse(_) => true,
            MarketError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Get retry delay in seconds (if retryable)
    pub fn retry_delay(&self) -> Option<u64> {
        match self {
            MarketError::RateLimit { retry_after, .. } => Some(*retry_after),
            MarketError::Http(err) if err.is_timeout() => Some(1),
            _ => None,
        }
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        match self {
            MarketError::Authentication { .. } | MarketError::NotSignedIn => true,
            MarketError::Api { status, .. } => *status == StatusCode::UNAUTHORIZED.as_u16(),
            _ => false,
        }
    }

    /// Message to show the user: the server's own wording when it sent one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            MarketError::Api {
                message: Some(message),
                ..
            }
            | MarketError::RateLimit {
                message: Some(message),
                ..
            }
            | MarketError::Rejected { message }
            | MarketError::Authentication { message } => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Create an API error from status code and optional server message
    pub fn api_error(status: StatusCode, message: Option<String>) -> Self {
        MarketError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

fn describe_api(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => StatusCode::from_u16(*status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown error")
            .to_string(),
    }
}

/// Result type alias for marketplace operations
pub type Result<T> = std::result::Result<T, MarketError>;
