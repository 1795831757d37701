/*
[INPUT]:  HTTP configuration (base URL, timeouts) and bearer token
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::JwtManager;
use crate::http::{MarketError, Result};
use crate::types::{ApiEnvelope, ErrorBody};

/// Base URL for the marketplace API
pub const DEFAULT_BASE_URL: &str = "https://moto-backend1.onrender.com";

const API_PREFIX: &str = "api/v1/";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Main HTTP client for the marketplace API.
///
/// Clones share the bearer token, so installing a token once authorizes
/// every holder of the client.
#[derive(Debug, Clone)]
pub struct MarketClient {
    http_client: Client,
    base_url: Url,
    jwt: JwtManager,
}

impl MarketClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: normalize_base_url(&config.base_url)?,
            jwt: JwtManager::new(),
        })
    }

    /// Create a client pointed at another server (tests, staging)
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::with_config(ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the token manager shared by all clones
    pub fn jwt_manager(&self) -> &JwtManager {
        &self.jwt
    }

    /// Install a bearer token for subsequent requests
    pub fn set_token(&self, token: impl Into<String>) {
        self.jwt.set_token(token.into());
    }

    /// Drop the bearer token
    pub fn clear_token(&self) {
        self.jwt.clear();
    }

    /// Build full URL for an API endpoint (relative to `/api/v1/`)
    pub(crate) fn api_url(&self, endpoint: &str) -> Result<Url> {
        let endpoint = endpoint.trim_start_matches('/');
        Ok(self.base_url.join(API_PREFIX)?.join(endpoint)?)
    }

    /// Build request builder for an API endpoint, carrying the bearer token when set
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.api_url(endpoint)?;
        let builder = self.http_client.request(method, url);
        Ok(match self.jwt.get_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Send a request and decode the JSON body, mapping error statuses
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| {
            debug!(error = %err, body = %truncate(&body, 512), "undecodable response body");
            MarketError::Serialization(err)
        })
    }

    /// Send a request and decode the standard envelope, rejecting `success: false`
    pub(crate) async fn send_envelope<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<ApiEnvelope<T>> {
        let envelope: ApiEnvelope<T> = self.send_json(builder).await?;
        if !envelope.success {
            return Err(MarketError::Rejected {
                message: envelope
                    .error
                    .unwrap_or_else(|| "Request was not successful".to_string()),
            });
        }
        Ok(envelope)
    }

    /// Send a request and return the envelope's `data`
    pub(crate) async fn send_data<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        self.send_envelope(builder)
            .await?
            .data
            .ok_or_else(|| MarketError::InvalidResponse("response is missing 'data'".to_string()))
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = (status == StatusCode::TOO_MANY_REQUESTS).then(|| {
        response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(1)
    });

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message);

    if let Some(retry_after) = retry_after {
        warn!(%url, retry_after, ?message, "rate limited by marketplace API");
        return Err(MarketError::RateLimit {
            retry_after,
            message,
        });
    }

    debug!(%url, status = status.as_u16(), ?message, "API call failed");
    Err(MarketError::api_error(status, message))
}

fn normalize_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(MarketError::Config("base URL is empty".to_string()));
    }
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Ok(Url::parse(&with_slash)?)
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_joins_under_prefix() {
        let client = MarketClient::with_base_url("http://localhost:5000").unwrap();
        let url = client.api_url("/listings/abc/sold").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/v1/listings/abc/sold");
    }

    #[test]
    fn test_api_url_keeps_base_path() {
        let client = MarketClient::with_base_url("https://example.com/moto/").unwrap();
        let url = client.api_url("auth/me").unwrap();
        assert_eq!(url.as_str(), "https://example.com/moto/api/v1/auth/me");
    }

    #[test]
    fn test_empty_base_url_is_config_error() {
        let err = MarketClient::with_base_url("  ").unwrap_err();
        assert!(matches!(err, MarketError::Config(_)));
    }

    #[test]
    fn test_clones_share_token() {
        let client = MarketClient::new().unwrap();
        let clone = client.clone();
        client.set_token("abc");
        assert_eq!(clone.jwt_manager().get_token(), Some("abc".to_string()));
        clone.clear_token();
        assert!(client.jwt_manager().get_token().is_none());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("ação", 2), "aç");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
