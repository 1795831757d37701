/*
[INPUT]:  Bearer tokens issued by the marketplace API
[OUTPUT]: Token retrieval and expiration status
[POS]:    Auth layer - token lifecycle management
[UPDATE]: When adding token refresh or changing storage strategy
*/

use std::sync::{Arc, PoisonError, RwLock};

use base64::{
    Engine as _,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use chrono::{DateTime, Utc};

/// Stored token data with metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    pub token: String,
    /// From the token's `exp` claim, when it has one
    pub expires_at: Option<DateTime<Utc>>,
}

/// Thread-safe JWT token manager
#[derive(Debug, Clone, Default)]
pub struct JwtManager {
    data: Arc<RwLock<Option<TokenData>>>,
}

impl JwtManager {
    /// Create a new empty JWT manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new token, reading its expiration from the payload
    pub fn set_token(&self, token: String) {
        let expires_at = decode_expiry(&token);
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(TokenData { token, expires_at });
    }

    /// Get the current token if available
    pub fn get_token(&self) -> Option<String> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|data| data.token.clone())
    }

    /// Check if token is expired. Tokens without `exp` never expire locally;
    /// the server remains the authority.
    pub fn is_expired(&self) -> bool {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(TokenData {
                expires_at: Some(at),
                ..
            }) => Utc::now() > *at,
            Some(_) => false,
            None => true,
        }
    }

    /// Get token data if available
    pub fn token_data(&self) -> Option<TokenData> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Clear the stored token
    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

/// Read the `exp` claim of a JWT without verifying it
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload_b64 = token.trim().split('.').nth(1)?;
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .or_else(|_| URL_SAFE.decode(payload_b64))
        .ok()?;
    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).ok()?;
    let exp = payload.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_jwt(payload: serde_json::Value) -> String {
        let header = serde_json::json!({"alg": "HS256", "typ": "JWT"});
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap());
        let payload_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
        format!("{header_b64}.{payload_b64}.signature")
    }

    #[test]
    fn test_new_manager_is_empty() {
        let manager = JwtManager::new();
        assert!(manager.get_token().is_none());
        assert!(manager.is_expired());
    }

    #[test]
    fn test_set_and_get_token() {
        let exp = Utc::now().timestamp() + 3600;
        let token = make_test_jwt(serde_json::json!({"id": "u1", "exp": exp}));
        let manager = JwtManager::new();
        manager.set_token(token.clone());

        assert_eq!(manager.get_token(), Some(token));
        assert!(!manager.is_expired());
        assert_eq!(
            manager.token_data().and_then(|d| d.expires_at).map(|d| d.timestamp()),
            Some(exp)
        );
    }

    #[test]
    fn test_past_exp_is_expired() {
        let token = make_test_jwt(serde_json::json!({"exp": 1_000}));
        let manager = JwtManager::new();
        manager.set_token(token);
        assert!(manager.is_expired());
    }

    #[test]
    fn test_opaque_token_has_no_expiry() {
        let manager = JwtManager::new();
        manager.set_token("opaque-token".to_string());
        assert!(manager.token_data().unwrap().expires_at.is_none());
        assert!(!manager.is_expired());
    }

    #[test]
    fn test_clear_token() {
        let manager = JwtManager::new();
        manager.set_token("test_token".to_string());

        manager.clear();
        assert!(manager.get_token().is_none());
        assert!(manager.is_expired());
    }
}
