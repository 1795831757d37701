/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for motomarket-adapter tests

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Unsigned JWT carrying only an `exp` claim
pub fn mock_jwt_token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"id":"u1","exp":{exp}}}"#));
    format!("{header}.{claims}.signature")
}

pub fn user_json(id: &str, phone_verified: bool) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "name": "Ana Souza",
        "email": "ana@example.com",
        "phone": "+5511999990000",
        "role": "seller",
        "verifications": {"emailVerified": true, "phoneVerified": phone_verified},
        "favorites": [],
    })
}

pub fn listing_json(id: &str) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "title": "Honda CB 500F",
        "brand": "Honda",
        "model": "CB 500F",
        "year": 2021,
        "mileage": 12000,
        "price": "32900.00",
        "location": {"city": "Campinas", "state": "SP"},
        "images": [{"url": "https://cdn.example.com/cb500.jpg", "public_id": "cb500"}],
        "seller": {"_id": "u1", "name": "Ana Souza"},
        "status": "active",
    })
}

/// Serve `/auth/me` for requests carrying `token`
#[allow(dead_code)]
pub async fn mount_me(server: &MockServer, token: &str, user: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"success": true, "data": user})),
        )
        .mount(server)
        .await;
}
