/*
[INPUT]:  Credentials, verification codes and profile updates
[OUTPUT]: Bearer tokens and user profiles
[POS]:    HTTP layer - account endpoints under /api/v1/auth
[UPDATE]: When adding new auth endpoints or changing payloads
*/

use reqwest::Method;

use crate::http::{MarketClient, MarketError, Result};
use crate::types::{
    LoginRequest, RegisterRequest, UpdateDetailsRequest, UpdatePasswordRequest, User,
};

impl MarketClient {
    /// Create an account
    ///
    /// POST /api/v1/auth/register
    pub async fn register(&self, req: &RegisterRequest) -> Result<String> {
        let builder = self.request(Method::POST, "auth/register")?.json(req);
        self.send_token(builder).await
    }

    /// Exchange email and password for a token
    ///
    /// POST /api/v1/auth/login
    pub async fn login(&self, req: &LoginRequest) -> Result<String> {
        let builder = self.request(Method::POST, "auth/login")?.json(req);
        self.send_token(builder).await
    }

    /// Fetch the signed-in user
    ///
    /// GET /api/v1/auth/me
    pub async fn me(&self) -> Result<User> {
        let builder = self.request(Method::GET, "auth/me")?;
        self.send_data(builder).await
    }

    /// Invalidate the session server-side
    ///
    /// GET /api/v1/auth/logout
    pub async fn logout(&self) -> Result<()> {
        let builder = self.request(Method::GET, "auth/logout")?;
        self.send_envelope::<serde_json::Value>(builder).await?;
        Ok(())
    }

    /// Confirm an email address with the token sent by mail
    ///
    /// GET /api/v1/auth/verify-email/{token}
    pub async fn verify_email(&self, token: &str) -> Result<()> {
        let endpoint = format!("auth/verify-email/{token}");
        let builder = self.request(Method::GET, &endpoint)?;
        self.send_envelope::<serde_json::Value>(builder).await?;
        Ok(())
    }

    /// Confirm the phone number with the SMS code
    ///
    /// POST /api/v1/auth/verify-phone
    pub async fn verify_phone(&self, code: &str) -> Result<()> {
        let builder = self
            .request(Method::POST, "auth/verify-phone")?
            .json(&serde_json::json!({ "code": code }));
        self.send_envelope::<serde_json::Value>(builder).await?;
        Ok(())
    }

    /// Ask for a new SMS code
    ///
    /// GET /api/v1/auth/resend-phone-verification
    pub async fn resend_phone_verification(&self) -> Result<()> {
        let builder = self.request(Method::GET, "auth/resend-phone-verification")?;
        self.send_envelope::<serde_json::Value>(builder).await?;
        Ok(())
    }

    /// Start the password reset flow
    ///
    /// POST /api/v1/auth/forgot-password
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let builder = self
            .request(Method::POST, "auth/forgot-password")?
            .json(&serde_json::json!({ "email": email }));
        self.send_envelope::<serde_json::Value>(builder).await?;
        Ok(())
    }

    /// Set a new password using the reset token; returns a fresh session token
    ///
    /// PUT /api/v1/auth/reset-password/{token}
    pub async fn reset_password(&self, reset_token: &str, password: &str) -> Result<String> {
        let endpoint = format!("auth/reset-password/{reset_token}");
        let builder = self
            .request(Method::PUT, &endpoint)?
            .json(&serde_json::json!({ "password": password }));
        self.send_token(builder).await
    }

    /// Update name, email or phone
    ///
    /// PUT /api/v1/auth/update-details
    pub async fn update_details(&self, req: &UpdateDetailsRequest) -> Result<User> {
        let builder = self.request(Method::PUT, "auth/update-details")?.json(req);
        self.send_data(builder).await
    }

    /// Change the password of the signed-in user
    ///
    /// PUT /api/v1/auth/update-password
    pub async fn update_password(&self, req: &UpdatePasswordRequest) -> Result<()> {
        let builder = self.request(Method::PUT, "auth/update-password")?.json(req);
        self.send_envelope::<serde_json::Value>(builder).await?;
        Ok(())
    }

    async fn send_token(&self, builder: reqwest::RequestBuilder) -> Result<String> {
        self.send_envelope::<serde_json::Value>(builder)
            .await?
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| MarketError::InvalidResponse("response is missing 'token'".to_string()))
    }
}
