/*
[INPUT]:  Marketplace client, token storage and account actions
[OUTPUT]: Signed-in user, loading flag and last error message
[POS]:    Auth layer - orchestrates login, restore and account flows
[UPDATE]: When auth endpoints or flow steps change
*/

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{info, warn};

use crate::auth::{Access, TokenStorage, check_access};
use crate::http::{MarketClient, MarketError, Result};
use crate::store::{HasStatus, OpStatus, read_lock, track, write_lock};
use crate::types::{
    LoginRequest, RegisterRequest, UpdateDetailsRequest, UpdatePasswordRequest, User,
};

const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

/// Longest wait before the single retry of the session check
const MAX_RETRY_DELAY_SECS: u64 = 5;

/// Snapshot of the session
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub current_user: Option<User>,
    pub status: OpStatus,
}

impl Default for AuthState {
    /// Loading until the persisted session has been checked
    fn default() -> Self {
        Self {
            current_user: None,
            status: OpStatus {
                loading: true,
                error: None,
            },
        }
    }
}

impl HasStatus for AuthState {
    fn status_mut(&mut self) -> &mut OpStatus {
        &mut self.status
    }
}

/// Authentication session shared by every store.
///
/// Clones observe the same state.
#[derive(Debug, Clone)]
pub struct AuthSession {
    client: MarketClient,
    storage: Arc<dyn TokenStorage>,
    state: Arc<RwLock<AuthState>>,
}

impl AuthSession {
    pub fn new(client: MarketClient, storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            client,
            storage,
            state: Arc::new(RwLock::new(AuthState::default())),
        }
    }

    pub fn client(&self) -> &MarketClient {
        &self.client
    }

    pub fn state(&self) -> AuthState {
        read_lock(&self.state).clone()
    }

    pub fn current_user(&self) -> Option<User> {
        read_lock(&self.state).current_user.clone()
    }

    pub fn is_loading(&self) -> bool {
        read_lock(&self.state).status.loading
    }

    pub fn error(&self) -> Option<String> {
        read_lock(&self.state).status.error.clone()
    }

    /// Decide whether a protected page may be shown
    pub fn access(&self, path: &str) -> Access {
        let guard = read_lock(&self.state);
        check_access(guard.status.loading, guard.current_user.as_ref(), path)
    }

    /// Pick up a session persisted by an earlier run.
    ///
    /// Returns the user when the stored token is still accepted.
    pub async fn restore(&self) -> Option<User> {
        let token = match self.storage.load() {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "failed to read stored token");
                None
            }
        };

        let Some(token) = token else {
            write_lock(&self.state).status.finish(None);
            return None;
        };

        self.client.set_token(token);
        if self.client.jwt_manager().is_expired() {
            info!("stored token is past its expiry");
            self.expire_session();
            return None;
        }

        let checked = match self.client.me().await {
            Err(err) if err.is_retryable() => {
                let delay = err.retry_delay().unwrap_or(1).min(MAX_RETRY_DELAY_SECS);
                warn!(error = %err, delay, "session check failed, retrying once");
                tokio::time::sleep(Duration::from_secs(delay)).await;
                self.client.me().await
            }
            other => other,
        };

        match checked {
            Ok(user) => {
                let expires_at = self
                    .client
                    .jwt_manager()
                    .token_data()
                    .and_then(|data| data.expires_at);
                info!(user_id = %user.id, ?expires_at, "session restored");
                let mut guard = write_lock(&self.state);
                guard.current_user = Some(user.clone());
                guard.status.finish(None);
                Some(user)
            }
            Err(err) => {
                warn!(error = %err, "stored session rejected");
                self.expire_session();
                None
            }
        }
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<User> {
        track(&self.state, "Registration failed. Please try again.", async {
            let token = self.client.register(req).await?;
            self.sign_in_with(token).await
        })
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        track(&self.state, "Invalid credentials. Please try again.", async {
            let token = self.client.login(&req).await?;
            self.sign_in_with(token).await
        })
        .await
    }

    /// Sign out locally no matter what the server answers
    pub async fn logout(&self) {
        if let Err(err) = self.client.logout().await {
            warn!(error = %err, "logout request failed");
        }
        self.forget_token();
        write_lock(&self.state).current_user = None;
        info!("signed out");
    }

    pub async fn verify_email(&self, token: &str) -> Result<User> {
        track(&self.state, "Email verification failed. Please try again.", async {
            self.client.verify_email(token).await?;
            self.refresh_user().await
        })
        .await
    }

    pub async fn verify_phone(&self, code: &str) -> Result<User> {
        track(&self.state, "Invalid code. Please try again.", async {
            self.client.verify_phone(code).await?;
            self.refresh_user().await
        })
        .await
    }

    pub async fn resend_phone_verification(&self) -> Result<()> {
        track(
            &self.state,
            "Could not resend the code. Please try again.",
            self.client.resend_phone_verification(),
        )
        .await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        track(
            &self.state,
            "Could not send the reset email. Please try again.",
            self.client.forgot_password(email),
        )
        .await
    }

    pub async fn reset_password(&self, reset_token: &str, password: &str) -> Result<User> {
        track(&self.state, "Password reset failed. Please try again.", async {
            let token = self.client.reset_password(reset_token, password).await?;
            self.sign_in_with(token).await
        })
        .await
    }

    pub async fn update_details(&self, req: &UpdateDetailsRequest) -> Result<User> {
        track(
            &self.state,
            "Could not update your details. Please try again.",
            async {
                let user = self.client.update_details(req).await?;
                write_lock(&self.state).current_user = Some(user.clone());
                Ok(user)
            },
        )
        .await
    }

    pub async fn update_password(&self, current_password: &str, new_password: &str) -> Result<()> {
        let req = UpdatePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        track(
            &self.state,
            "Could not update your password. Please try again.",
            self.client.update_password(&req),
        )
        .await
    }

    /// Id of the signed-in user, or `NotSignedIn`
    pub(crate) fn require_user_id(&self) -> Result<String> {
        read_lock(&self.state)
            .current_user
            .as_ref()
            .map(|user| user.id.clone())
            .ok_or(MarketError::NotSignedIn)
    }

    async fn sign_in_with(&self, token: String) -> Result<User> {
        if let Err(err) = self.storage.save(&token) {
            warn!(error = %err, "failed to persist token; session will not survive restart");
        }
        self.client.set_token(token);
        let user = self.refresh_user().await?;
        info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    async fn refresh_user(&self) -> Result<User> {
        let user = self.client.me().await?;
        write_lock(&self.state).current_user = Some(user.clone());
        Ok(user)
    }

    fn expire_session(&self) {
        self.forget_token();
        let mut guard = write_lock(&self.state);
        guard.current_user = None;
        guard.status.finish(Some(SESSION_EXPIRED.to_string()));
    }

    fn forget_token(&self) {
        if let Err(err) = self.storage.remove() {
            warn!(error = %err, "failed to remove stored token");
        }
        self.client.clear_token();
    }
}
