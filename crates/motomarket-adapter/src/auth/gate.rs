/*
[INPUT]:  Session loading flag, signed-in user and requested path
[OUTPUT]: Access decision for protected pages
[POS]:    Auth layer - gate in front of account-only screens
[UPDATE]: When verification requirements or redirect targets change
*/

use crate::types::User;

pub const LOGIN_PATH: &str = "/login";
pub const VERIFICATION_PATH: &str = "/verification";

/// Outcome of checking a protected path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Session check still running; show a spinner
    Pending,
    RedirectLogin,
    /// Signed in, phone not yet confirmed
    RedirectVerification,
    Granted,
}

impl Access {
    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            Access::RedirectLogin => Some(LOGIN_PATH),
            Access::RedirectVerification => Some(VERIFICATION_PATH),
            Access::Pending | Access::Granted => None,
        }
    }
}

pub fn check_access(loading: bool, user: Option<&User>, path: &str) -> Access {
    if loading {
        return Access::Pending;
    }
    let Some(user) = user else {
        return Access::RedirectLogin;
    };
    if !user.is_phone_verified() && path.trim_end_matches('/') != VERIFICATION_PATH {
        return Access::RedirectVerification;
    }
    Access::Granted
}
