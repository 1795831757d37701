/*
[INPUT]:  Credentials, persisted tokens and session state
[OUTPUT]: Authenticated session, bearer tokens and access decisions
[POS]:    Auth layer - handles marketplace authentication
[UPDATE]: When auth flow or token persistence change
*/

pub mod gate;
pub mod jwt;
pub mod session;
pub mod token_store;

pub use gate::{Access, LOGIN_PATH, VERIFICATION_PATH, check_access};
pub use jwt::{JwtManager, TokenData};
pub use session::{AuthSession, AuthState};
pub use token_store::{FileTokenStorage, MemoryTokenStorage, TokenStorage};
