//! Login flow adapters: external mechanisms that turn credentials into sessions.

pub mod form;
pub mod oauth;
pub mod session;

pub use form::FormLogin;
pub use oauth::OAuth2Login;
pub use session::{generate_login_state, generate_session_token, now_secs};

use crate::error::AppError;
use crate::models::Session;
use async_trait::async_trait;

/// Credentials a login flow can exchange for a session.
#[derive(Debug)]
pub enum Credentials {
    Password { username: String, password: String },
    AuthorizationCode { code: String },
}

/// A pluggable credential exchange.
///
/// Implementations produce a fresh valid [`Session`] or fail with
/// [`AppError::AuthenticationFailed`]. The gate never calls this; login
/// routes do, and store the resulting session themselves.
#[async_trait]
pub trait LoginFlow: Send + Sync {
    async fn authenticate(&self, credentials: Credentials) -> Result<Session, AppError>;
}
