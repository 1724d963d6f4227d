//! Session storage backends.
//!
//! Sessions are keyed by an opaque bearer token. Login-state nonces are
//! single-use short-TTL values binding an OAuth2 callback to the authorize
//! redirect that initiated it.
//!
//! The gate treats every lookup failure as "session absent", so a backend
//! outage denies access rather than granting it.

pub mod memory;
pub mod redis;

use crate::error::AppError;
use crate::models::Session;
use async_trait::async_trait;

/// Store holding active sessions and pending login-state nonces.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session by token. Expired and absent sessions both
    /// resolve to `None`.
    async fn lookup(&self, token: &str) -> Result<Option<Session>, AppError>;

    /// Persist a session under `token` until its expiry instant.
    async fn store(&self, token: &str, session: &Session) -> Result<(), AppError>;

    /// Remove a session. Returns true if it existed.
    async fn delete(&self, token: &str) -> Result<bool, AppError>;

    /// Persist a single-use login-state nonce for `ttl_secs`.
    async fn store_login_state(&self, state: &str, ttl_secs: u64) -> Result<(), AppError>;

    /// Consume a login-state nonce. Returns true only the first time a
    /// live nonce is presented.
    async fn take_login_state(&self, state: &str) -> Result<bool, AppError>;
}
