//! Session and request models.
//!
//! All models use serde for serialization/deserialization.
//! `Session` is also the storage representation (JSON in Redis).

use serde::{Deserialize, Serialize};

/// Server-held proof of a successfully authenticated identity.
///
/// Created by a login flow adapter, persisted by the session store keyed
/// by a bearer token, destroyed on expiry or logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: String,
    pub established_at: u64,
    pub expires_at: u64,
}

impl Session {
    /// Create a session established at `now`, expiring after `ttl_secs`.
    pub fn new(identity: impl Into<String>, now: u64, ttl_secs: u64) -> Self {
        Session {
            identity: identity.into(),
            established_at: now,
            expires_at: now + ttl_secs,
        }
    }

    /// A session is valid strictly before its expiry instant.
    pub fn is_valid(&self, now: u64) -> bool {
        now < self.expires_at
    }
}

/// Form login submission.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Query parameters the provider sends to the OAuth2 callback.
#[derive(Debug, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
}
