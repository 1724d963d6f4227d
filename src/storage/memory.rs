//! In-process session store.
//!
//! Default backend when no `REDIS_URL` is configured; also what the test
//! suite runs against. Mirrors the TTL semantics of the Redis backend:
//! expired entries resolve to `None` on lookup and are dropped.

use crate::auth::session::now_secs;
use crate::error::AppError;
use crate::models::Session;
use crate::storage::SessionStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    // state nonce -> expiry instant (unix seconds)
    login_states: RwLock<HashMap<String, u64>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn lookup(&self, token: &str) -> Result<Option<Session>, AppError> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        match sessions.get(token) {
            Some(session) if session.is_valid(now_secs()) => Ok(Some(session.clone())),
            Some(_) => {
                // Lazy eviction, matching Redis key expiry
                sessions.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn store(&self, token: &str, session: &Session) -> Result<(), AppError> {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token.to_string(), session.clone());
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<bool, AppError> {
        Ok(self
            .sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(token)
            .is_some())
    }

    async fn store_login_state(&self, state: &str, ttl_secs: u64) -> Result<(), AppError> {
        self.login_states
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(state.to_string(), now_secs() + ttl_secs);
        Ok(())
    }

    async fn take_login_state(&self, state: &str) -> Result<bool, AppError> {
        let expires_at = self
            .login_states
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(state);
        Ok(matches!(expires_at, Some(expiry) if now_secs() < expiry))
    }
}
