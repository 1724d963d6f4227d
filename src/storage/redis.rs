//! Redis-backed session store.
//!
//! Key patterns:
//! - `session:{token}` — session data (JSON), TTL until expiry
//! - `login_state:{state}` — single-use OAuth2 state nonce
//!
//! Session JSON fetched from Redis is wrapped in `Zeroizing` so the raw
//! copy is cleared from application memory after deserialization.

use crate::auth::session::now_secs;
use crate::error::AppError;
use crate::models::Session;
use crate::storage::SessionStore;
use async_trait::async_trait;
use redis::AsyncCommands;
use zeroize::Zeroizing;

pub struct RedisSessionStore {
    client: redis::Client,
}

impl RedisSessionStore {
    pub fn new(client: redis::Client) -> Self {
        RedisSessionStore { client }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, AppError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection error: {}", e)))
    }
}

fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

fn login_state_key(state: &str) -> String {
    format!("login_state:{}", state)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn lookup(&self, token: &str) -> Result<Option<Session>, AppError> {
        let mut con = self.connection().await?;
        let json: Option<String> = con.get(session_key(token)).await?;

        match json {
            Some(data) => {
                let zeroizing_data = Zeroizing::new(data);
                let session: Session = serde_json::from_str(&zeroizing_data)?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn store(&self, token: &str, session: &Session) -> Result<(), AppError> {
        let mut con = self.connection().await?;
        let json = serde_json::to_string(session)?;

        // Redis TTLs are relative; expiry is absolute. A session already at
        // or past expiry still gets a minimal TTL and dies immediately.
        let ttl_secs = session.expires_at.saturating_sub(now_secs()).max(1);
        con.set_ex::<_, _, ()>(session_key(token), json, ttl_secs)
            .await?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<bool, AppError> {
        let mut con = self.connection().await?;
        let deleted: i32 = con.del(session_key(token)).await?;
        Ok(deleted > 0)
    }

    async fn store_login_state(&self, state: &str, ttl_secs: u64) -> Result<(), AppError> {
        let mut con = self.connection().await?;
        con.set_ex::<_, _, ()>(login_state_key(state), "1", ttl_secs)
            .await?;
        Ok(())
    }

    async fn take_login_state(&self, state: &str) -> Result<bool, AppError> {
        let mut con = self.connection().await?;

        // Atomic GET + DEL so a nonce can never be consumed twice
        let script = redis::Script::new(
            r"
            local val = redis.call('GET', KEYS[1])
            if val then
                redis.call('DEL', KEYS[1])
            end
            return val
            ",
        );

        let value: Option<String> = script
            .key(login_state_key(state))
            .invoke_async(&mut con)
            .await?;
        Ok(value.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Requires a running Redis instance; skips when unavailable.
    #[tokio::test]
    async fn test_session_roundtrip() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let client = match redis::Client::open(redis_url) {
            Ok(c) => c,
            Err(_) => {
                eprintln!("Skipping test: Redis not available");
                return;
            }
        };
        let store = RedisSessionStore::new(client);
        if store.connection().await.is_err() {
            eprintln!("Skipping test: Redis connection failed");
            return;
        }

        let session = Session::new("redis-test-user", now_secs(), 60);
        store.store("redis-test-token", &session).await.unwrap();
        assert_eq!(
            store.lookup("redis-test-token").await.unwrap(),
            Some(session)
        );

        assert!(store.delete("redis-test-token").await.unwrap());
        assert!(!store.delete("redis-test-token").await.unwrap());
        assert_eq!(store.lookup("redis-test-token").await.unwrap(), None);

        store
            .store_login_state("redis-test-state", 60)
            .await
            .unwrap();
        assert!(store.take_login_state("redis-test-state").await.unwrap());
        assert!(!store.take_login_state("redis-test-state").await.unwrap());
    }
}
