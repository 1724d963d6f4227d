//! Local form-credential login.
//!
//! Verifies a submitted username and password against the single
//! configured account (`FORM_USER` / `FORM_PASSWORD_HASH`). The hash is an
//! Argon2id PHC string; the `hashpw` CLI subcommand produces one.

use crate::auth::session::now_secs;
use crate::auth::{Credentials, LoginFlow};
use crate::error::AppError;
use crate::models::Session;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use rand::Rng;

pub struct FormLogin {
    username: String,
    password_hash: String,
    session_ttl_secs: u64,
}

impl FormLogin {
    pub fn new(username: String, password_hash: String, session_ttl_secs: u64) -> Self {
        FormLogin {
            username,
            password_hash,
            session_ttl_secs,
        }
    }
}

#[async_trait]
impl LoginFlow for FormLogin {
    async fn authenticate(&self, credentials: Credentials) -> Result<Session, AppError> {
        let Credentials::Password { username, password } = credentials else {
            return Err(AppError::BadRequest(
                "Form login requires username and password".to_string(),
            ));
        };

        let parsed = PasswordHash::new(&self.password_hash)
            .map_err(|e| AppError::Internal(format!("Invalid configured password hash: {}", e)))?;

        // Verify the hash regardless of whether the username matches
        let password_ok = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();

        if username != self.username || !password_ok {
            tracing::warn!(action = "auth_failed", method = "form", "Invalid form credentials");
            return Err(AppError::AuthenticationFailed(
                "Invalid username or password".to_string(),
            ));
        }

        tracing::info!(action = "auth_success", method = "form", identity = %username, "User authenticated");
        Ok(Session::new(username, now_secs(), self.session_ttl_secs))
    }
}

/// Argon2id-hash a password into a PHC string suitable for
/// `FORM_PASSWORD_HASH`.
pub fn hash_password(password: &str) -> Result<String, String> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| format!("Salt encoding: {}", e))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| format!("Argon2 hash: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_flow() -> FormLogin {
        let hash = hash_password("s3cret").unwrap();
        FormLogin::new("tester".to_string(), hash, 900)
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let flow = test_flow();
        let session = flow
            .authenticate(Credentials::Password {
                username: "tester".to_string(),
                password: "s3cret".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session.identity, "tester");
        assert!(session.is_valid(now_secs()));
        assert_eq!(session.expires_at, session.established_at + 900);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let flow = test_flow();
        let result = flow
            .authenticate(Credentials::Password {
                username: "tester".to_string(),
                password: "wrong".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_wrong_username() {
        let flow = test_flow();
        let result = flow
            .authenticate(Credentials::Password {
                username: "impostor".to_string(),
                password: "s3cret".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_rejects_authorization_code() {
        let flow = test_flow();
        let result = flow
            .authenticate(Credentials::AuthorizationCode {
                code: "abc".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_hash_password_produces_phc_string() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordHash::new(&hash).is_ok());
    }
}
