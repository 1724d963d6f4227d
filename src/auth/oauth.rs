//! OAuth2 authorization-code login against an external identity provider.
//!
//! The provider is treated as an opaque capability: this adapter builds
//! the authorize redirect, exchanges the callback code for an access
//! token, and reads the identity claim from the provider's userinfo
//! document. It does not validate, refresh, or revoke tokens.

use crate::auth::session::now_secs;
use crate::auth::{Credentials, LoginFlow};
use crate::config::OAuthSettings;
use crate::error::AppError;
use crate::models::Session;
use async_trait::async_trait;
use serde::Deserialize;

pub struct OAuth2Login {
    settings: OAuthSettings,
    session_ttl_secs: u64,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl OAuth2Login {
    pub fn new(settings: OAuthSettings, session_ttl_secs: u64) -> Self {
        OAuth2Login {
            settings,
            session_ttl_secs,
            http: reqwest::Client::new(),
        }
    }

    /// Provider authorize URL carrying the single-use `state` nonce.
    pub fn authorize_url(&self, state: &str) -> Result<String, AppError> {
        let url = reqwest::Url::parse_with_params(
            &self.settings.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", self.settings.redirect_url.as_str()),
                ("scope", self.settings.scopes.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Invalid authorize URL: {}", e)))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let response = self
            .http
            .post(&self.settings.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.settings.redirect_url.as_str()),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Token endpoint request failed: {}", e)))?;

        if !response.status().is_success() {
            tracing::warn!(
                action = "auth_failed",
                method = "oauth2",
                status = %response.status(),
                "Code exchange rejected by provider"
            );
            return Err(AppError::AuthenticationFailed(
                "Code exchange rejected by provider".to_string(),
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid token response: {}", e)))?;
        Ok(token.access_token)
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<String, AppError> {
        let response = self
            .http
            .get(&self.settings.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::AuthenticationFailed(
                "Userinfo request rejected by provider".to_string(),
            ));
        }

        let claims: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid userinfo response: {}", e)))?;

        identity_from_claims(&claims, &self.settings.identity_claim).ok_or_else(|| {
            AppError::AuthenticationFailed(format!(
                "Userinfo response missing '{}' claim",
                self.settings.identity_claim
            ))
        })
    }
}

fn identity_from_claims(claims: &serde_json::Value, claim: &str) -> Option<String> {
    match claims.get(claim)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl LoginFlow for OAuth2Login {
    async fn authenticate(&self, credentials: Credentials) -> Result<Session, AppError> {
        let Credentials::AuthorizationCode { code } = credentials else {
            return Err(AppError::BadRequest(
                "OAuth2 login requires an authorization code".to_string(),
            ));
        };

        let access_token = self.exchange_code(&code).await?;
        let identity = self.fetch_identity(&access_token).await?;

        tracing::info!(action = "auth_success", method = "oauth2", identity = %identity, "Provider login completed");
        Ok(Session::new(identity, now_secs(), self.session_ttl_secs))
    }
}
