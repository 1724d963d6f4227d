use crate::gate::rules::RuleSet;
use argon2::password_hash::PasswordHash;
use std::env;
use std::net::SocketAddr;

#[derive(Clone)]
pub struct Config {
    // Server
    pub bind_addr: SocketAddr,

    // Session store backend; memory store when unset
    pub redis_url: Option<String>,

    // Route access rules, login surface included
    pub rules: RuleSet,

    // Login flow
    pub login_path: String,
    pub post_login_redirect: String,

    // TTLs and timeouts
    pub session_ttl_secs: u64,
    pub session_lookup_timeout_ms: u64,
    pub login_state_ttl_secs: u64,

    // Login methods (at least one must be configured)
    pub form: Option<FormSettings>,
    pub oauth: Option<OAuthSettings>,
}

/// Local form-login account.
#[derive(Clone)]
pub struct FormSettings {
    pub username: String,
    pub password_hash: String,
}

/// External OAuth2 provider wiring.
#[derive(Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub redirect_url: String,
    pub scopes: String,
    pub identity_claim: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[REDACTED]"))
            .field("rules", &self.rules)
            .field("login_path", &self.login_path)
            .field("post_login_redirect", &self.post_login_redirect)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("session_lookup_timeout_ms", &self.session_lookup_timeout_ms)
            .field("login_state_ttl_secs", &self.login_state_ttl_secs)
            .field("form", &self.form)
            .field("oauth", &self.oauth)
            .finish()
    }
}

impl std::fmt::Debug for FormSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSettings")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .field("redirect_url", &self.redirect_url)
            .field("scopes", &self.scopes)
            .field("identity_claim", &self.identity_claim)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        // Login surface
        let login_path = env::var("LOGIN_PATH").unwrap_or_else(|_| "/login".to_string());
        validate_path("LOGIN_PATH", &login_path)?;

        let post_login_redirect =
            env::var("POST_LOGIN_REDIRECT").unwrap_or_else(|_| "/restrictedArea".to_string());
        validate_path("POST_LOGIN_REDIRECT", &post_login_redirect)?;

        // Route rules; a malformed pattern is fatal here, never per-request
        let rules_spec = env::var("ROUTE_RULES").unwrap_or_else(|_| "/welcome=public".to_string());
        let mut rules = RuleSet::parse(&rules_spec)
            .map_err(|e| ConfigError::InvalidValue("ROUTE_RULES".to_string(), e.to_string()))?;

        // The login flow itself must stay reachable for anonymous clients
        for pattern in [
            login_path.clone(),
            format!("{}/oauth", login_path),
            format!("{}/oauth/callback", login_path),
        ] {
            rules
                .push_public(&pattern)
                .map_err(|e| ConfigError::InvalidValue("LOGIN_PATH".to_string(), e.to_string()))?;
        }

        // TTLs and timeouts
        let session_ttl_secs = parse_env_or_default("SESSION_TTL_SECS", 900)?;
        let session_lookup_timeout_ms = parse_env_or_default("SESSION_LOOKUP_TIMEOUT_MS", 500)?;
        let login_state_ttl_secs = parse_env_or_default("LOGIN_STATE_TTL_SECS", 300)?;

        // Session store backend
        let redis_url = env::var("REDIS_URL").ok();

        // Form login
        let form = match env::var("FORM_USER") {
            Ok(username) => {
                if username.is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "FORM_USER".to_string(),
                        "cannot be empty".to_string(),
                    ));
                }
                let password_hash = env::var("FORM_PASSWORD_HASH")
                    .map_err(|_| ConfigError::MissingVar("FORM_PASSWORD_HASH".to_string()))?;
                if PasswordHash::new(&password_hash).is_err() {
                    return Err(ConfigError::InvalidValue(
                        "FORM_PASSWORD_HASH".to_string(),
                        "not a valid PHC hash string (generate one with the hashpw subcommand)"
                            .to_string(),
                    ));
                }
                Some(FormSettings {
                    username,
                    password_hash,
                })
            }
            Err(_) => None,
        };

        // OAuth2 provider login
        let oauth = match env::var("OAUTH_CLIENT_ID") {
            Ok(client_id) => {
                let client_secret = require_env("OAUTH_CLIENT_SECRET")?;
                let authorize_url = require_url("OAUTH_AUTHORIZE_URL")?;
                let token_url = require_url("OAUTH_TOKEN_URL")?;
                let userinfo_url = require_url("OAUTH_USERINFO_URL")?;
                let redirect_url = require_url("OAUTH_REDIRECT_URL")?;
                let scopes =
                    env::var("OAUTH_SCOPES").unwrap_or_else(|_| "openid profile".to_string());
                let identity_claim =
                    env::var("OAUTH_IDENTITY_CLAIM").unwrap_or_else(|_| "sub".to_string());
                Some(OAuthSettings {
                    client_id,
                    client_secret,
                    authorize_url,
                    token_url,
                    userinfo_url,
                    redirect_url,
                    scopes,
                    identity_claim,
                })
            }
            Err(_) => None,
        };

        // A gate whose login flow can never succeed is a misconfiguration
        if form.is_none() && oauth.is_none() {
            return Err(ConfigError::MissingVar(
                "FORM_USER or OAUTH_CLIENT_ID".to_string(),
            ));
        }

        Ok(Config {
            bind_addr,
            redis_url,
            rules,
            login_path,
            post_login_redirect,
            session_ttl_secs,
            session_lookup_timeout_ms,
            login_state_ttl_secs,
            form,
            oauth,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests(rules: RuleSet) -> Self {
        Config {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            redis_url: None,
            rules,
            login_path: "/login".to_string(),
            post_login_redirect: "/restrictedArea".to_string(),
            session_ttl_secs: 900,
            session_lookup_timeout_ms: 500,
            login_state_ttl_secs: 300,
            form: None,
            oauth: None,
        }
    }
}

fn validate_path(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with('/') || value.len() < 2 || value.ends_with('/') {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' must be an absolute path without a trailing slash", value),
        ));
    }
    Ok(())
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))
}

fn require_url(key: &str) -> Result<String, ConfigError> {
    let value = require_env(key)?;
    reqwest::Url::parse(&value)
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), format!("invalid URL: {}", e)))?;
    Ok(value)
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
