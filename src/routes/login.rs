//! Login and logout endpoints.
//!
//! These are the only routes that call a login flow adapter. On success
//! they mint a session token, persist the session, and hand the token to
//! the browser as an HttpOnly cookie.

use crate::auth::session::{generate_login_state, generate_session_token};
use crate::auth::{Credentials, LoginFlow};
use crate::error::AppError;
use crate::gate::middleware::{found, AppState, SESSION_COOKIE};
use crate::models::{LoginForm, OAuthCallback, Session};
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// GET /login — login page offering the configured method(s).
pub async fn login_page(State(state): State<AppState>) -> Html<String> {
    let mut body = String::from("<!doctype html><html><body><h1>Sign in</h1>");

    if state.form.is_some() {
        body.push_str(&format!(
            r#"<form method="post" action="{}">
  <label>Username <input type="text" name="username" autocomplete="username"></label>
  <label>Password <input type="password" name="password" autocomplete="current-password"></label>
  <button type="submit">Sign in</button>
</form>"#,
            state.config.login_path
        ));
    }

    if state.oauth.is_some() {
        body.push_str(&format!(
            r#"<p><a href="{}/oauth">Sign in with identity provider</a></p>"#,
            state.config.login_path
        ));
    }

    body.push_str("</body></html>");
    Html(body)
}

/// POST /login — exchange form credentials for a session.
pub async fn form_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let flow = state
        .form
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Form login is not enabled".to_string()))?;

    let session = flow
        .authenticate(Credentials::Password {
            username: form.username,
            password: form.password,
        })
        .await?;

    establish_session(&state, jar, session).await
}

/// GET /login/oauth — send the browser to the provider's authorize
/// endpoint with a fresh single-use state nonce.
pub async fn oauth_start(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let oauth = state
        .oauth
        .as_ref()
        .ok_or_else(|| AppError::NotFound("OAuth2 login is not enabled".to_string()))?;

    let login_state = generate_login_state();
    state
        .store
        .store_login_state(&login_state, state.config.login_state_ttl_secs)
        .await?;

    let url = oauth.authorize_url(&login_state)?;
    tracing::debug!(action = "oauth_start", "Redirecting to identity provider");
    Ok(found(&url))
}

/// GET /login/oauth/callback — complete the provider exchange.
pub async fn oauth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<OAuthCallback>,
) -> Result<impl IntoResponse, AppError> {
    let oauth = state
        .oauth
        .as_ref()
        .ok_or_else(|| AppError::NotFound("OAuth2 login is not enabled".to_string()))?;

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;
    let callback_state = params
        .state
        .ok_or_else(|| AppError::BadRequest("Missing state parameter".to_string()))?;

    // The nonce binds this callback to an authorize redirect we issued;
    // it is consumed on first use
    if !state.store.take_login_state(&callback_state).await? {
        tracing::warn!(action = "auth_failed", method = "oauth2", "Unknown or replayed state");
        return Err(AppError::AuthenticationFailed(
            "Unknown or replayed state parameter".to_string(),
        ));
    }

    let session = oauth
        .authenticate(Credentials::AuthorizationCode { code })
        .await?;

    establish_session(&state, jar, session).await
}

/// POST /logout — destroy the current session and clear the cookie.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.store.delete(cookie.value()).await?;
        tracing::info!(action = "logout", "Session destroyed");
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    Ok((jar, found(&state.config.login_path)))
}

/// Persist `session` under a fresh token and set the session cookie.
async fn establish_session(
    state: &AppState,
    jar: CookieJar,
    session: Session,
) -> Result<(CookieJar, axum::response::Response), AppError> {
    let token = generate_session_token();
    state.store.store(&token, &session).await?;

    tracing::info!(action = "login", identity = %session.identity, "Session established");

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), found(&state.config.post_login_redirect)))
}
