//! HTTP route handlers.

pub mod greeting;
pub mod login;

use crate::config::Config;
use crate::gate::middleware::AppState;
use axum::{routing::get, routing::post, Router};

/// Build the application router.
///
/// The login surface is mounted under the configured login path so it
/// lines up with the public rules the config appends for it.
pub fn router(config: &Config) -> Router<AppState> {
    Router::new()
        // Greeting endpoints
        .route("/welcome", get(greeting::welcome))
        .route("/restrictedArea", get(greeting::restricted_area))
        // Login flow
        .route(
            &config.login_path,
            get(login::login_page).post(login::form_login),
        )
        .route(&format!("{}/oauth", config.login_path), get(login::oauth_start))
        .route(
            &format!("{}/oauth/callback", config.login_path),
            get(login::oauth_callback),
        )
        .route("/logout", post(login::logout))
}
