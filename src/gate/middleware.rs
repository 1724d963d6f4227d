//! Axum wiring for the authentication gate.
//!
//! The gate runs as a middleware layer around the whole router, so every
//! request (including ones that match no route) is decided before any
//! application logic. On allow, the session identity is attached to the
//! request extensions for downstream handlers.

use crate::auth::session::now_secs;
use crate::auth::{FormLogin, OAuth2Login};
use crate::config::Config;
use crate::error::AppError;
use crate::gate::decide::{Decision, Gate, GateRequest};
use crate::storage::SessionStore;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Name of the session cookie set on login.
pub const SESSION_COOKIE: &str = "session";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn SessionStore>,
    pub gate: Arc<Gate>,
    pub form: Option<Arc<FormLogin>>,
    pub oauth: Option<Arc<OAuth2Login>>,
}

/// Identity the gate attached on allow.
///
/// Extracting it in a handler documents that the route is only reachable
/// through the gate; a missing identity on such a route is a wiring bug.
#[derive(Debug, Clone)]
pub struct Identity(pub String);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("No authenticated identity".to_string()))
    }
}

/// Gate middleware: decide, then forward, redirect, or reject.
pub async fn route_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let cookie_token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let bearer_token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string());

    let gate_request = GateRequest {
        path: request.uri().path().to_string(),
        cookie_token,
        bearer_token,
    };

    match state.gate.decide(&gate_request, now_secs()).await {
        Decision::Allow { identity } => {
            if let Some(identity) = identity {
                request.extensions_mut().insert(Identity(identity));
            }
            next.run(request).await
        }
        Decision::Redirect { target } => {
            tracing::debug!(path = %gate_request.path, target = %target, "Redirecting unauthenticated request");
            found(&target)
        }
        Decision::Reject { reason } => AppError::Unauthorized(reason).into_response(),
    }
}

/// 302 Found toward `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::rules::RuleSet;
    use crate::models::Session;
    use crate::storage::memory::MemorySessionStore;
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Router};
    use std::time::Duration;
    use tower::ServiceExt;

    async fn public_handler() -> &'static str {
        "public"
    }

    async fn protected_handler(identity: Identity) -> String {
        format!("hello {}", identity.0)
    }

    fn test_state(store: Arc<MemorySessionStore>) -> AppState {
        let rules = RuleSet::parse("/welcome=public").unwrap();
        let config = Config::for_tests(rules.clone());
        let gate = Gate::new(
            rules,
            store.clone() as Arc<dyn SessionStore>,
            "/login".to_string(),
            Duration::from_millis(500),
        );
        AppState {
            config: Arc::new(config),
            store,
            gate: Arc::new(gate),
            form: None,
            oauth: None,
        }
    }

    fn test_app(state: AppState) -> Router {
        Router::new()
            .route("/welcome", get(public_handler))
            .route("/restrictedArea", get(protected_handler))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                route_gate,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_public_route_passes_through() {
        let app = test_app(test_state(Arc::new(MemorySessionStore::new())));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/welcome")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, "public");
    }

    #[tokio::test]
    async fn test_protected_route_redirects_anonymous() {
        let app = test_app(test_state(Arc::new(MemorySessionStore::new())));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/restrictedArea")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_unrouted_path_is_gated_too() {
        let app = test_app(test_state(Arc::new(MemorySessionStore::new())));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/no/such/route")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // The gate runs before route matching, so unknown paths redirect
        // instead of leaking a 404 to anonymous clients
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_session_cookie_attaches_identity() {
        let store = Arc::new(MemorySessionStore::new());
        store
            .store("tok", &Session::new("alice", now_secs(), 900))
            .await
            .unwrap();
        let app = test_app(test_state(store));

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/restrictedArea")
                    .header(header::COOKIE, "session=tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, "hello alice");
    }

    #[tokio::test]
    async fn test_bearer_token_works_and_rejects_when_invalid() {
        let store = Arc::new(MemorySessionStore::new());
        store
            .store("tok", &Session::new("api-client", now_secs(), 900))
            .await
            .unwrap();
        let app = test_app(test_state(store));

        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri("/restrictedArea")
                    .header(header::AUTHORIZATION, "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/restrictedArea")
                    .header(header::AUTHORIZATION, "Bearer bogus")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_found_is_302() {
        let response = found("/login");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }
}
