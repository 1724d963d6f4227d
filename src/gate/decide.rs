//! The per-request admission decision.
//!
//! `Gate::decide` is invoked once per incoming request, before any handler
//! runs. Apart from the single awaited session lookup it is pure
//! computation over already-resolved inputs: deterministic given the
//! request, the rule set, the store contents, and `now`.
//!
//! A lookup that errors or exceeds the timeout counts as "session absent"
//! and the request is denied. The gate never fails open.

use crate::gate::rules::{Requirement, RuleSet};
use crate::models::Session;
use crate::storage::SessionStore;
use std::sync::Arc;
use std::time::Duration;

/// Immutable per-request snapshot the gate decides on.
#[derive(Debug, Clone)]
pub struct GateRequest {
    pub path: String,
    pub cookie_token: Option<String>,
    pub bearer_token: Option<String>,
}

impl GateRequest {
    /// The session token carried by the request, cookie preferred.
    pub fn token(&self) -> Option<&str> {
        self.cookie_token
            .as_deref()
            .or(self.bearer_token.as_deref())
    }
}

/// Outcome of a gate decision. Derived per request, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow { identity: Option<String> },
    Redirect { target: String },
    Reject { reason: String },
}

pub struct Gate {
    rules: RuleSet,
    store: Arc<dyn SessionStore>,
    login_path: String,
    lookup_timeout: Duration,
}

impl Gate {
    pub fn new(
        rules: RuleSet,
        store: Arc<dyn SessionStore>,
        login_path: String,
        lookup_timeout: Duration,
    ) -> Self {
        Gate {
            rules,
            store,
            login_path,
            lookup_timeout,
        }
    }

    /// Decide whether `request` may proceed at instant `now`.
    pub async fn decide(&self, request: &GateRequest, now: u64) -> Decision {
        if self.rules.requirement_for(&request.path) == Requirement::Public {
            return Decision::Allow { identity: None };
        }

        let session = match request.token() {
            Some(token) => self.lookup(token).await,
            None => None,
        };

        match session {
            Some(session) if session.is_valid(now) => Decision::Allow {
                identity: Some(session.identity),
            },
            _ => self.deny(request),
        }
    }

    /// Bounded session lookup; timeout and store errors resolve to absent.
    async fn lookup(&self, token: &str) -> Option<Session> {
        match tokio::time::timeout(self.lookup_timeout, self.store.lookup(token)).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Session lookup failed, treating as absent");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "Session lookup timed out, treating as absent"
                );
                None
            }
        }
    }

    /// Browsers get a redirect to the login flow; clients that only sent a
    /// bearer token get a rejection they can act on.
    fn deny(&self, request: &GateRequest) -> Decision {
        if request.bearer_token.is_some() && request.cookie_token.is_none() {
            Decision::Reject {
                reason: "Invalid or expired session".to_string(),
            }
        } else {
            Decision::Redirect {
                target: self.login_path.clone(),
            }
        }
    }
}
