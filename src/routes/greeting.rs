//! Greeting endpoints: one public, one behind the gate.

use crate::gate::middleware::Identity;

/// GET /welcome — public greeting, no session required.
pub async fn welcome() -> &'static str {
    "Good Morning Bot!"
}

/// GET /restrictedArea — only reachable once the gate has admitted the
/// request and attached an identity.
pub async fn restricted_area(identity: Identity) -> &'static str {
    tracing::debug!(identity = %identity.0, "Serving restricted greeting");
    "Good Morning Human!"
}
