//! Route authentication gate: ordered path rules plus session checks,
//! producing a per-request allow/redirect/reject decision.

pub mod decide;
pub mod middleware;
pub mod rules;

pub use decide::{Decision, Gate, GateRequest};
pub use middleware::{route_gate, AppState, Identity, SESSION_COOKIE};
pub use rules::{Requirement, RouteRule, RuleSet};
