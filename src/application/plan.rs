//! Effective-plan resolution.

use crate::domain::{Account, PlanTier};
use std::str::FromStr;
use tracing::warn;

/// Compute the plan a request is served under.
///
/// An operator-supplied override wins outright, regardless of the stored
/// plan. The override is threaded in explicitly by the caller (parsed from
/// configuration once per request path) rather than read from a process-wide
/// global here.
pub fn resolve_effective_plan(account: &Account, override_plan: Option<PlanTier>) -> PlanTier {
    override_plan.unwrap_or(account.plan)
}

/// Parse the configured forced-plan value. Empty means no override;
/// unrecognized values are ignored with a warning.
pub fn parse_plan_override(raw: &str) -> Option<PlanTier> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match PlanTier::from_str(trimmed) {
        Ok(plan) => Some(plan),
        Err(_) => {
            warn!(value = %trimmed, "Ignoring unrecognized forced_plan value");
            None
        }
    }
}

/// Access label exposed by `/check-access`.
pub fn access_type(plan: PlanTier) -> &'static str {
    if plan.has_premium_access() {
        "premium"
    } else {
        "basic"
    }
}
