//! Quota policy engine.
//!
//! Pure decision logic for the two-phase metering flow: a coarse pre-render
//! check, then a priced decision once the renderer has reported the actual
//! page count. Nothing in this module mutates persistent state; the ledger
//! applies the outcome.

use crate::domain::{PlanTier, RequestIntent, UsageSnapshot};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

/// Free preview renders a free-plan account gets per calendar month.
pub const FREE_PREVIEWS_PER_MONTH: i32 = 3;

/// Per-request classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Preview within the free allowance; `preview_count` advances by one.
    PreviewFree,
    /// Billable render; `usage_count` advances by the page count.
    Billed { pages: i32 },
    /// Over the page ceiling; the artifact must be discarded.
    Rejected { scope: RejectionScope },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionScope {
    /// A plain download over the ceiling.
    Download,
    /// A preview past the free allowance, billed like a download and over
    /// the ceiling.
    PreviewBilled,
}

impl RejectionScope {
    pub fn user_message(self) -> &'static str {
        match self {
            RejectionScope::Download => {
                "Monthly usage limit reached. Upgrade to premium for more pages."
            }
            RejectionScope::PreviewBilled => {
                "Free previews used up and monthly usage limit reached. Upgrade to premium for more pages."
            }
        }
    }
}

impl Decision {
    pub fn is_rejected(self) -> bool {
        matches!(self, Decision::Rejected { .. })
    }
}

/// What the renderer is allowed to see, computed before rendering since it
/// changes the rendered content itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentGate {
    /// Premium-only input fields (custom logo, charts, extended notes) pass
    /// through to the template.
    pub premium_enabled: bool,
    /// A visible preview watermark is injected into the page.
    pub watermark: bool,
}

fn same_calendar_month(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Apply the calendar-month period rollover if one is due.
///
/// Idempotent within a month; each counter rolls on its own timestamp. Runs
/// once at the start of every quota decision, before anything else looks at
/// the counters.
pub fn roll_over(snapshot: &UsageSnapshot, now: DateTime<Utc>) -> (UsageSnapshot, bool) {
    let mut next = snapshot.clone();
    let mut changed = false;

    if !same_calendar_month(snapshot.usage_last_reset, now) {
        next.usage_count = 0;
        next.usage_last_reset = now;
        changed = true;
    }

    if !same_calendar_month(snapshot.preview_last_reset, now) {
        next.preview_count = 0;
        next.preview_last_reset = now;
        changed = true;
    }

    (next, changed)
}

/// Pre-render coarse check, on a rolled-over snapshot.
///
/// The true page count is unknown at this point, so the only safe rejection
/// is an already-exhausted free-plan download: rendering it would be wasted
/// work no matter how short the artifact turns out.
pub fn precheck(
    plan: PlanTier,
    intent: RequestIntent,
    snapshot: &UsageSnapshot,
) -> Result<(), RejectionScope> {
    if !plan.has_premium_access()
        && !intent.is_preview()
        && snapshot.usage_count >= snapshot.max_usage
    {
        return Err(RejectionScope::Download);
    }
    Ok(())
}

/// Post-render priced decision, on a rolled-over snapshot.
pub fn decide(
    plan: PlanTier,
    intent: RequestIntent,
    snapshot: &UsageSnapshot,
    page_count: i32,
) -> Decision {
    // Paid tiers are uncapped; pages still accrue for reporting.
    if plan.has_premium_access() {
        return Decision::Billed { pages: page_count };
    }

    match intent {
        RequestIntent::Preview if snapshot.preview_count < FREE_PREVIEWS_PER_MONTH => {
            Decision::PreviewFree
        }
        RequestIntent::Preview => billed_within_cap(snapshot, page_count, RejectionScope::PreviewBilled),
        RequestIntent::Download => billed_within_cap(snapshot, page_count, RejectionScope::Download),
    }
}

fn billed_within_cap(snapshot: &UsageSnapshot, page_count: i32, scope: RejectionScope) -> Decision {
    if snapshot.usage_count + page_count > snapshot.max_usage {
        Decision::Rejected { scope }
    } else {
        Decision::Billed { pages: page_count }
    }
}

/// Apply a decision's counter mutation. Rejections leave counters untouched.
pub fn apply(snapshot: &UsageSnapshot, decision: Decision) -> UsageSnapshot {
    let mut next = snapshot.clone();
    match decision {
        Decision::PreviewFree => next.preview_count += 1,
        Decision::Billed { pages } => next.usage_count += pages,
        Decision::Rejected { .. } => {}
    }
    next
}

/// Compute the pre-render content gate.
pub fn content_gate(plan: PlanTier, intent: RequestIntent, preview_count: i32) -> ContentGate {
    let premium = plan.has_premium_access();
    ContentGate {
        premium_enabled: premium,
        watermark: intent.is_preview() && !premium && preview_count >= FREE_PREVIEWS_PER_MONTH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(usage: i32, max: i32, previews: i32) -> UsageSnapshot {
        let now = Utc::now();
        UsageSnapshot {
            usage_count: usage,
            max_usage: max,
            preview_count: previews,
            usage_last_reset: now,
            preview_last_reset: now,
        }
    }

    #[test]
    fn preview_within_allowance_is_free() {
        for k in 0..FREE_PREVIEWS_PER_MONTH {
            let snap = snapshot(10, 30, k);
            let decision = decide(PlanTier::Free, RequestIntent::Preview, &snap, 5);
            assert_eq!(decision, Decision::PreviewFree);

            let next = apply(&snap, decision);
            assert_eq!(next.preview_count, k + 1);
            assert_eq!(next.usage_count, 10);
        }
    }

    #[test]
    fn preview_overflow_is_billed_like_a_download() {
        let snap = snapshot(28, 30, FREE_PREVIEWS_PER_MONTH);

        let accepted = decide(PlanTier::Free, RequestIntent::Preview, &snap, 2);
        assert_eq!(accepted, Decision::Billed { pages: 2 });

        let rejected = decide(PlanTier::Free, RequestIntent::Preview, &snap, 3);
        assert_eq!(
            rejected,
            Decision::Rejected {
                scope: RejectionScope::PreviewBilled
            }
        );
    }

    #[test]
    fn download_over_cap_is_rejected_without_mutation() {
        let snap = snapshot(29, 30, 0);
        let decision = decide(PlanTier::Free, RequestIntent::Download, &snap, 2);
        assert_eq!(
            decision,
            Decision::Rejected {
                scope: RejectionScope::Download
            }
        );

        let next = apply(&snap, decision);
        assert_eq!(next.usage_count, 29);
        assert_eq!(next.preview_count, 0);
    }

    #[test]
    fn download_within_cap_fills_to_ceiling() {
        let snap = snapshot(28, 30, 0);
        let decision = decide(PlanTier::Free, RequestIntent::Download, &snap, 2);
        assert_eq!(decision, Decision::Billed { pages: 2 });
        assert_eq!(apply(&snap, decision).usage_count, 30);
    }

    #[test]
    fn paid_tiers_are_uncapped() {
        let snap = snapshot(995, 1000, 0);
        for plan in [PlanTier::Premium, PlanTier::Pro] {
            let decision = decide(plan, RequestIntent::Download, &snap, 50);
            assert_eq!(decision, Decision::Billed { pages: 50 });
        }
    }

    #[test]
    fn precheck_rejects_exhausted_free_downloads_only() {
        let exhausted = snapshot(30, 30, 0);

        assert_eq!(
            precheck(PlanTier::Free, RequestIntent::Download, &exhausted),
            Err(RejectionScope::Download)
        );
        // Previews and paid tiers pass the coarse check.
        assert!(precheck(PlanTier::Free, RequestIntent::Preview, &exhausted).is_ok());
        assert!(precheck(PlanTier::Premium, RequestIntent::Download, &exhausted).is_ok());

        let open = snapshot(29, 30, 0);
        assert!(precheck(PlanTier::Free, RequestIntent::Download, &open).is_ok());
    }

    #[test]
    fn roll_over_resets_counters_on_month_change() {
        let last_month = Utc.with_ymd_and_hms(2025, 6, 28, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 0, 5, 0).unwrap();

        let snap = UsageSnapshot {
            usage_count: 25,
            max_usage: 30,
            preview_count: 2,
            usage_last_reset: last_month,
            preview_last_reset: last_month,
        };

        let (rolled, changed) = roll_over(&snap, now);
        assert!(changed);
        assert_eq!(rolled.usage_count, 0);
        assert_eq!(rolled.preview_count, 0);
        assert_eq!(rolled.usage_last_reset, now);
        assert_eq!(rolled.preview_last_reset, now);
    }

    #[test]
    fn roll_over_is_idempotent_within_a_month() {
        let now = Utc.with_ymd_and_hms(2025, 7, 15, 9, 0, 0).unwrap();
        let snap = UsageSnapshot {
            usage_count: 12,
            max_usage: 30,
            preview_count: 1,
            usage_last_reset: Utc.with_ymd_and_hms(2025, 7, 2, 0, 0, 0).unwrap(),
            preview_last_reset: Utc.with_ymd_and_hms(2025, 7, 3, 0, 0, 0).unwrap(),
        };

        let (rolled, changed) = roll_over(&snap, now);
        assert!(!changed);
        assert_eq!(rolled, snap);
    }

    #[test]
    fn counters_roll_independently() {
        let now = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
        let snap = UsageSnapshot {
            usage_count: 20,
            max_usage: 30,
            preview_count: 3,
            // Usage already rolled this month; previews have not.
            usage_last_reset: Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
            preview_last_reset: Utc.with_ymd_and_hms(2025, 7, 20, 0, 0, 0).unwrap(),
        };

        let (rolled, changed) = roll_over(&snap, now);
        assert!(changed);
        assert_eq!(rolled.usage_count, 20);
        assert_eq!(rolled.preview_count, 0);
    }

    #[test]
    fn year_boundary_counts_as_a_new_month() {
        let december = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        let january = Utc.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap();

        let snap = UsageSnapshot {
            usage_count: 7,
            max_usage: 30,
            preview_count: 1,
            usage_last_reset: december,
            preview_last_reset: december,
        };

        let (rolled, changed) = roll_over(&snap, january);
        assert!(changed);
        assert_eq!(rolled.usage_count, 0);
    }

    #[test]
    fn watermark_applies_past_the_free_preview_allowance() {
        let gate = content_gate(PlanTier::Free, RequestIntent::Preview, 3);
        assert!(gate.watermark);
        assert!(!gate.premium_enabled);

        let within = content_gate(PlanTier::Free, RequestIntent::Preview, 2);
        assert!(!within.watermark);

        let premium = content_gate(PlanTier::Pro, RequestIntent::Preview, 5);
        assert!(!premium.watermark);
        assert!(premium.premium_enabled);

        let download = content_gate(PlanTier::Free, RequestIntent::Download, 5);
        assert!(!download.watermark);
    }
}
