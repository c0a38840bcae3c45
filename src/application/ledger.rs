//! Usage ledger updater.
//!
//! The single write path for account usage counters. Every settlement is a
//! read / roll-over / decide / conditional-write cycle guarded by the
//! account's version column, so concurrent settlements against the same
//! account behave as if they were serialized: the loser of a version race
//! re-reads and re-decides against the committed state.

use crate::application::quota::{self, Decision};
use crate::domain::{PlanTier, RequestIntent};
use crate::infrastructure::{AccountRepository, RepositoryError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

const MAX_COMMIT_ATTEMPTS: u32 = 5;
const CONFLICT_BACKOFF_MS: u64 = 10;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Gave up committing usage for account {0} after {1} attempts")]
    CommitContention(Uuid, u32),
}

pub struct UsageLedger<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
}

impl<R> UsageLedger<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Settle a rendered artifact against the account: apply any due period
    /// rollover, price the request at its actual page count, and commit the
    /// resulting counters.
    ///
    /// A rejection mutates nothing, but a rollover that became due on the
    /// same request is still persisted; the reset belongs to the calendar,
    /// not to this request's outcome.
    pub async fn settle(
        &self,
        account_id: Uuid,
        plan: PlanTier,
        intent: RequestIntent,
        page_count: i32,
    ) -> Result<Decision, LedgerError> {
        for attempt in 0..MAX_COMMIT_ATTEMPTS {
            let account = self.repo.get_by_id(account_id).await?;
            let now = Utc::now();

            let (snapshot, rolled) = quota::roll_over(&account.usage_snapshot(), now);
            let decision = quota::decide(plan, intent, &snapshot, page_count);

            if decision.is_rejected() && !rolled {
                return Ok(decision);
            }

            let next = quota::apply(&snapshot, decision);
            if self
                .repo
                .commit_counters(account_id, account.version, &next)
                .await?
            {
                debug!(
                    account_id = %account_id,
                    ?decision,
                    usage_count = next.usage_count,
                    preview_count = next.preview_count,
                    "Committed usage settlement"
                );
                return Ok(decision);
            }

            warn!(
                account_id = %account_id,
                attempt = attempt + 1,
                "Usage commit lost a version race, retrying"
            );
            sleep(Duration::from_millis(CONFLICT_BACKOFF_MS << attempt)).await;
        }

        Err(LedgerError::CommitContention(
            account_id,
            MAX_COMMIT_ATTEMPTS,
        ))
    }
}
