use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Hours an account must stay soft-deleted before it can be reactivated.
pub const REACTIVATION_COOLDOWN_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    /// `sha256:<hex>` digest of the API key, used for lookup.
    pub api_key_hash: String,
    /// AES-GCM ciphertext of the API key (nonce-prefixed), for display on `/me`.
    #[serde(with = "serde_bytes")]
    pub api_key_encrypted: Vec<u8>,
    pub plan: PlanTier,
    /// Pages billed in the current billing period.
    pub usage_count: i32,
    /// Page ceiling for the current billing period.
    pub max_usage: i32,
    /// Free preview renders consumed in the current preview period.
    pub preview_count: i32,
    pub usage_last_reset: DateTime<Utc>,
    pub preview_last_reset: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Optimistic-concurrency guard; bumped by every committed counter write.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Premium,
    Pro,
}

impl PlanTier {
    /// `premium` and `pro` are equivalent to the policy engine.
    pub fn has_premium_access(self) -> bool {
        matches!(self, PlanTier::Premium | PlanTier::Pro)
    }

    pub fn default_max_usage(self) -> i32 {
        match self {
            PlanTier::Free => 30,
            PlanTier::Premium => 1000,
            PlanTier::Pro => 10000,
        }
    }
}

/// The mutable metering slice of an [`Account`]. The policy engine decides
/// over a snapshot; the ledger writes one back under the version guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub usage_count: i32,
    pub max_usage: i32,
    pub preview_count: i32,
    pub usage_last_reset: DateTime<Utc>,
    pub preview_last_reset: DateTime<Utc>,
}

impl Account {
    pub fn new(email: String, api_key_hash: String, api_key_encrypted: Vec<u8>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            api_key_hash,
            api_key_encrypted,
            plan: PlanTier::Free,
            usage_count: 0,
            max_usage: PlanTier::Free.default_max_usage(),
            preview_count: 0,
            usage_last_reset: now,
            preview_last_reset: now,
            deleted: false,
            deleted_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Earliest instant a soft-deleted account may be reactivated.
    pub fn reactivation_allowed_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
            .map(|at| at + chrono::Duration::hours(REACTIVATION_COOLDOWN_HOURS))
    }

    pub fn usage_snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            usage_count: self.usage_count,
            max_usage: self.max_usage,
            preview_count: self.preview_count,
            usage_last_reset: self.usage_last_reset,
            preview_last_reset: self.preview_last_reset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_starts_free_with_zeroed_counters() {
        let account = Account::new(
            "user@example.com".to_string(),
            "sha256:abc".to_string(),
            vec![1, 2, 3],
        );

        assert_eq!(account.plan, PlanTier::Free);
        assert_eq!(account.usage_count, 0);
        assert_eq!(account.preview_count, 0);
        assert_eq!(account.max_usage, 30);
        assert!(!account.deleted);
        assert_eq!(account.version, 0);
    }

    #[test]
    fn premium_and_pro_share_premium_access() {
        assert!(!PlanTier::Free.has_premium_access());
        assert!(PlanTier::Premium.has_premium_access());
        assert!(PlanTier::Pro.has_premium_access());
    }

    #[test]
    fn plan_tier_round_trips_through_strings() {
        use std::str::FromStr;

        for tier in [PlanTier::Free, PlanTier::Premium, PlanTier::Pro] {
            assert_eq!(PlanTier::from_str(&tier.to_string()).unwrap(), tier);
        }
        assert!(PlanTier::from_str("enterprise").is_err());
    }

    #[test]
    fn reactivation_window_opens_24h_after_deletion() {
        let mut account = Account::new(
            "user@example.com".to_string(),
            "sha256:abc".to_string(),
            vec![],
        );
        assert!(account.reactivation_allowed_at().is_none());

        let deleted_at = Utc::now();
        account.deleted = true;
        account.deleted_at = Some(deleted_at);

        assert_eq!(
            account.reactivation_allowed_at(),
            Some(deleted_at + chrono::Duration::hours(24))
        );
    }
}
