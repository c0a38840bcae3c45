//! Account lifecycle: signup, key rotation, plan changes consumed from the
//! billing collaborator, soft delete and cooldown-gated reactivation.

use crate::domain::{Account, PlanTier};
use crate::infrastructure::{
    generate_api_key, hash_api_key, AccountRepository, ApiKeyCipher, EncryptionError,
    RepositoryError,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),
    #[error("Account already exists")]
    AlreadyExists,
    #[error("Account is not deleted")]
    NotDeleted,
    #[error("Account cannot be reactivated before {0}")]
    CooldownActive(DateTime<Utc>),
    #[error("Plan change to {0} is not a subscription")]
    NotASubscription(PlanTier),
}

/// Result of signup or key rotation; the plaintext key leaves the service
/// exactly once, here.
pub struct IssuedCredential {
    pub account: Account,
    pub api_key: String,
}

pub struct AccountService<R>
where
    R: AccountRepository,
{
    repo: Arc<R>,
    cipher: Arc<ApiKeyCipher>,
}

impl<R> AccountService<R>
where
    R: AccountRepository,
{
    pub fn new(repo: Arc<R>, cipher: Arc<ApiKeyCipher>) -> Self {
        Self { repo, cipher }
    }

    pub async fn signup(&self, email: String) -> Result<IssuedCredential, AccountError> {
        match self.repo.get_by_email(&email).await {
            Ok(_) => return Err(AccountError::AlreadyExists),
            Err(RepositoryError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let api_key = generate_api_key();
        let account = Account::new(
            email,
            hash_api_key(&api_key),
            self.cipher.encrypt(&api_key)?,
        );

        self.repo.create(&account).await?;
        info!(account_id = %account.id, "Created account");

        Ok(IssuedCredential { account, api_key })
    }

    pub async fn rotate_api_key(&self, account_id: Uuid) -> Result<IssuedCredential, AccountError> {
        let account = self.repo.get_by_id(account_id).await?;

        let api_key = generate_api_key();
        let hash = hash_api_key(&api_key);
        let encrypted = self.cipher.encrypt(&api_key)?;

        self.repo.update_api_key(account.id, &hash, &encrypted).await?;
        info!(account_id = %account.id, "Rotated API key");

        Ok(IssuedCredential { account, api_key })
    }

    /// Plaintext key for `/me`, recovered from the stored ciphertext.
    pub fn decrypted_api_key(&self, account: &Account) -> Result<String, AccountError> {
        Ok(self.cipher.decrypt(&account.api_key_encrypted)?)
    }

    /// Consume a plan-change event from the billing collaborator. The core
    /// never originates these.
    pub async fn subscribe(&self, account_id: Uuid, plan: PlanTier) -> Result<(), AccountError> {
        if !plan.has_premium_access() {
            return Err(AccountError::NotASubscription(plan));
        }

        self.repo
            .update_plan(account_id, plan, plan.default_max_usage())
            .await?;
        info!(account_id = %account_id, %plan, "Subscription upgraded");
        Ok(())
    }

    pub async fn unsubscribe(&self, account_id: Uuid) -> Result<(), AccountError> {
        self.repo
            .update_plan(
                account_id,
                PlanTier::Free,
                PlanTier::Free.default_max_usage(),
            )
            .await?;
        info!(account_id = %account_id, "Subscription downgraded to free");
        Ok(())
    }

    /// Soft delete. The row is retained; the auth path stops accepting the
    /// account's key.
    pub async fn soft_delete(&self, account_id: Uuid) -> Result<(), AccountError> {
        self.repo.mark_deleted(account_id, Utc::now()).await?;
        info!(account_id = %account_id, "Account soft-deleted");
        Ok(())
    }

    /// Reactivate a soft-deleted account once the cooldown has elapsed.
    pub async fn reactivate(&self, account: &Account) -> Result<(), AccountError> {
        if !account.deleted {
            return Err(AccountError::NotDeleted);
        }

        if let Some(allowed_at) = account.reactivation_allowed_at() {
            if Utc::now() < allowed_at {
                return Err(AccountError::CooldownActive(allowed_at));
            }
        }

        self.repo.reactivate(account.id).await?;
        info!(account_id = %account.id, "Account reactivated");
        Ok(())
    }
}
