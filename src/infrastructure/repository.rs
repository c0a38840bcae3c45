use crate::domain::{Account, PlanTier, UsageSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    #[must_use]
    async fn create(&self, account: &Account) -> Result<(), RepositoryError>;
    #[must_use]
    async fn get_by_id(&self, id: Uuid) -> Result<Account, RepositoryError>;
    #[must_use]
    async fn get_by_email(&self, email: &str) -> Result<Account, RepositoryError>;
    #[must_use]
    async fn get_by_api_key_hash(&self, hash: &str) -> Result<Account, RepositoryError>;
    #[must_use]
    async fn update_plan(
        &self,
        id: Uuid,
        plan: PlanTier,
        max_usage: i32,
    ) -> Result<(), RepositoryError>;
    #[must_use]
    async fn update_api_key(
        &self,
        id: Uuid,
        hash: &str,
        encrypted: &[u8],
    ) -> Result<(), RepositoryError>;
    /// Version-guarded counter commit. Writes the snapshot and bumps the
    /// version only if the stored version still equals `expected_version`;
    /// returns whether the write won. This is the only write path for the
    /// usage counters.
    #[must_use]
    async fn commit_counters(
        &self,
        id: Uuid,
        expected_version: i64,
        counters: &UsageSnapshot,
    ) -> Result<bool, RepositoryError>;
    #[must_use]
    async fn mark_deleted(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError>;
    #[must_use]
    async fn reactivate(&self, id: Uuid) -> Result<(), RepositoryError>;
}

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ACCOUNT_COLUMNS: &str = r#"
    id, email, api_key_hash, api_key_encrypted, plan,
    usage_count, max_usage, preview_count,
    usage_last_reset, preview_last_reset,
    deleted, deleted_at, version, created_at, updated_at
"#;

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: &Account) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, api_key_hash, api_key_encrypted, plan,
                                  usage_count, max_usage, preview_count,
                                  usage_last_reset, preview_last_reset,
                                  deleted, deleted_at, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.api_key_hash)
        .bind(&account.api_key_encrypted)
        .bind(account.plan.to_string())
        .bind(account.usage_count)
        .bind(account.max_usage)
        .bind(account.preview_count)
        .bind(account.usage_last_reset)
        .bind(account.preview_last_reset)
        .bind(account.deleted)
        .bind(account.deleted_at)
        .bind(account.version)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Account, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound(format!("Account {}", id)),
            _ => RepositoryError::DatabaseError(e),
        })?;

        row_to_account(&row)
    }

    async fn get_by_email(&self, email: &str) -> Result<Account, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound(format!("Account {}", email)),
            _ => RepositoryError::DatabaseError(e),
        })?;

        row_to_account(&row)
    }

    async fn get_by_api_key_hash(&self, hash: &str) -> Result<Account, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE api_key_hash = $1"
        ))
        .bind(hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                RepositoryError::NotFound("Account for API key".to_string())
            }
            _ => RepositoryError::DatabaseError(e),
        })?;

        row_to_account(&row)
    }

    async fn update_plan(
        &self,
        id: Uuid,
        plan: PlanTier,
        max_usage: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET plan = $1, max_usage = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(plan.to_string())
        .bind(max_usage)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_api_key(
        &self,
        id: Uuid,
        hash: &str,
        encrypted: &[u8],
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET api_key_hash = $1, api_key_encrypted = $2, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(hash)
        .bind(encrypted)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn commit_counters(
        &self,
        id: Uuid,
        expected_version: i64,
        counters: &UsageSnapshot,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET usage_count = $1, max_usage = $2, preview_count = $3,
                usage_last_reset = $4, preview_last_reset = $5,
                version = version + 1, updated_at = $6
            WHERE id = $7 AND version = $8
            "#,
        )
        .bind(counters.usage_count)
        .bind(counters.max_usage)
        .bind(counters.preview_count)
        .bind(counters.usage_last_reset)
        .bind(counters.preview_last_reset)
        .bind(Utc::now())
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_deleted(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET deleted = TRUE, deleted_at = $1, updated_at = $2
            WHERE id = $3
            "#,
        )
        .bind(at)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reactivate(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET deleted = FALSE, deleted_at = NULL, updated_at = $1
            WHERE id = $2
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_account(row: &sqlx::postgres::PgRow) -> Result<Account, RepositoryError> {
    let plan_str: String = row.try_get("plan")?;
    // Unrecognized plans degrade to free rather than failing the request.
    let plan = PlanTier::from_str(&plan_str).unwrap_or_else(|_| {
        warn!(plan = %plan_str, "Unknown plan tier in storage, treating as free");
        PlanTier::Free
    });

    Ok(Account {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        api_key_hash: row.try_get("api_key_hash")?,
        api_key_encrypted: row.try_get("api_key_encrypted")?,
        plan,
        usage_count: row.try_get("usage_count")?,
        max_usage: row.try_get("max_usage")?,
        preview_count: row.try_get("preview_count")?,
        usage_last_reset: row.try_get("usage_last_reset")?,
        preview_last_reset: row.try_get("preview_last_reset")?,
        deleted: row.try_get("deleted")?,
        deleted_at: row.try_get("deleted_at")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
