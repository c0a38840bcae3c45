use crate::application::{parse_plan_override, AccountService, DocumentService};
use crate::infrastructure::{
    ApiKeyCipher, AppConfig, HttpPdfRenderer, PostgresAccountRepository,
};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

pub type AccountServiceType = AccountService<PostgresAccountRepository>;
pub type DocumentServiceType = DocumentService<PostgresAccountRepository>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub account_repo: Arc<PostgresAccountRepository>,
    pub accounts: Arc<AccountServiceType>,
    pub documents: Arc<DocumentServiceType>,
}

/// Build full state from config + an existing pool.
///
/// Intended for embedding into a larger service that already manages a `PgPool`.
pub async fn build_state_with_pool(
    config: AppConfig,
    pool: PgPool,
    run_migrations: bool,
) -> anyhow::Result<AppState> {
    if run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;
    }

    let cipher = Arc::new(ApiKeyCipher::new(&config.encryption_key).context("init API key cipher")?);

    let renderer = Arc::new(
        HttpPdfRenderer::new(
            config.renderer_url,
            Duration::from_secs(config.renderer_timeout_secs),
        )
        .context("init PDF renderer client")?,
    );

    let forced_plan = parse_plan_override(&config.forced_plan);

    let account_repo = Arc::new(PostgresAccountRepository::new(pool.clone()));

    let accounts = Arc::new(AccountService::new(account_repo.clone(), cipher));

    let documents = Arc::new(DocumentService::new(
        account_repo.clone(),
        renderer,
        forced_plan,
        config.max_concurrent_renders,
        Duration::from_secs(config.renderer_timeout_secs),
    ));

    Ok(AppState {
        pool,
        account_repo,
        accounts,
        documents,
    })
}

/// Build state for the standalone server.
///
/// Creates the `PgPool`, runs migrations, and wires repositories/services.
pub async fn build_state_from_env(config: AppConfig) -> anyhow::Result<AppState> {
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("connect database")?;
    build_state_with_pool(config, pool, true).await
}
