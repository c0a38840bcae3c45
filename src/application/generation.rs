//! Document generation flow.
//!
//! Sequencing per request: resolve the effective plan, coarse quota
//! precheck, compute the content gate, build HTML, render (bounded by the
//! semaphore and a timeout), then settle the actual page count through the
//! ledger. The render is paid before the final decision on purpose: the
//! page count is the price, and it only exists once the artifact does.

use crate::application::ledger::{LedgerError, UsageLedger};
use crate::application::plan::{access_type, resolve_effective_plan};
use crate::application::quota::{self, Decision, RejectionScope};
use crate::domain::{Account, PlanTier, RenderedPdf, RequestIntent, TemplateKind};
use crate::infrastructure::{AccountRepository, PdfRenderer, RenderError, RepositoryError};
use crate::templates::{self, TemplateError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("{}", .0.user_message())]
    QuotaExceeded(RejectionScope),
}

/// A successfully generated, billed (or free-previewed) artifact.
pub struct GeneratedDocument {
    pub bytes: Vec<u8>,
    pub page_count: i32,
    pub decision: Decision,
    pub intent: RequestIntent,
    pub filename: String,
}

pub struct DocumentService<R>
where
    R: AccountRepository,
{
    ledger: UsageLedger<R>,
    renderer: Arc<dyn PdfRenderer>,
    render_gate: Arc<Semaphore>,
    render_timeout: Duration,
    forced_plan: Option<PlanTier>,
}

impl<R> DocumentService<R>
where
    R: AccountRepository,
{
    pub fn new(
        repo: Arc<R>,
        renderer: Arc<dyn PdfRenderer>,
        forced_plan: Option<PlanTier>,
        max_concurrent_renders: usize,
        render_timeout: Duration,
    ) -> Self {
        Self {
            ledger: UsageLedger::new(repo),
            renderer,
            render_gate: Arc::new(Semaphore::new(max_concurrent_renders.max(1))),
            render_timeout,
            forced_plan,
        }
    }

    /// The access label (`basic`/`premium`) a request would be served under,
    /// override included.
    pub fn check_access(&self, account: &Account) -> &'static str {
        access_type(resolve_effective_plan(account, self.forced_plan))
    }

    pub async fn generate(
        &self,
        account: &Account,
        template: TemplateKind,
        data: &serde_json::Value,
        is_preview: bool,
    ) -> Result<GeneratedDocument, GenerationError> {
        let intent = RequestIntent::from_preview_flag(is_preview);
        let plan = resolve_effective_plan(account, self.forced_plan);

        // Coarse pre-render check on a rolled-over view of the counters; the
        // authoritative decision happens post-render in the ledger.
        let (snapshot, _) = quota::roll_over(&account.usage_snapshot(), Utc::now());
        if let Err(scope) = quota::precheck(plan, intent, &snapshot) {
            info!(
                account_id = %account.id,
                %template,
                "Rejected before rendering: usage already exhausted"
            );
            return Err(GenerationError::QuotaExceeded(scope));
        }

        let gate = quota::content_gate(plan, intent, snapshot.preview_count);
        let html = templates::render_html(template, data, &gate)?;

        let rendered = self.render_bounded(&html, account, template).await?;

        let decision = self
            .ledger
            .settle(account.id, plan, intent, rendered.page_count)
            .await?;

        if let Decision::Rejected { scope } = decision {
            // The artifact is dropped here and never reaches the caller.
            warn!(
                account_id = %account.id,
                %template,
                pages = rendered.page_count,
                "Discarding rendered artifact: over quota"
            );
            return Err(GenerationError::QuotaExceeded(scope));
        }

        let filename = format!("{}_{}.pdf", template, Utc::now().timestamp());
        Ok(GeneratedDocument {
            bytes: rendered.bytes,
            page_count: rendered.page_count,
            decision,
            intent,
            filename,
        })
    }

    async fn render_bounded(
        &self,
        html: &str,
        account: &Account,
        template: TemplateKind,
    ) -> Result<RenderedPdf, GenerationError> {
        // Renders are heavyweight external calls; the semaphore keeps the
        // number in flight bounded. The permit is held for the duration of
        // the call, timeout included.
        let _permit = self
            .render_gate
            .acquire()
            .await
            .map_err(|_| RenderError::RequestFailed("render pool closed".to_string()))?;

        match timeout(self.render_timeout, self.renderer.render(html)).await {
            Ok(Ok(rendered)) => Ok(rendered),
            Ok(Err(e)) => {
                error!(
                    account_id = %account.id,
                    %template,
                    error = %e,
                    "Render failed"
                );
                Err(e.into())
            }
            Err(_) => {
                error!(
                    account_id = %account.id,
                    %template,
                    timeout_secs = self.render_timeout.as_secs(),
                    "Render timed out"
                );
                Err(RenderError::Timeout(self.render_timeout.as_secs()).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UsageSnapshot;
    use crate::infrastructure::MockPdfRenderer;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Single-account in-memory repository for orchestration tests.
    struct StubAccounts {
        account: Mutex<Account>,
    }

    impl StubAccounts {
        fn new(account: Account) -> Self {
            Self {
                account: Mutex::new(account),
            }
        }

        fn current(&self) -> Account {
            self.account.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AccountRepository for StubAccounts {
        async fn create(&self, _account: &Account) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn get_by_id(&self, _id: Uuid) -> Result<Account, RepositoryError> {
            Ok(self.current())
        }

        async fn get_by_email(&self, _email: &str) -> Result<Account, RepositoryError> {
            Ok(self.current())
        }

        async fn get_by_api_key_hash(&self, _hash: &str) -> Result<Account, RepositoryError> {
            Ok(self.current())
        }

        async fn update_plan(
            &self,
            _id: Uuid,
            _plan: PlanTier,
            _max_usage: i32,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn update_api_key(
            &self,
            _id: Uuid,
            _hash: &str,
            _encrypted: &[u8],
        ) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn commit_counters(
            &self,
            _id: Uuid,
            expected_version: i64,
            counters: &UsageSnapshot,
        ) -> Result<bool, RepositoryError> {
            let mut account = self.account.lock().unwrap();
            if account.version != expected_version {
                return Ok(false);
            }
            account.usage_count = counters.usage_count;
            account.max_usage = counters.max_usage;
            account.preview_count = counters.preview_count;
            account.usage_last_reset = counters.usage_last_reset;
            account.preview_last_reset = counters.preview_last_reset;
            account.version += 1;
            Ok(true)
        }

        async fn mark_deleted(&self, _id: Uuid, _at: DateTime<Utc>) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn reactivate(&self, _id: Uuid) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    fn account(usage: i32, max: i32) -> Account {
        let mut account = Account::new(
            "user@example.com".to_string(),
            "sha256:abc".to_string(),
            vec![],
        );
        account.usage_count = usage;
        account.max_usage = max;
        account
    }

    fn invoice_payload() -> serde_json::Value {
        json!({
            "customerName": "Ada Lovelace",
            "items": [{"description": "Widget", "price": "9.99"}],
            "total": "9.99"
        })
    }

    fn service(
        repo: Arc<StubAccounts>,
        renderer: MockPdfRenderer,
        forced_plan: Option<PlanTier>,
    ) -> DocumentService<StubAccounts> {
        DocumentService::new(
            repo,
            Arc::new(renderer),
            forced_plan,
            2,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn exhausted_download_never_reaches_the_renderer() {
        let repo = Arc::new(StubAccounts::new(account(30, 30)));
        let mut renderer = MockPdfRenderer::new();
        renderer.expect_render().times(0);

        let svc = service(repo.clone(), renderer, None);
        let result = svc
            .generate(&repo.current(), TemplateKind::Invoice, &invoice_payload(), false)
            .await;

        assert!(matches!(
            result,
            Err(GenerationError::QuotaExceeded(RejectionScope::Download))
        ));
    }

    #[tokio::test]
    async fn over_cap_render_is_discarded_and_unbilled() {
        let repo = Arc::new(StubAccounts::new(account(29, 30)));
        let mut renderer = MockPdfRenderer::new();
        renderer.expect_render().times(1).returning(|_| {
            Ok(RenderedPdf {
                bytes: vec![0x25, 0x50, 0x44, 0x46],
                page_count: 2,
            })
        });

        let svc = service(repo.clone(), renderer, None);
        let result = svc
            .generate(&repo.current(), TemplateKind::Invoice, &invoice_payload(), false)
            .await;

        assert!(matches!(result, Err(GenerationError::QuotaExceeded(_))));
        assert_eq!(repo.current().usage_count, 29);
    }

    #[tokio::test]
    async fn successful_download_bills_actual_pages() {
        let repo = Arc::new(StubAccounts::new(account(28, 30)));
        let mut renderer = MockPdfRenderer::new();
        renderer.expect_render().times(1).returning(|_| {
            Ok(RenderedPdf {
                bytes: vec![0x25, 0x50, 0x44, 0x46],
                page_count: 2,
            })
        });

        let svc = service(repo.clone(), renderer, None);
        let doc = svc
            .generate(&repo.current(), TemplateKind::Invoice, &invoice_payload(), false)
            .await
            .unwrap();

        assert_eq!(doc.page_count, 2);
        assert_eq!(doc.decision, Decision::Billed { pages: 2 });
        assert_eq!(repo.current().usage_count, 30);
    }

    #[tokio::test]
    async fn forced_plan_lifts_the_cap() {
        let repo = Arc::new(StubAccounts::new(account(30, 30)));
        let mut renderer = MockPdfRenderer::new();
        renderer.expect_render().times(1).returning(|_| {
            Ok(RenderedPdf {
                bytes: vec![1],
                page_count: 4,
            })
        });

        let svc = service(repo.clone(), renderer, Some(PlanTier::Pro));
        assert_eq!(svc.check_access(&repo.current()), "premium");

        let doc = svc
            .generate(&repo.current(), TemplateKind::Invoice, &invoice_payload(), false)
            .await
            .unwrap();
        assert_eq!(doc.decision, Decision::Billed { pages: 4 });
        assert_eq!(repo.current().usage_count, 34);
    }

    #[tokio::test]
    async fn render_failure_is_fatal_and_unbilled() {
        let repo = Arc::new(StubAccounts::new(account(0, 30)));
        let mut renderer = MockPdfRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|_| Err(RenderError::RequestFailed("boom".to_string())));

        let svc = service(repo.clone(), renderer, None);
        let result = svc
            .generate(&repo.current(), TemplateKind::Invoice, &invoice_payload(), false)
            .await;

        assert!(matches!(result, Err(GenerationError::Render(_))));
        assert_eq!(repo.current().usage_count, 0);
    }
}
