use crate::domain::RenderedPdf;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Renderer request failed: {0}")]
    RequestFailed(String),
    #[error("Renderer returned invalid response: {0}")]
    InvalidResponse(String),
    #[error("Render timed out after {0}s")]
    Timeout(u64),
    #[error("Invalid renderer configuration: {0}")]
    InvalidConfig(String),
}

/// The external HTML-to-PDF capability: a black box that takes markup and
/// returns the artifact with its page count. Implementations must not retry;
/// a failed render is fatal for the request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<RenderedPdf, RenderError>;
}

/// Client for the renderer sidecar: `POST {base_url}/render` with the markup,
/// answered by `{"pdf": <base64>, "pages": <n>}`. Page counting stays on the
/// renderer side, where the document structure is known.
pub struct HttpPdfRenderer {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    pdf: String,
    pages: i32,
}

impl HttpPdfRenderer {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, RenderError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                RenderError::InvalidConfig(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl PdfRenderer for HttpPdfRenderer {
    async fn render(&self, html: &str) -> Result<RenderedPdf, RenderError> {
        let body = json!({
            "html": html,
            "format": "A4",
            "print_background": true,
        });

        let resp = self
            .client
            .post(format!("{}/render", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| RenderError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RenderError::RequestFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        let render_response: RenderResponse = resp
            .json()
            .await
            .map_err(|e| RenderError::InvalidResponse(e.to_string()))?;

        if render_response.pages < 1 {
            return Err(RenderError::InvalidResponse(format!(
                "Nonsensical page count: {}",
                render_response.pages
            )));
        }

        let bytes = BASE64
            .decode(&render_response.pdf)
            .map_err(|e| RenderError::InvalidResponse(format!("Bad PDF payload: {}", e)))?;

        Ok(RenderedPdf {
            bytes,
            page_count: render_response.pages,
        })
    }
}
