//! HTML template functions for the supported document kinds.
//!
//! Each kind has a basic and a premium variant; the content gate decides
//! which fields survive into the markup and whether the preview watermark is
//! injected. Markup is deliberately self-contained (inline CSS) since the
//! renderer sidecar sees nothing but this string.

pub mod invoice;
pub mod order;
pub mod recipe;

use crate::application::quota::ContentGate;
use crate::domain::TemplateKind;
use thiserror::Error;
use validator::Validate;

pub use invoice::{InvoiceData, InvoiceItem};
pub use order::{OrderCustomer, OrderData, OrderProduct};
pub use recipe::RecipeData;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Invalid template data: {0}")]
    InvalidData(String),
}

/// Build the full HTML page for a render request.
///
/// Premium-only fields are stripped before the template ever sees them, so a
/// non-premium render cannot leak gated content into the artifact.
pub fn render_html(
    kind: TemplateKind,
    data: &serde_json::Value,
    gate: &ContentGate,
) -> Result<String, TemplateError> {
    let body = match kind {
        TemplateKind::Invoice => {
            let mut invoice: InvoiceData = serde_json::from_value(data.clone())
                .map_err(|e| TemplateError::InvalidData(e.to_string()))?;
            invoice
                .validate()
                .map_err(|e| TemplateError::InvalidData(e.to_string()))?;
            if !gate.premium_enabled {
                invoice.strip_premium_fields();
            }
            invoice::render(&invoice, gate.premium_enabled)
        }
        TemplateKind::Recipe => {
            let mut recipe: RecipeData = serde_json::from_value(data.clone())
                .map_err(|e| TemplateError::InvalidData(e.to_string()))?;
            recipe
                .validate()
                .map_err(|e| TemplateError::InvalidData(e.to_string()))?;
            if !gate.premium_enabled {
                recipe.strip_premium_fields();
            }
            recipe::render(&recipe, gate.premium_enabled)
        }
        TemplateKind::Order => {
            let order: OrderData = serde_json::from_value(data.clone())
                .map_err(|e| TemplateError::InvalidData(e.to_string()))?;
            order
                .validate()
                .map_err(|e| TemplateError::InvalidData(e.to_string()))?;
            // No premium-only inputs to strip; the variant split handles branding.
            order::render(&order, gate.premium_enabled)
        }
    };

    Ok(wrap_page(&body, gate))
}

/// Minimal HTML text escaping for interpolated user fields.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const WATERMARK_TEXT: &str = "PREVIEW ONLY - NOT FOR DISTRIBUTION";

fn wrap_page(body: &str, gate: &ContentGate) -> String {
    let watermark_css = if gate.watermark {
        r#"
          .watermark {
            position: fixed;
            top: 50%;
            left: 50%;
            transform: translate(-50%, -50%) rotate(-45deg);
            font-size: 5rem;
            color: rgba(255, 0, 0, 0.1);
            user-select: none;
            pointer-events: none;
            z-index: 9999;
            white-space: nowrap;
            font-weight: bold;
          }
        "#
    } else {
        ""
    };

    let watermark_div = if gate.watermark {
        format!(r#"<div class="watermark">{}</div>"#, WATERMARK_TEXT)
    } else {
        String::new()
    };

    format!(
        r#"<html>
  <head>
    <meta charset="UTF-8" />
    <style>
      body {{
        font-family: 'Arial', sans-serif;
        padding: 40px;
        color: #333;
        margin: 0;
        box-sizing: border-box;
      }}
      .section {{
        margin-bottom: 20px;
        background-color: #ffffff;
        padding: 20px;
        border-radius: 8px;
      }}
      {watermark_css}
    </style>
  </head>
  <body>
    {watermark_div}
    <div class="content">
      {body}
    </div>
  </body>
</html>"#
    )
}
