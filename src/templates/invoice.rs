use super::escape;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceData {
    #[validate(length(min = 1))]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[validate(length(min = 1))]
    pub items: Vec<InvoiceItem>,
    #[serde(default)]
    pub subtotal: Option<String>,
    #[serde(default)]
    pub tax: Option<String>,
    pub total: String,

    // Premium-only inputs; stripped by the content gate for basic renders.
    #[serde(default)]
    pub custom_logo_url: Option<String>,
    #[serde(default)]
    pub show_chart: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub price: String,
}

fn default_quantity() -> i32 {
    1
}

impl InvoiceData {
    pub fn strip_premium_fields(&mut self) {
        self.custom_logo_url = None;
        self.show_chart = false;
        self.notes = None;
    }
}

pub fn render(data: &InvoiceData, premium: bool) -> String {
    if premium {
        render_premium(data)
    } else {
        render_basic(data)
    }
}

fn item_rows(items: &[InvoiceItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>${}</td></tr>",
                escape(&item.description),
                item.quantity,
                escape(&item.price)
            )
        })
        .collect()
}

fn render_basic(data: &InvoiceData) -> String {
    let meta = [
        data.order_id
            .as_deref()
            .map(|id| format!("<p><strong>Order ID:</strong> {}</p>", escape(id))),
        data.date
            .as_deref()
            .map(|d| format!("<p><strong>Date:</strong> {}</p>", escape(d))),
        data.customer_email
            .as_deref()
            .map(|e| format!("<p><strong>Email:</strong> {}</p>", escape(e))),
    ]
    .into_iter()
    .flatten()
    .collect::<String>();

    format!(
        r#"<h1>Invoice</h1>
<div class="section">
  <p><strong>Customer:</strong> {customer}</p>
  {meta}
</div>
<table border="1" cellpadding="10" cellspacing="0" width="100%">
  <thead><tr><th>Item</th><th>Qty</th><th>Price</th></tr></thead>
  <tbody>{rows}</tbody>
</table>
<h3>Total: ${total}</h3>"#,
        customer = escape(&data.customer_name),
        rows = item_rows(&data.items),
        total = escape(&data.total),
    )
}

fn render_premium(data: &InvoiceData) -> String {
    let logo = data
        .custom_logo_url
        .as_deref()
        .map(|url| format!(r#"<img class="logo" src="{}" alt="Logo" style="max-width:150px;margin-bottom:20px;" />"#, escape(url)))
        .unwrap_or_default();

    let totals = [
        data.subtotal
            .as_deref()
            .map(|s| format!("<p>Subtotal: ${}</p>", escape(s))),
        data.tax.as_deref().map(|t| format!("<p>Tax: ${}</p>", escape(t))),
    ]
    .into_iter()
    .flatten()
    .collect::<String>();

    let chart = if data.show_chart {
        r#"<div class="section"><h2>Breakdown</h2><canvas id="totals-chart" width="300" height="200"></canvas></div>"#
    } else {
        ""
    };

    let notes = data
        .notes
        .as_deref()
        .map(|n| format!(r#"<div class="section"><h2>Notes</h2><p>{}</p></div>"#, escape(n)))
        .unwrap_or_default();

    format!(
        r#"{logo}
<h1 style="color:#2a3d66;">Invoice</h1>
<div class="section">
  <p><strong>Customer:</strong> {customer}</p>
  {order_meta}
</div>
<table border="1" cellpadding="14" cellspacing="0" width="100%" style="border-collapse:collapse;">
  <thead><tr style="background-color:#dbe7ff;"><th>Item</th><th>Qty</th><th>Price</th></tr></thead>
  <tbody>{rows}</tbody>
</table>
<div class="section" style="text-align:right;">
  {totals}
  <h3>Total: ${total}</h3>
</div>
{chart}
{notes}"#,
        customer = escape(&data.customer_name),
        order_meta = data
            .order_id
            .as_deref()
            .map(|id| format!("<p><strong>Order ID:</strong> {}</p>", escape(id)))
            .unwrap_or_default(),
        rows = item_rows(&data.items),
        total = escape(&data.total),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InvoiceData {
        InvoiceData {
            customer_name: "Ada Lovelace".to_string(),
            customer_email: None,
            order_id: Some("INV-42".to_string()),
            date: None,
            items: vec![InvoiceItem {
                description: "Widget".to_string(),
                quantity: 3,
                price: "4.50".to_string(),
            }],
            subtotal: Some("13.50".to_string()),
            tax: Some("1.35".to_string()),
            total: "14.85".to_string(),
            custom_logo_url: Some("https://example.com/logo.png".to_string()),
            show_chart: true,
            notes: Some("Thanks!".to_string()),
        }
    }

    #[test]
    fn basic_variant_ignores_premium_inputs() {
        let html = render(&sample(), false);
        assert!(html.contains("Ada Lovelace"));
        assert!(html.contains("INV-42"));
        assert!(!html.contains("logo.png"));
        assert!(!html.contains("Breakdown"));
    }

    #[test]
    fn premium_variant_includes_logo_chart_and_notes() {
        let html = render(&sample(), true);
        assert!(html.contains("logo.png"));
        assert!(html.contains("Breakdown"));
        assert!(html.contains("Thanks!"));
        assert!(html.contains("Subtotal: $13.50"));
    }

    #[test]
    fn strip_premium_fields_clears_gated_inputs() {
        let mut data = sample();
        data.strip_premium_fields();
        assert!(data.custom_logo_url.is_none());
        assert!(!data.show_chart);
        assert!(data.notes.is_none());
    }
}
