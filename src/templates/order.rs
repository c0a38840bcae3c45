use super::escape;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    #[validate(length(min = 1))]
    pub shop_name: String,
    pub customer: OrderCustomer,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[validate(length(min = 1))]
    pub products: Vec<OrderProduct>,
    pub total: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderProduct {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub price: String,
}

fn default_quantity() -> i32 {
    1
}

pub fn render(data: &OrderData, premium: bool) -> String {
    // Unlike the other kinds, the order template has no premium-only inputs;
    // basic renders carry the service branding block, premium renders drop it.
    let branding = if premium {
        String::new()
    } else {
        r#"<p class="branding">Generated with Docmint</p>"#.to_string()
    };

    let customer_email = data
        .customer
        .email
        .as_deref()
        .map(|e| format!("<p><strong>Email:</strong> {}</p>", escape(e)))
        .unwrap_or_default();

    let meta = [
        data.order_id
            .as_deref()
            .map(|id| format!("<p><strong>Order ID:</strong> {}</p>", escape(id))),
        data.date
            .as_deref()
            .map(|d| format!("<p><strong>Date:</strong> {}</p>", escape(d))),
    ]
    .into_iter()
    .flatten()
    .collect::<String>();

    let products = data
        .products
        .iter()
        .map(|p| {
            format!(
                "<li>{} (x{}) - {}</li>",
                escape(&p.name),
                p.quantity,
                escape(&p.price)
            )
        })
        .collect::<String>();

    format!(
        r#"{branding}
<h1>Shop Order: {shop}</h1>
<div class="section">
  <p><strong>Customer:</strong> {customer}</p>
  {customer_email}
  {meta}
</div>
<div class="section">
  <h2>Products</h2>
  <ul>{products}</ul>
</div>
<div class="section" style="border-top:2px solid #5e60ce;">
  <p style="font-size:1.2em;font-weight:bold;"><strong>Total:</strong> {total}</p>
</div>"#,
        shop = escape(&data.shop_name),
        customer = escape(&data.customer.name),
        total = escape(&data.total),
    )
}
