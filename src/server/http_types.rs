use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, ToSchema)]
pub(super) struct HealthResponse {
    pub(super) status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) error: Option<String>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub(super) struct CreateAccountRequest {
    #[schema(example = "user@example.com")]
    #[validate(email)]
    pub(super) email: String,
}

/// Signup response; the API key is returned exactly once.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreatedAccountResponse {
    pub(super) id: Uuid,
    pub(super) api_key: String,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct GenerateRequest {
    #[schema(example = "invoice")]
    pub(super) template: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub(super) data: serde_json::Value,
    #[serde(default, rename = "isPreview")]
    pub(super) is_preview: bool,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct SubscribeRequest {
    #[schema(example = "premium")]
    pub(super) plan: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(super) struct UsageResponse {
    pub(super) email: String,
    pub(super) usage_count: i32,
    pub(super) max_usage: i32,
    pub(super) preview_count: i32,
    pub(super) plan: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(super) struct AccountResponse {
    pub(super) id: Uuid,
    pub(super) email: String,
    pub(super) api_key: String,
    pub(super) usage_count: i32,
    pub(super) max_usage: i32,
    pub(super) preview_count: i32,
    pub(super) plan: String,
    pub(super) access_type: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(super) struct CheckAccessResponse {
    pub(super) access_type: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(super) struct RotatedKeyResponse {
    pub(super) api_key: String,
}
