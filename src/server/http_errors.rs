use crate::application::{AccountError, GenerationError};
use crate::infrastructure::RepositoryError;
use crate::templates::TemplateError;
use axum::http::StatusCode;

pub(super) fn map_generation_error(err: &GenerationError) -> (StatusCode, serde_json::Value) {
    match err {
        GenerationError::QuotaExceeded(scope) => (
            StatusCode::FORBIDDEN,
            serde_json::json!({ "error": scope.user_message() }),
        ),
        GenerationError::Template(TemplateError::InvalidData(msg)) => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": format!("Invalid template data: {}", msg) }),
        ),
        GenerationError::Repository(RepositoryError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            serde_json::json!({ "error": "User not found" }),
        ),
        // Render failures, ledger contention and storage errors all surface
        // as an opaque 500; details stay in the logs.
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "PDF generation failed" }),
        ),
    }
}

pub(super) fn map_account_error(err: &AccountError) -> (StatusCode, serde_json::Value) {
    match err {
        AccountError::AlreadyExists => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": "User already exists" }),
        ),
        AccountError::NotDeleted => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": "Account is not deleted" }),
        ),
        AccountError::CooldownActive(until) => (
            StatusCode::FORBIDDEN,
            serde_json::json!({
                "error": format!("Account can be reactivated after {}", until.to_rfc3339())
            }),
        ),
        AccountError::NotASubscription(plan) => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": format!("Invalid subscription plan: {}", plan),
                "allowed": ["premium", "pro"]
            }),
        ),
        AccountError::Repository(RepositoryError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            serde_json::json!({ "error": "User not found" }),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": "Server error" }),
        ),
    }
}
