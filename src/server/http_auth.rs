use crate::domain::Account;
use crate::infrastructure::{hash_api_key, AccountRepository, RepositoryError};
use axum::http::{header, header::HeaderMap, StatusCode};
use axum::Json;

pub(super) fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

pub(super) type AuthRejection = (StatusCode, Json<serde_json::Value>);

/// Resolve the caller's account from its bearer API key.
///
/// `allow_deleted` is only set by the reactivation endpoint; everything else
/// treats a soft-deleted account as absent. Failures say nothing about
/// whether the key exists.
pub(super) async fn authenticate<R>(
    repo: &R,
    headers: &HeaderMap,
    allow_deleted: bool,
) -> Result<Account, AuthRejection>
where
    R: AccountRepository,
{
    let api_key = extract_bearer_token(headers).ok_or_else(|| {
        (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": "API key not provided"})),
        )
    })?;

    let account = repo
        .get_by_api_key_hash(&hash_api_key(api_key))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound(_) => (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({"error": "User not found or API key is invalid"})),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Internal server error"})),
            ),
        })?;

    if account.deleted && !allow_deleted {
        return Err((
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": "User not found or inactive"})),
        ));
    }

    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extract_bearer_token_happy_path() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn extract_bearer_token_rejects_missing_or_empty() {
        let headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers2 = HeaderMap::new();
        headers2.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers2), None);
    }

    #[test]
    fn extract_bearer_token_rejects_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
