use super::http_auth::authenticate;
use super::http_errors::{map_account_error, map_generation_error};
use super::http_parse::{parse_plan_tier, parse_template_kind};
use super::http_types::{
    AccountResponse, CheckAccessResponse, CreateAccountRequest, CreatedAccountResponse,
    GenerateRequest, HealthResponse, RotatedKeyResponse, SubscribeRequest, UsageResponse,
};
use super::state::AppState;
use axum::{
    extract::State,
    http::{header, header::HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use validator::Validate;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/accounts", post(create_account))
        .route("/me", get(get_me))
        .route("/usage", get(get_usage))
        .route("/check-access", get(check_access))
        .route("/generate", post(generate_document))
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
        .route("/account/rotate-key", post(rotate_api_key))
        .route("/account", delete(delete_account))
        .route("/account/reactivate", post(reactivate_account))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        create_account,
        get_me,
        get_usage,
        check_access,
        generate_document,
        subscribe,
        unsubscribe,
        rotate_api_key,
        delete_account,
        reactivate_account,
    ),
    components(
        schemas(
            CreateAccountRequest,
            CreatedAccountResponse,
            GenerateRequest,
            SubscribeRequest,
            UsageResponse,
            AccountResponse,
            CheckAccessResponse,
            RotatedKeyResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Accounts", description = "Account lifecycle and credentials"),
        (name = "Documents", description = "Document generation and access checks"),
        (name = "Billing", description = "Plan changes consumed from the billing system"),
    ),
    info(
        title = "Docmint API",
        version = "0.3.1",
        description = "Multi-tenant document generation with plan-based usage metering",
        license(name = "MIT")
    )
)]
struct ApiDoc;

/// Health check endpoint
///
/// Verifies database connectivity and returns service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").fetch_one(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                error: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "Health check failed: DB connectivity issue");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    error: Some("Database connectivity failed".to_string()),
                }),
            )
        }
    }
}

/// Create a new account
///
/// Issues the account's API key; it is returned here exactly once.
#[utoipa::path(
    post,
    path = "/accounts",
    tag = "Accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = CreatedAccountResponse),
        (status = 400, description = "Invalid email or duplicate account", body = Object),
        (status = 500, description = "Failed to create account", body = Object)
    )
)]
async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    if let Err(errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid email", "details": errors})),
        );
    }

    match state.accounts.signup(req.email).await {
        Ok(issued) => (
            StatusCode::CREATED,
            Json(serde_json::json!(CreatedAccountResponse {
                id: issued.account.id,
                api_key: issued.api_key,
            })),
        ),
        Err(e) => {
            let (status, body) = map_account_error(&e);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!(error = %e, "Failed to create account");
            }
            (status, Json(body))
        }
    }
}

/// Account details for the authenticated caller
#[utoipa::path(
    get,
    path = "/me",
    tag = "Accounts",
    responses(
        (status = 200, description = "Account details", body = AccountResponse),
        (status = 403, description = "Missing or invalid API key", body = Object)
    ),
    security(("api_key" = []))
)]
async fn get_me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let account = match authenticate(state.account_repo.as_ref(), &headers, false).await {
        Ok(a) => a,
        Err(rejection) => return rejection.into_response(),
    };

    let api_key = match state.accounts.decrypted_api_key(&account) {
        Ok(key) => key,
        Err(e) => {
            error!(account_id = %account.id, error = %e, "Failed to decrypt API key");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Error fetching user details"})),
            )
                .into_response();
        }
    };

    let access_type = state.documents.check_access(&account).to_string();
    (
        StatusCode::OK,
        Json(serde_json::json!(AccountResponse {
            id: account.id,
            email: account.email,
            api_key,
            usage_count: account.usage_count,
            max_usage: account.max_usage,
            preview_count: account.preview_count,
            plan: account.plan.to_string(),
            access_type,
        })),
    )
        .into_response()
}

/// Current usage counters
#[utoipa::path(
    get,
    path = "/usage",
    tag = "Accounts",
    responses(
        (status = 200, description = "Usage counters", body = UsageResponse),
        (status = 403, description = "Missing or invalid API key", body = Object)
    ),
    security(("api_key" = []))
)]
async fn get_usage(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match authenticate(state.account_repo.as_ref(), &headers, false).await {
        Ok(account) => (
            StatusCode::OK,
            Json(serde_json::json!(UsageResponse {
                email: account.email,
                usage_count: account.usage_count,
                max_usage: account.max_usage,
                preview_count: account.preview_count,
                plan: account.plan.to_string(),
            })),
        )
            .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

/// Access level the caller would be served under
///
/// Reflects the operator plan override when one is configured.
#[utoipa::path(
    get,
    path = "/check-access",
    tag = "Documents",
    responses(
        (status = 200, description = "Access level", body = CheckAccessResponse),
        (status = 403, description = "Missing or invalid API key", body = Object)
    ),
    security(("api_key" = []))
)]
async fn check_access(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match authenticate(state.account_repo.as_ref(), &headers, false).await {
        Ok(account) => (
            StatusCode::OK,
            Json(serde_json::json!(CheckAccessResponse {
                access_type: state.documents.check_access(&account).to_string(),
            })),
        )
            .into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

/// Generate a document
///
/// Renders the submitted data through the selected template and meters the
/// result against the caller's plan. Successful responses are the PDF bytes;
/// previews are served inline, downloads as attachments.
#[utoipa::path(
    post,
    path = "/generate",
    tag = "Documents",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "PDF artifact", content_type = "application/pdf"),
        (status = 400, description = "Unknown template or invalid data", body = Object),
        (status = 403, description = "Quota exceeded or unauthenticated", body = Object),
        (status = 404, description = "Account not found", body = Object),
        (status = 500, description = "Render failure", body = Object)
    ),
    security(("api_key" = []))
)]
async fn generate_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<GenerateRequest>,
) -> Response {
    let account = match authenticate(state.account_repo.as_ref(), &headers, false).await {
        Ok(a) => a,
        Err(rejection) => return rejection.into_response(),
    };

    let template = match parse_template_kind(&req.template) {
        Some(t) => t,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Template not found",
                    "allowed": ["invoice", "recipe", "order"]
                })),
            )
                .into_response();
        }
    };

    match state
        .documents
        .generate(&account, template, &req.data, req.is_preview)
        .await
    {
        Ok(doc) => {
            let disposition = if doc.intent.is_preview() {
                format!("inline; filename={}", doc.filename)
            } else {
                format!("attachment; filename={}", doc.filename)
            };

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                doc.bytes,
            )
                .into_response()
        }
        Err(e) => {
            let (status, body) = map_generation_error(&e);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!(
                    account_id = %account.id,
                    template = %req.template,
                    error = %e,
                    "Document generation failed"
                );
            }
            (status, Json(body)).into_response()
        }
    }
}

/// Apply a subscription upgrade
///
/// Consumes a plan-change event from the billing system; the service itself
/// never originates plan transitions.
#[utoipa::path(
    post,
    path = "/subscribe",
    tag = "Billing",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Plan updated", body = Object),
        (status = 400, description = "Invalid plan", body = Object),
        (status = 403, description = "Missing or invalid API key", body = Object)
    ),
    security(("api_key" = []))
)]
async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubscribeRequest>,
) -> Response {
    let account = match authenticate(state.account_repo.as_ref(), &headers, false).await {
        Ok(a) => a,
        Err(rejection) => return rejection.into_response(),
    };

    let plan = match parse_plan_tier(&req.plan) {
        Some(p) => p,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Invalid subscription plan",
                    "allowed": ["premium", "pro"]
                })),
            )
                .into_response();
        }
    };

    match state.accounts.subscribe(account.id, plan).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "Subscription upgraded!"})),
        )
            .into_response(),
        Err(e) => {
            let (status, body) = map_account_error(&e);
            (status, Json(body)).into_response()
        }
    }
}

/// Downgrade to the free plan
#[utoipa::path(
    post,
    path = "/unsubscribe",
    tag = "Billing",
    responses(
        (status = 200, description = "Plan downgraded", body = Object),
        (status = 403, description = "Missing or invalid API key", body = Object)
    ),
    security(("api_key" = []))
)]
async fn unsubscribe(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let account = match authenticate(state.account_repo.as_ref(), &headers, false).await {
        Ok(a) => a,
        Err(rejection) => return rejection.into_response(),
    };

    match state.accounts.unsubscribe(account.id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "Subscription downgraded to free!"})),
        )
            .into_response(),
        Err(e) => {
            let (status, body) = map_account_error(&e);
            (status, Json(body)).into_response()
        }
    }
}

/// Rotate the caller's API key
///
/// The previous key stops working immediately; the new key is returned once.
#[utoipa::path(
    post,
    path = "/account/rotate-key",
    tag = "Accounts",
    responses(
        (status = 200, description = "New API key", body = RotatedKeyResponse),
        (status = 403, description = "Missing or invalid API key", body = Object)
    ),
    security(("api_key" = []))
)]
async fn rotate_api_key(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let account = match authenticate(state.account_repo.as_ref(), &headers, false).await {
        Ok(a) => a,
        Err(rejection) => return rejection.into_response(),
    };

    match state.accounts.rotate_api_key(account.id).await {
        Ok(issued) => (
            StatusCode::OK,
            Json(serde_json::json!(RotatedKeyResponse {
                api_key: issued.api_key,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(account_id = %account.id, error = %e, "Failed to rotate API key");
            let (status, body) = map_account_error(&e);
            (status, Json(body)).into_response()
        }
    }
}

/// Soft-delete the caller's account
///
/// The record is retained; the key stops authenticating until reactivation.
#[utoipa::path(
    delete,
    path = "/account",
    tag = "Accounts",
    responses(
        (status = 200, description = "Account deleted", body = Object),
        (status = 403, description = "Missing or invalid API key", body = Object)
    ),
    security(("api_key" = []))
)]
async fn delete_account(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let account = match authenticate(state.account_repo.as_ref(), &headers, false).await {
        Ok(a) => a,
        Err(rejection) => return rejection.into_response(),
    };

    match state.accounts.soft_delete(account.id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "User account deleted successfully!"})),
        )
            .into_response(),
        Err(e) => {
            let (status, body) = map_account_error(&e);
            (status, Json(body)).into_response()
        }
    }
}

/// Reactivate a soft-deleted account
///
/// Allowed only once the 24h cooldown from deletion has elapsed.
#[utoipa::path(
    post,
    path = "/account/reactivate",
    tag = "Accounts",
    responses(
        (status = 200, description = "Account reactivated", body = Object),
        (status = 400, description = "Account is not deleted", body = Object),
        (status = 403, description = "Cooldown active or invalid API key", body = Object)
    ),
    security(("api_key" = []))
)]
async fn reactivate_account(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let account = match authenticate(state.account_repo.as_ref(), &headers, true).await {
        Ok(a) => a,
        Err(rejection) => return rejection.into_response(),
    };

    match state.accounts.reactivate(&account).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "Account reactivated!"})),
        )
            .into_response(),
        Err(e) => {
            let (status, body) = map_account_error(&e);
            (status, Json(body)).into_response()
        }
    }
}
