pub mod alerts;
pub mod pagination;
pub mod rules;

use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sitewatch_storage::StorageError;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// API error response
#[derive(Serialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub err_code: i32,
    /// Error message
    pub err_msg: String,
    /// Trace ID (empty string by default)
    pub trace_id: String,
}

/// Unified API response envelope
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// Error code (0 on success)
    pub err_code: i32,
    /// Error message ("success" on success)
    pub err_msg: String,
    /// Trace ID (empty string by default)
    pub trace_id: String,
    /// Payload, when the operation returns one
    pub data: Option<T>,
}

/// Paginated payload
#[derive(Serialize, ToSchema)]
pub struct PaginatedData<T>
where
    T: Serialize,
{
    /// Page of items
    pub items: Vec<T>,
    /// Total matching rows
    pub total: u64,
    /// Page size
    pub limit: usize,
    /// Page start
    pub offset: usize,
}

pub fn success_response<T>(status: StatusCode, trace_id: &str, data: T) -> Response
where
    T: Serialize,
{
    (
        status,
        Json(ApiResponse {
            err_code: 0,
            err_msg: "success".to_string(),
            trace_id: trace_id.to_string(),
            data: Some(data),
        }),
    )
        .into_response()
}

pub fn success_empty_response(status: StatusCode, trace_id: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: 0,
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

pub fn success_paginated_response<T>(
    status: StatusCode,
    trace_id: &str,
    items: Vec<T>,
    total: u64,
    limit: usize,
    offset: usize,
) -> Response
where
    T: Serialize,
{
    success_response(
        status,
        trace_id,
        PaginatedData {
            items,
            total,
            limit,
            offset,
        },
    )
}

fn to_custom_error_code(code: &str) -> i32 {
    match code {
        "bad_request" => 1001,
        "unauthorized" => 1002,
        "not_found" => 1004,
        "conflict" => 1005,
        "validation_error" => 1101,
        "invalid_transition" => 1102,
        "translation_error" => 1103,
        "internal_error" => 1500,
        "storage_error" => 1501,
        _ => 1999,
    }
}

pub fn error_response(status: StatusCode, trace_id: &str, code: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: to_custom_error_code(code),
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

/// Map a storage failure onto the envelope. Expected domain failures
/// keep their message; anything else is logged and reported generically.
pub fn storage_error_response(trace_id: &str, err: &StorageError) -> Response {
    match err {
        StorageError::NotFound { .. } => {
            error_response(StatusCode::NOT_FOUND, trace_id, "not_found", &err.to_string())
        }
        StorageError::Conflict { .. } => {
            error_response(StatusCode::CONFLICT, trace_id, "conflict", &err.to_string())
        }
        StorageError::Transition(e) => error_response(
            StatusCode::CONFLICT,
            trace_id,
            "invalid_transition",
            &e.to_string(),
        ),
        _ => {
            tracing::error!(error = %err, "Storage operation failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                trace_id,
                "storage_error",
                "Database error",
            )
        }
    }
}

/// Health check response
#[derive(Serialize, ToSchema)]
struct HealthResponse {
    /// Service version
    version: String,
    /// Uptime in seconds
    uptime_secs: i64,
    /// Storage status
    storage_status: String,
    /// Whether a translation provider is configured
    ai_enabled: bool,
}

/// Service health.
#[utoipa::path(
    get,
    path = "/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
async fn health(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let uptime = (Utc::now() - state.start_time).num_seconds();
    success_response(
        StatusCode::OK,
        &trace_id,
        HealthResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: uptime,
            storage_status: "ok".to_string(),
            ai_enabled: state.translator.is_some(),
        },
    )
}

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .merge(rules::routes())
        .merge(alerts::routes())
}
