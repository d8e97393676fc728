use crate::api::pagination;
use crate::api::{
    error_response, storage_error_response, success_paginated_response, success_response,
};
use crate::identity::UserId;
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitewatch_common::id::next_id;
use sitewatch_common::types::{AlertStatus, Location, Severity};
use sitewatch_notify::EventKind;
use sitewatch_storage::store::{AlertFilter, AlertRow, ResponseRow};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Alert details
#[derive(Serialize, ToSchema)]
pub struct AlertResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: AlertStatus,
    /// Producer of the alert (`detector`, `api`, ...)
    pub source: String,
    pub location: Option<Location>,
    pub site_id: Option<String>,
    /// Rule that fired, possibly deleted since
    pub rule_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// One status-transition audit record
#[derive(Serialize, ToSchema)]
pub struct ResponseRecord {
    pub id: String,
    pub alert_id: String,
    /// Status the alert was moved to
    pub action: AlertStatus,
    /// Who performed the transition
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Alert plus its full response history, oldest first
#[derive(Serialize, ToSchema)]
pub struct AlertDetailResponse {
    #[serde(flatten)]
    pub alert: AlertResponse,
    pub responses: Vec<ResponseRecord>,
}

fn to_response(a: AlertRow) -> AlertResponse {
    AlertResponse {
        id: a.id,
        title: a.title,
        description: a.description,
        severity: a.severity,
        status: a.status,
        source: a.source,
        location: a.location,
        site_id: a.site_id,
        rule_id: a.rule_id,
        created_at: a.created_at,
        updated_at: a.updated_at,
        resolved_at: a.resolved_at,
    }
}

fn to_record(r: ResponseRow) -> ResponseRecord {
    ResponseRecord {
        id: r.id,
        alert_id: r.alert_id,
        action: r.action,
        user_id: r.user_id,
        created_at: r.created_at,
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAlertRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// LOW / MEDIUM / HIGH / CRITICAL
    pub severity: Option<String>,
    /// Defaults to `api`
    pub source: Option<String>,
    pub location: Option<Location>,
    pub site_id: Option<String>,
    pub rule_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionRequest {
    /// Target status: ACKNOWLEDGED / ESCALATED / RESOLVED
    pub status: String,
}

/// Alert list query parameters
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct ListAlertsParams {
    /// Substring match against title or description
    #[param(required = false)]
    search: Option<String>,
    /// Severity exact match
    #[param(required = false, rename = "severity__eq")]
    #[serde(rename = "severity__eq")]
    severity_eq: Option<String>,
    /// Status exact match
    #[param(required = false, rename = "status__eq")]
    #[serde(rename = "status__eq")]
    status_eq: Option<String>,
    /// Site exact match
    #[param(required = false, rename = "site_id__eq")]
    #[serde(rename = "site_id__eq")]
    site_id_eq: Option<String>,
    /// Source rule exact match
    #[param(required = false, rename = "rule_id__eq")]
    #[serde(rename = "rule_id__eq")]
    rule_id_eq: Option<String>,
    /// Page size (default 20)
    #[param(required = false)]
    #[serde(default, deserialize_with = "crate::api::pagination::deserialize_optional_u64")]
    limit: Option<u64>,
    /// Page start (default 0)
    #[param(required = false)]
    #[serde(default, deserialize_with = "crate::api::pagination::deserialize_optional_u64")]
    offset: Option<u64>,
}

/// List alerts, newest first. Filters compose with AND.
#[utoipa::path(
    get,
    path = "/v1/alerts",
    tag = "Alerts",
    params(ListAlertsParams),
    responses(
        (status = 200, description = "Paginated alert list", body = Vec<AlertResponse>),
        (status = 400, description = "Bad filter value", body = crate::api::ApiError)
    )
)]
async fn list_alerts(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<ListAlertsParams>,
) -> impl IntoResponse {
    let severity_eq = match params.severity_eq.as_deref() {
        None => None,
        Some(s) => match s.parse::<Severity>() {
            Ok(sev) => Some(sev),
            Err(_) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &trace_id,
                    "bad_request",
                    "severity__eq must be one of LOW, MEDIUM, HIGH, CRITICAL",
                )
            }
        },
    };
    let status_eq = match params.status_eq.as_deref() {
        None => None,
        Some(s) => match s.parse::<AlertStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &trace_id,
                    "bad_request",
                    "status__eq must be one of ACTIVE, ACKNOWLEDGED, ESCALATED, RESOLVED",
                )
            }
        },
    };
    let filter = AlertFilter {
        search: params.search,
        severity_eq,
        status_eq,
        site_id_eq: params.site_id_eq,
        rule_id_eq: params.rule_id_eq,
    };
    let limit = pagination::resolve_limit(params.limit);
    let offset = pagination::resolve_offset(params.offset);

    let total = match state.store.count_alerts(&filter).await {
        Ok(c) => c,
        Err(e) => return storage_error_response(&trace_id, &e),
    };
    match state.store.list_alerts(&filter, limit, offset).await {
        Ok(rows) => {
            let items: Vec<AlertResponse> = rows.into_iter().map(to_response).collect();
            success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset)
        }
        Err(e) => storage_error_response(&trace_id, &e),
    }
}

/// Alert details, including the full response history.
#[utoipa::path(
    get,
    path = "/v1/alerts/{id}",
    tag = "Alerts",
    params(("id" = String, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert details", body = AlertDetailResponse),
        (status = 404, description = "Unknown alert", body = crate::api::ApiError)
    )
)]
async fn get_alert(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let alert = match state.store.get_alert_by_id(&id).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                &trace_id,
                "not_found",
                &format!("alert {id} not found"),
            )
        }
        Err(e) => return storage_error_response(&trace_id, &e),
    };
    match state.store.list_alert_responses(&id).await {
        Ok(responses) => success_response(
            StatusCode::OK,
            &trace_id,
            AlertDetailResponse {
                alert: to_response(alert),
                responses: responses.into_iter().map(to_record).collect(),
            },
        ),
        Err(e) => storage_error_response(&trace_id, &e),
    }
}

/// Record a new alert occurrence. New alerts start ACTIVE and fan out
/// to the notification sinks.
#[utoipa::path(
    post,
    path = "/v1/alerts",
    tag = "Alerts",
    request_body = CreateAlertRequest,
    responses(
        (status = 201, description = "Alert created", body = AlertResponse),
        (status = 422, description = "Validation failed", body = crate::api::ApiError)
    )
)]
async fn create_alert(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<CreateAlertRequest>,
) -> impl IntoResponse {
    let mut errors: Vec<String> = Vec::new();
    if req.title.trim().is_empty() {
        errors.push("title: is required".to_string());
    }
    let severity = match req.severity.as_deref() {
        Some(s) => match s.parse::<Severity>() {
            Ok(sev) => Some(sev),
            Err(_) => {
                errors.push("severity: must be one of LOW, MEDIUM, HIGH, CRITICAL".to_string());
                None
            }
        },
        None => {
            errors.push("severity: is required".to_string());
            None
        }
    };
    let Some(severity) = severity.filter(|_| errors.is_empty()) else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            &trace_id,
            "validation_error",
            &errors.join("; "),
        );
    };

    let now = Utc::now();
    let row = AlertRow {
        id: next_id(),
        title: req.title.trim().to_string(),
        description: req.description,
        severity,
        status: AlertStatus::Active,
        source: req.source.unwrap_or_else(|| "api".to_string()),
        location: req.location,
        site_id: req.site_id,
        rule_id: req.rule_id,
        created_at: now,
        updated_at: now,
        resolved_at: None,
    };
    match state.store.insert_alert(&row).await {
        Ok(row) => {
            state.notify_alert(&row, EventKind::Created);
            success_response(StatusCode::CREATED, &trace_id, to_response(row))
        }
        Err(e) => storage_error_response(&trace_id, &e),
    }
}

/// Move an alert along its status state machine. Appends one immutable
/// response record attributed to the caller; RESOLVED is terminal.
#[utoipa::path(
    patch,
    path = "/v1/alerts/{id}/status",
    tag = "Alerts",
    params(("id" = String, Path, description = "Alert id")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Updated alert with the appended record", body = AlertDetailResponse),
        (status = 400, description = "Unknown status value", body = crate::api::ApiError),
        (status = 404, description = "Unknown alert", body = crate::api::ApiError),
        (status = 409, description = "Transition not allowed", body = crate::api::ApiError)
    )
)]
async fn transition_alert(
    Extension(trace_id): Extension<TraceId>,
    Extension(user_id): Extension<UserId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> impl IntoResponse {
    let to = match req.status.parse::<AlertStatus>() {
        Ok(status) => status,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &trace_id,
                "bad_request",
                "status must be one of ACTIVE, ACKNOWLEDGED, ESCALATED, RESOLVED",
            )
        }
    };

    match state.store.transition_alert(&id, to, &user_id).await {
        Ok((alert, response)) => {
            if alert.status == AlertStatus::Escalated {
                state.notify_alert(&alert, EventKind::Escalated);
            }
            success_response(
                StatusCode::OK,
                &trace_id,
                AlertDetailResponse {
                    alert: to_response(alert),
                    responses: vec![to_record(response)],
                },
            )
        }
        Err(e) => storage_error_response(&trace_id, &e),
    }
}

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_alerts, create_alert))
        .routes(routes!(get_alert))
        .routes(routes!(transition_alert))
}
