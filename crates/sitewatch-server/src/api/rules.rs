use crate::api::pagination;
use crate::api::{
    error_response, storage_error_response, success_empty_response, success_paginated_response,
    success_response,
};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitewatch_common::id::next_id;
use sitewatch_common::types::{RawCondition, Severity};
use sitewatch_rules::{format_condition_value, validate_condition, validate_rule, FieldError};
use sitewatch_storage::store::{RuleFilter, RuleRow, RuleUpdate};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Alert rule details
#[derive(Serialize, ToSchema)]
pub struct RuleResponse {
    /// Rule id
    pub id: String,
    /// Rule name (unique)
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Structured condition (`{type, parameters}`)
    #[schema(value_type = Object)]
    pub condition: Value,
    /// Canonical condition rendering, e.g. `IF forklift > 10ft TO person`
    pub condition_text: String,
    /// Severity of alerts this rule produces
    pub severity: Severity,
    /// Whether the rule is evaluated
    pub is_active: bool,
    /// Site scope, when limited to one site
    pub site_id: Option<String>,
    /// `api` (manual) or `ai` (translated)
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn to_response(r: RuleRow) -> RuleResponse {
    RuleResponse {
        condition_text: format_condition_value(&r.condition),
        id: r.id,
        name: r.name,
        description: r.description,
        condition: r.condition,
        severity: r.severity,
        is_active: r.is_active,
        site_id: r.site_id,
        source: r.source,
        created_at: r.created_at,
        updated_at: r.updated_at,
    }
}

fn condition_to_value(trace_id: &str, condition: &sitewatch_common::types::Condition) -> Result<Value, Response> {
    serde_json::to_value(condition).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize condition");
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            trace_id,
            "internal_error",
            "Internal error",
        )
    })
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRuleRequest {
    /// Rule name (unique)
    pub name: String,
    /// Free-form description (required non-empty)
    #[serde(default)]
    pub description: String,
    /// LOW / MEDIUM / HIGH / CRITICAL
    pub severity: Option<String>,
    /// Condition draft (`{type, parameters}`)
    pub condition: RawCondition,
    /// Defaults to true
    pub is_active: Option<bool>,
    pub site_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRuleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub condition: Option<RawCondition>,
    pub is_active: Option<bool>,
    pub site_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateRuleRequest {
    /// Plain-language safety requirement
    pub text: String,
}

/// Rule list query parameters
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
struct ListRulesParams {
    /// Substring match against name or description
    #[param(required = false)]
    search: Option<String>,
    /// Severity exact match
    #[param(required = false, rename = "severity__eq")]
    #[serde(rename = "severity__eq")]
    severity_eq: Option<String>,
    /// Active flag exact match
    #[param(required = false, rename = "is_active__eq")]
    #[serde(rename = "is_active__eq")]
    is_active_eq: Option<bool>,
    /// Site exact match
    #[param(required = false, rename = "site_id__eq")]
    #[serde(rename = "site_id__eq")]
    site_id_eq: Option<String>,
    /// Page size (default 20)
    #[param(required = false)]
    #[serde(default, deserialize_with = "crate::api::pagination::deserialize_optional_u64")]
    limit: Option<u64>,
    /// Page start (default 0)
    #[param(required = false)]
    #[serde(default, deserialize_with = "crate::api::pagination::deserialize_optional_u64")]
    offset: Option<u64>,
}

/// List alert rules, newest first.
#[utoipa::path(
    get,
    path = "/v1/rules",
    tag = "Rules",
    params(ListRulesParams),
    responses(
        (status = 200, description = "Paginated rule list", body = Vec<RuleResponse>),
        (status = 400, description = "Bad filter value", body = crate::api::ApiError)
    )
)]
async fn list_rules(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<ListRulesParams>,
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
    let filter = RuleFilter {
        search: params.search,
        severity_eq,
        is_active_eq: params.is_active_eq,
        site_id_eq: params.site_id_eq,
    };
    let limit = pagination::resolve_limit(params.limit);
    let offset = pagination::resolve_offset(params.offset);

    let total = match state.store.count_rules(&filter).await {
        Ok(c) => c,
        Err(e) => return storage_error_response(&trace_id, &e),
    };
    match state.store.list_rules(&filter, limit, offset).await {
        Ok(rows) => {
            let items: Vec<RuleResponse> = rows.into_iter().map(to_response).collect();
            success_paginated_response(StatusCode::OK, &trace_id, items, total, limit, offset)
        }
        Err(e) => storage_error_response(&trace_id, &e),
    }
}

/// Rule details.
#[utoipa::path(
    get,
    path = "/v1/rules/{id}",
    tag = "Rules",
    params(("id" = String, Path, description = "Rule id")),
    responses(
        (status = 200, description = "Rule details", body = RuleResponse),
        (status = 404, description = "Unknown rule", body = crate::api::ApiError)
    )
)]
async fn get_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_rule_by_id(&id).await {
        Ok(Some(row)) => success_response(StatusCode::OK, &trace_id, to_response(row)),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            &format!("alert rule {id} not found"),
        ),
        Err(e) => storage_error_response(&trace_id, &e),
    }
}

/// Create an alert rule. The condition draft is validated against the
/// parameter table; all field errors come back at once.
#[utoipa::path(
    post,
    path = "/v1/rules",
    tag = "Rules",
    request_body = CreateRuleRequest,
    responses(
        (status = 201, description = "Rule created", body = RuleResponse),
        (status = 409, description = "Duplicate name", body = crate::api::ApiError),
        (status = 422, description = "Validation failed", body = crate::api::ApiError)
    )
)]
async fn create_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<CreateRuleRequest>,
) -> impl IntoResponse {
    let (severity, condition) =
        match validate_rule(&req.name, &req.description, req.severity.as_deref(), &req.condition) {
            Ok(v) => v,
            Err(e) => {
                return error_response(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    &trace_id,
                    "validation_error",
                    &e.join(),
                )
            }
        };
    let condition = match condition_to_value(&trace_id, &condition) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let now = Utc::now();
    let row = RuleRow {
        id: next_id(),
        name: req.name.trim().to_string(),
        description: req.description,
        condition,
        severity,
        is_active: req.is_active.unwrap_or(true),
        site_id: req.site_id,
        source: "api".to_string(),
        created_at: now,
        updated_at: now,
    };
    match state.store.insert_rule(&row).await {
        Ok(row) => success_response(StatusCode::CREATED, &trace_id, to_response(row)),
        Err(e) => storage_error_response(&trace_id, &e),
    }
}

/// Partially update a rule. Absent fields keep their stored value.
#[utoipa::path(
    patch,
    path = "/v1/rules/{id}",
    tag = "Rules",
    params(("id" = String, Path, description = "Rule id")),
    request_body = UpdateRuleRequest,
    responses(
        (status = 200, description = "Updated rule", body = RuleResponse),
        (status = 404, description = "Unknown rule", body = crate::api::ApiError),
        (status = 409, description = "Duplicate name", body = crate::api::ApiError),
        (status = 422, description = "Validation failed", body = crate::api::ApiError)
    )
)]
async fn update_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRuleRequest>,
) -> impl IntoResponse {
    let mut errors: Vec<FieldError> = Vec::new();

    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            errors.push(FieldError {
                field: "name".to_string(),
                message: "is required".to_string(),
            });
        }
    }
    if let Some(description) = &req.description {
        if description.trim().is_empty() {
            errors.push(FieldError {
                field: "description".to_string(),
                message: "is required".to_string(),
            });
        }
    }
    let severity = match req.severity.as_deref() {
        None => None,
        Some(s) => match s.parse::<Severity>() {
            Ok(sev) => Some(sev),
            Err(_) => {
                errors.push(FieldError {
                    field: "severity".to_string(),
                    message: "must be one of LOW, MEDIUM, HIGH, CRITICAL".to_string(),
                });
                None
            }
        },
    };
    let condition = match &req.condition {
        None => None,
        Some(raw) => match validate_condition(raw) {
            Ok(cond) => Some(cond),
            Err(mut field_errors) => {
                for e in &mut field_errors {
                    e.field = format!("condition.{}", e.field);
                }
                errors.extend(field_errors);
                None
            }
        },
    };
    if !errors.is_empty() {
        let msg = errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            &trace_id,
            "validation_error",
            &msg,
        );
    }

    let condition = match condition {
        None => None,
        Some(cond) => match condition_to_value(&trace_id, &cond) {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        },
    };
    let update = RuleUpdate {
        name: req.name.map(|n| n.trim().to_string()),
        description: req.description,
        condition,
        severity,
        is_active: req.is_active,
        site_id: req.site_id.map(Some),
    };
    match state.store.update_rule(&id, &update).await {
        Ok(row) => success_response(StatusCode::OK, &trace_id, to_response(row)),
        Err(e) => storage_error_response(&trace_id, &e),
    }
}

/// Enable or disable a rule without touching its definition.
#[utoipa::path(
    put,
    path = "/v1/rules/{id}/active",
    tag = "Rules",
    params(("id" = String, Path, description = "Rule id")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Updated rule", body = RuleResponse),
        (status = 404, description = "Unknown rule", body = crate::api::ApiError)
    )
)]
async fn set_rule_active(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> impl IntoResponse {
    match state.store.set_rule_active(&id, req.is_active).await {
        Ok(row) => success_response(StatusCode::OK, &trace_id, to_response(row)),
        Err(e) => storage_error_response(&trace_id, &e),
    }
}

/// Hard-delete a rule. Alerts it produced keep their `rule_id`.
#[utoipa::path(
    delete,
    path = "/v1/rules/{id}",
    tag = "Rules",
    params(("id" = String, Path, description = "Rule id")),
    responses(
        (status = 200, description = "Rule deleted"),
        (status = 404, description = "Unknown rule", body = crate::api::ApiError)
    )
)]
async fn delete_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_rule(&id).await {
        Ok(()) => success_empty_response(StatusCode::OK, &trace_id, "deleted"),
        Err(e) => storage_error_response(&trace_id, &e),
    }
}

/// Translate a plain-language requirement into a rule and store it.
///
/// Model output goes through the same validation gate as manual input;
/// any provider or validation failure surfaces as one generic error and
/// nothing is written.
#[utoipa::path(
    post,
    path = "/v1/rules/generate",
    tag = "Rules",
    request_body = GenerateRuleRequest,
    responses(
        (status = 201, description = "Generated rule", body = RuleResponse),
        (status = 400, description = "Translation not configured", body = crate::api::ApiError),
        (status = 502, description = "Translation failed", body = crate::api::ApiError)
    )
)]
async fn generate_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<GenerateRuleRequest>,
) -> impl IntoResponse {
    let Some(translator) = &state.translator else {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "AI rule generation is not configured",
        );
    };
    if req.text.trim().is_empty() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            &trace_id,
            "validation_error",
            "text: is required",
        );
    }

    let draft = match translator.translate(req.text.trim()).await {
        Ok(draft) => draft,
        Err(e) => {
            tracing::error!(
                provider = translator.provider(),
                model = translator.model_name(),
                error = %e,
                "Rule translation failed"
            );
            return error_response(
                StatusCode::BAD_GATEWAY,
                &trace_id,
                "translation_error",
                "Could not generate a rule from the description",
            );
        }
    };

    let (severity, condition) = match validate_rule(
        &draft.name,
        &draft.description,
        Some(&draft.severity),
        &draft.to_raw_condition(),
    ) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "Translated rule failed validation");
            return error_response(
                StatusCode::BAD_GATEWAY,
                &trace_id,
                "translation_error",
                "Could not generate a rule from the description",
            );
        }
    };
    let condition = match condition_to_value(&trace_id, &condition) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let now = Utc::now();
    let row = RuleRow {
        id: next_id(),
        name: draft.name.trim().to_string(),
        description: draft.description,
        condition,
        severity,
        is_active: true,
        site_id: None,
        source: "ai".to_string(),
        created_at: now,
        updated_at: now,
    };
    match state.store.insert_rule(&row).await {
        Ok(row) => success_response(StatusCode::CREATED, &trace_id, to_response(row)),
        Err(e) => storage_error_response(&trace_id, &e),
    }
}

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_rules, create_rule))
        .routes(routes!(get_rule, update_rule, delete_rule))
        .routes(routes!(set_rule_active))
        .routes(routes!(generate_rule))
}
