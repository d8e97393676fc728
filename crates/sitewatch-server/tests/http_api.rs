mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

use common::{
    alert_body, assert_err_envelope, assert_ok_envelope, build_test_context,
    build_test_context_with, proximity_rule_body, request_json, request_no_body, sample_draft,
    MockTranslator,
};

#[tokio::test]
async fn health_reports_ok() {
    let ctx = build_test_context().await;
    let (status, body, trace_id) = request_no_body(&ctx.app, "GET", "/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_ok_envelope(&body);
    assert!(trace_id.is_some());
    assert_eq!(body["data"]["storage_status"], "ok");
    assert_eq!(body["data"]["ai_enabled"], false);
}

#[tokio::test]
async fn create_rule_and_fetch_it() {
    let ctx = build_test_context().await;
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules",
        Some("user-1"),
        Some(proximity_rule_body("Forklift proximity")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_ok_envelope(&body);
    assert_eq!(body["data"]["name"], "Forklift proximity");
    assert_eq!(body["data"]["severity"], "HIGH");
    assert_eq!(body["data"]["is_active"], true);
    assert_eq!(body["data"]["source"], "api");
    assert_eq!(body["data"]["condition_text"], "IF forklift > 10ft TO person");

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, body, _) =
        request_no_body(&ctx.app, "GET", &format!("/v1/rules/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["condition"]["type"], "proximity");
}

#[tokio::test]
async fn create_rule_collects_all_validation_errors() {
    let ctx = build_test_context().await;
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules",
        Some("user-1"),
        Some(json!({
            "name": "",
            "severity": "EXTREME",
            "condition": { "type": "proximity", "parameters": { "object1": "forklift" } }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_err_envelope(&body, 1101);
    let msg = body["err_msg"].as_str().unwrap();
    assert!(msg.contains("name: is required"));
    assert!(msg.contains("description: is required"));
    assert!(msg.contains("severity: must be one of"));
    assert!(msg.contains("condition.object2: is required"));
    assert!(msg.contains("condition.unit: is required"));
}

#[tokio::test]
async fn mutations_require_identity() {
    let ctx = build_test_context().await;
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules",
        None,
        Some(proximity_rule_body("No identity")),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_err_envelope(&body, 1002);

    // reads stay open
    let (status, _, _) = request_no_body(&ctx.app, "GET", "/v1/rules", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_rule_name_conflicts() {
    let ctx = build_test_context().await;
    let body = proximity_rule_body("Twice");
    let (status, _, _) =
        request_json(&ctx.app, "POST", "/v1/rules", Some("user-1"), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, resp, _) =
        request_json(&ctx.app, "POST", "/v1/rules", Some("user-1"), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_err_envelope(&resp, 1005);
}

#[tokio::test]
async fn list_rules_filters_and_paginates() {
    let ctx = build_test_context().await;
    for name in ["Rule A", "Rule B", "Rule C"] {
        let (status, _, _) = request_json(
            &ctx.app,
            "POST",
            "/v1/rules",
            Some("user-1"),
            Some(proximity_rule_body(name)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body, _) =
        request_no_body(&ctx.app, "GET", "/v1/rules?limit=2&offset=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_ok_envelope(&body);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["limit"], 2);
    assert_eq!(body["data"]["offset"], 0);

    let (status, body, _) =
        request_no_body(&ctx.app, "GET", "/v1/rules?search=rule+b", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Rule B");

    let (status, body, _) =
        request_no_body(&ctx.app, "GET", "/v1/rules?severity__eq=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_err_envelope(&body, 1001);
}

#[tokio::test]
async fn update_rule_is_partial() {
    let ctx = build_test_context().await;
    let (_, created, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules",
        Some("user-1"),
        Some(proximity_rule_body("Patchable")),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body, _) = request_json(
        &ctx.app,
        "PATCH",
        &format!("/v1/rules/{id}"),
        Some("user-1"),
        Some(json!({ "severity": "LOW", "description": "relaxed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["severity"], "LOW");
    assert_eq!(body["data"]["description"], "relaxed");
    assert_eq!(body["data"]["name"], "Patchable");

    let (status, body, _) = request_json(
        &ctx.app,
        "PATCH",
        &format!("/v1/rules/{id}"),
        Some("user-1"),
        Some(json!({ "severity": "EXTREME" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_err_envelope(&body, 1101);

    let (status, body, _) = request_json(
        &ctx.app,
        "PATCH",
        &format!("/v1/rules/{id}"),
        Some("user-1"),
        Some(json!({ "description": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["err_msg"]
        .as_str()
        .unwrap()
        .contains("description: is required"));
}

#[tokio::test]
async fn set_active_and_delete_rule() {
    let ctx = build_test_context().await;
    let (_, created, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules",
        Some("user-1"),
        Some(proximity_rule_body("Toggleable")),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body, _) = request_json(
        &ctx.app,
        "PUT",
        &format!("/v1/rules/{id}/active"),
        Some("user-1"),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, body, _) =
        request_no_body(&ctx.app, "DELETE", &format!("/v1/rules/{id}"), Some("user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_ok_envelope(&body);

    let (status, body, _) =
        request_no_body(&ctx.app, "GET", &format!("/v1/rules/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_err_envelope(&body, 1004);
}

#[tokio::test]
async fn create_alert_and_read_detail() {
    let ctx = build_test_context().await;
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/alerts",
        Some("user-1"),
        Some(alert_body("Forklift too close", "HIGH")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_ok_envelope(&body);
    assert_eq!(body["data"]["status"], "ACTIVE");
    assert_eq!(body["data"]["location"]["x"], 10.5);
    assert!(body["data"]["resolved_at"].is_null());

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, body, _) =
        request_no_body(&ctx.app, "GET", &format!("/v1/alerts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["responses"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_alert_requires_severity() {
    let ctx = build_test_context().await;
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/alerts",
        Some("user-1"),
        Some(json!({ "title": "No severity" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_err_envelope(&body, 1101);
}

#[tokio::test]
async fn alert_transition_flow_builds_audit_trail() {
    let ctx = build_test_context().await;
    let (_, created, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/alerts",
        Some("user-1"),
        Some(alert_body("Crowding", "MEDIUM")),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body, _) = request_json(
        &ctx.app,
        "PATCH",
        &format!("/v1/alerts/{id}/status"),
        Some("supervisor-3"),
        Some(json!({ "status": "ACKNOWLEDGED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ACKNOWLEDGED");
    assert_eq!(body["data"]["responses"][0]["action"], "ACKNOWLEDGED");
    assert_eq!(body["data"]["responses"][0]["user_id"], "supervisor-3");

    let (status, body, _) = request_json(
        &ctx.app,
        "PATCH",
        &format!("/v1/alerts/{id}/status"),
        Some("supervisor-3"),
        Some(json!({ "status": "RESOLVED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "RESOLVED");
    assert!(!body["data"]["resolved_at"].is_null());

    // full history on the detail endpoint
    let (_, body, _) = request_no_body(&ctx.app, "GET", &format!("/v1/alerts/{id}"), None).await;
    let history = body["data"]["responses"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["action"], "ACKNOWLEDGED");
    assert_eq!(history[1]["action"], "RESOLVED");

    // RESOLVED is terminal
    let (status, body, _) = request_json(
        &ctx.app,
        "PATCH",
        &format!("/v1/alerts/{id}/status"),
        Some("supervisor-3"),
        Some(json!({ "status": "ACKNOWLEDGED" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_err_envelope(&body, 1102);
}

#[tokio::test]
async fn transition_rejects_unknown_and_same_status() {
    let ctx = build_test_context().await;
    let (_, created, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/alerts",
        Some("user-1"),
        Some(alert_body("Speeding", "LOW")),
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body, _) = request_json(
        &ctx.app,
        "PATCH",
        &format!("/v1/alerts/{id}/status"),
        Some("user-1"),
        Some(json!({ "status": "SNOOZED" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_err_envelope(&body, 1001);

    let (status, body, _) = request_json(
        &ctx.app,
        "PATCH",
        &format!("/v1/alerts/{id}/status"),
        Some("user-1"),
        Some(json!({ "status": "ACTIVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_err_envelope(&body, 1102);
}

#[tokio::test]
async fn list_alerts_filters_compose() {
    let ctx = build_test_context().await;
    for (title, severity) in [("Forklift near dock", "HIGH"), ("Missing hard hat", "LOW")] {
        let (status, _, _) = request_json(
            &ctx.app,
            "POST",
            "/v1/alerts",
            Some("user-1"),
            Some(alert_body(title, severity)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body, _) = request_no_body(
        &ctx.app,
        "GET",
        "/v1/alerts?severity__eq=HIGH&status__eq=ACTIVE&site_id__eq=site-1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Forklift near dock");

    let (status, body, _) =
        request_no_body(&ctx.app, "GET", "/v1/alerts?search=FORKLIFT", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn generate_rule_via_translator() {
    let ctx =
        build_test_context_with(Some(Arc::new(MockTranslator::Fixed(sample_draft())))).await;
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules/generate",
        Some("user-1"),
        Some(json!({ "text": "alert when a forklift is within 10 feet of a worker" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_ok_envelope(&body);
    assert_eq!(body["data"]["name"], "Forklift proximity");
    assert_eq!(body["data"]["source"], "ai");
    assert_eq!(body["data"]["severity"], "HIGH");
    assert_eq!(body["data"]["condition_text"], "IF forklift < 10ft TO person");
}

#[tokio::test]
async fn generate_rule_surfaces_generic_failure() {
    let ctx = build_test_context_with(Some(Arc::new(MockTranslator::Failing))).await;
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules/generate",
        Some("user-1"),
        Some(json!({ "text": "anything" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_err_envelope(&body, 1103);
}

#[tokio::test]
async fn generate_rule_rejects_invalid_draft_without_writing() {
    let mut draft = sample_draft();
    draft.severity = "EXTREME".to_string();
    let ctx = build_test_context_with(Some(Arc::new(MockTranslator::Fixed(draft)))).await;

    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules/generate",
        Some("user-1"),
        Some(json!({ "text": "anything" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_err_envelope(&body, 1103);

    let (_, body, _) = request_no_body(&ctx.app, "GET", "/v1/rules", None).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn generate_rule_without_provider_is_rejected() {
    let ctx = build_test_context().await;
    let (status, body, _) = request_json(
        &ctx.app,
        "POST",
        "/v1/rules/generate",
        Some("user-1"),
        Some(json!({ "text": "anything" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_err_envelope(&body, 1001);
}
