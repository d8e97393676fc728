#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use sitewatch_ai::{RuleDraft, RuleTranslator, TranslateError};
use sitewatch_notify::manager::NotificationManager;
use sitewatch_server::app;
use sitewatch_server::config::ServerConfig;
use sitewatch_server::state::AppState;
use sitewatch_storage::SafetyStore;
use std::sync::Arc;
use tower::util::ServiceExt;

pub struct TestContext {
    pub state: AppState,
    pub app: axum::Router,
}

pub async fn build_test_context() -> TestContext {
    build_test_context_with(None).await
}

pub async fn build_test_context_with(translator: Option<Arc<dyn RuleTranslator>>) -> TestContext {
    sitewatch_common::id::init(1, 1);

    let store = Arc::new(
        SafetyStore::new("sqlite::memory:")
            .await
            .expect("in-memory store should initialize"),
    );

    let state = AppState {
        store,
        translator,
        notifier: Arc::new(NotificationManager::new()),
        start_time: Utc::now(),
        config: Arc::new(ServerConfig::default()),
    };

    let app = app::build_http_app(state.clone());
    TestContext { state, app }
}

/// A translator that always returns the same draft, or always fails.
pub enum MockTranslator {
    Fixed(RuleDraft),
    Failing,
}

#[async_trait]
impl RuleTranslator for MockTranslator {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn translate(&self, _text: &str) -> Result<RuleDraft, TranslateError> {
        match self {
            MockTranslator::Fixed(draft) => Ok(draft.clone()),
            MockTranslator::Failing => Err(TranslateError::EmptyResponse),
        }
    }
}

pub fn sample_draft() -> RuleDraft {
    serde_json::from_value(serde_json::json!({
        "name": "Forklift proximity",
        "description": "Forklift within 10 feet of a person",
        "type": "proximity",
        "severity": "HIGH",
        "condition": {
            "object1": "forklift",
            "object2": "person",
            "operator": "<",
            "threshold": 10,
            "unit": "ft"
        }
    }))
    .expect("sample draft should deserialize")
}

pub async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    user_id: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id);
    }
    builder = builder.header("Content-Type", "application/json");

    let req_body = body.unwrap_or(Value::Null).to_string();
    let req = builder
        .body(Body::from(req_body))
        .expect("request should build");

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");

    let status = resp.status();
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, trace_id)
}

pub async fn request_no_body(
    app: &axum::Router,
    method: &str,
    uri: &str,
    user_id: Option<&str>,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id);
    }

    let req = builder.body(Body::empty()).expect("request should build");

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");
    let status = resp.status();
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, trace_id)
}

pub fn assert_ok_envelope(json: &Value) {
    assert_eq!(json["err_code"], 0);
    assert!(json["err_msg"].is_string());
    assert!(json.get("trace_id").is_some());
}

pub fn assert_err_envelope(json: &Value, err_code: i32) {
    assert_eq!(json["err_code"], err_code);
    assert!(json["err_msg"].is_string());
    assert!(json.get("trace_id").is_some());
    assert!(json.get("data").is_some());
    assert!(json["data"].is_null());
}

pub fn proximity_rule_body(name: &str) -> Value {
    serde_json::json!({
        "name": name,
        "description": "forklifts must keep distance",
        "severity": "HIGH",
        "condition": {
            "type": "proximity",
            "parameters": {
                "object1": "forklift",
                "object2": "person",
                "operator": ">",
                "threshold": 10,
                "unit": "ft"
            }
        }
    })
}

pub fn alert_body(title: &str, severity: &str) -> Value {
    serde_json::json!({
        "title": title,
        "description": "detected near the loading dock",
        "severity": severity,
        "location": { "x": 10.5, "y": 20.0 },
        "site_id": "site-1"
    })
}
