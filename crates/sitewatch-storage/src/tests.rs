use serde_json::json;
use sitewatch_common::id::next_id;
use sitewatch_common::types::{AlertStatus, Location, Severity};

use crate::store::{AlertFilter, AlertRow, RuleFilter, RuleRow, RuleUpdate};
use crate::{SafetyStore, StorageError};

async fn store() -> SafetyStore {
    SafetyStore::new("sqlite::memory:")
        .await
        .expect("in-memory store")
}

fn rule_row(name: &str) -> RuleRow {
    RuleRow {
        id: next_id(),
        name: name.to_string(),
        description: "keep forklifts away from people".to_string(),
        condition: json!({
            "type": "proximity",
            "parameters": {
                "object1": "forklift",
                "object2": "person",
                "operator": ">",
                "threshold": 10.0,
                "unit": "ft"
            }
        }),
        severity: Severity::High,
        is_active: true,
        site_id: Some("site-1".to_string()),
        source: "api".to_string(),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

fn alert_row(title: &str, severity: Severity) -> AlertRow {
    AlertRow {
        id: next_id(),
        title: title.to_string(),
        description: "detected near loading dock".to_string(),
        severity,
        status: AlertStatus::Active,
        source: "detector".to_string(),
        location: Some(Location { x: 12.5, y: 48.0 }),
        site_id: Some("site-1".to_string()),
        rule_id: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
        resolved_at: None,
    }
}

#[tokio::test]
async fn rule_insert_get_round_trip() {
    let store = store().await;
    let inserted = store.insert_rule(&rule_row("Forklift proximity")).await.unwrap();

    let fetched = store.get_rule_by_id(&inserted.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Forklift proximity");
    assert_eq!(fetched.severity, Severity::High);
    assert!(fetched.is_active);
    assert_eq!(fetched.condition["type"], "proximity");
}

#[tokio::test]
async fn duplicate_rule_name_conflicts() {
    let store = store().await;
    store.insert_rule(&rule_row("Unique name")).await.unwrap();

    let err = store.insert_rule(&rule_row("Unique name")).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict { entity: "alert_rule", .. }));
}

#[tokio::test]
async fn rule_update_and_set_active() {
    let store = store().await;
    let rule = store.insert_rule(&rule_row("Speed limit")).await.unwrap();

    let updated = store
        .update_rule(
            &rule.id,
            &RuleUpdate {
                description: Some("updated".to_string()),
                severity: Some(Severity::Critical),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description, "updated");
    assert_eq!(updated.severity, Severity::Critical);
    assert_eq!(updated.name, "Speed limit");

    let off = store.set_rule_active(&rule.id, false).await.unwrap();
    assert!(!off.is_active);
}

#[tokio::test]
async fn rule_update_missing_is_not_found() {
    let store = store().await;
    let err = store
        .update_rule("no-such-id", &RuleUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "alert_rule", .. }));
}

#[tokio::test]
async fn rule_delete_keeps_alert_reference() {
    let store = store().await;
    let rule = store.insert_rule(&rule_row("Doomed rule")).await.unwrap();

    let mut alert = alert_row("Proximity breach", Severity::High);
    alert.rule_id = Some(rule.id.clone());
    let alert = store.insert_alert(&alert).await.unwrap();

    store.delete_rule(&rule.id).await.unwrap();
    assert!(store.get_rule_by_id(&rule.id).await.unwrap().is_none());

    // orphaned on purpose
    let alert = store.get_alert_by_id(&alert.id).await.unwrap().unwrap();
    assert_eq!(alert.rule_id.as_deref(), Some(rule.id.as_str()));
}

#[tokio::test]
async fn rule_list_filters_compose() {
    let store = store().await;
    let mut a = rule_row("Forklift proximity");
    a.severity = Severity::High;
    let mut b = rule_row("Crowd control");
    b.severity = Severity::Low;
    b.is_active = false;
    store.insert_rule(&a).await.unwrap();
    store.insert_rule(&b).await.unwrap();

    let filter = RuleFilter {
        is_active_eq: Some(true),
        ..Default::default()
    };
    let rows = store.list_rules(&filter, 20, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Forklift proximity");
    assert_eq!(store.count_rules(&filter).await.unwrap(), 1);

    let search = RuleFilter {
        search: Some("crowd".to_string()),
        ..Default::default()
    };
    let rows = store.list_rules(&search, 20, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Crowd control");
}

#[tokio::test]
async fn alert_insert_round_trips_location() {
    let store = store().await;
    let alert = store
        .insert_alert(&alert_row("PPE violation", Severity::Medium))
        .await
        .unwrap();

    let fetched = store.get_alert_by_id(&alert.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, AlertStatus::Active);
    assert_eq!(fetched.location, Some(Location { x: 12.5, y: 48.0 }));
    assert!(fetched.resolved_at.is_none());
}

#[tokio::test]
async fn alert_filters_and_search() {
    let store = store().await;
    store
        .insert_alert(&alert_row("Forklift too close", Severity::High))
        .await
        .unwrap();
    store
        .insert_alert(&alert_row("Missing hard hat", Severity::Low))
        .await
        .unwrap();

    let filter = AlertFilter {
        severity_eq: Some(Severity::High),
        status_eq: Some(AlertStatus::Active),
        site_id_eq: Some("site-1".to_string()),
        ..Default::default()
    };
    let rows = store.list_alerts(&filter, 20, 0).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Forklift too close");

    // case-insensitive contains
    let search = AlertFilter {
        search: Some("FORKLIFT".to_string()),
        ..Default::default()
    };
    assert_eq!(store.count_alerts(&search).await.unwrap(), 1);
}

#[tokio::test]
async fn transition_appends_response_and_stamps_resolved_at() {
    let store = store().await;
    let alert = store
        .insert_alert(&alert_row("Crowding at entrance", Severity::Medium))
        .await
        .unwrap();

    let (alert, response) = store
        .transition_alert(&alert.id, AlertStatus::Acknowledged, "user-7")
        .await
        .unwrap();
    assert_eq!(alert.status, AlertStatus::Acknowledged);
    assert_eq!(response.action, AlertStatus::Acknowledged);
    assert_eq!(response.user_id, "user-7");
    assert!(alert.resolved_at.is_none());

    let (alert, _) = store
        .transition_alert(&alert.id, AlertStatus::Resolved, "user-7")
        .await
        .unwrap();
    assert_eq!(alert.status, AlertStatus::Resolved);
    assert!(alert.resolved_at.is_some());

    let history = store.list_alert_responses(&alert.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, AlertStatus::Acknowledged);
    assert_eq!(history[1].action, AlertStatus::Resolved);
}

#[tokio::test]
async fn illegal_transition_writes_nothing() {
    let store = store().await;
    let alert = store
        .insert_alert(&alert_row("Resolved already", Severity::Low))
        .await
        .unwrap();
    store
        .transition_alert(&alert.id, AlertStatus::Resolved, "user-1")
        .await
        .unwrap();

    let err = store
        .transition_alert(&alert.id, AlertStatus::Active, "user-1")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Transition(_)));

    // the failed attempt must not append to the audit trail
    let history = store.list_alert_responses(&alert.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn transition_missing_alert_is_not_found() {
    let store = store().await;
    let err = store
        .transition_alert("no-such-alert", AlertStatus::Resolved, "user-1")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "alert", .. }));
}
