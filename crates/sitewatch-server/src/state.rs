use crate::config::ServerConfig;
use chrono::{DateTime, Utc};
use sitewatch_ai::RuleTranslator;
use sitewatch_notify::manager::NotificationManager;
use sitewatch_notify::{AlertEvent, EventKind};
use sitewatch_storage::store::AlertRow;
use sitewatch_storage::SafetyStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SafetyStore>,
    /// Absent when no translation provider is configured.
    pub translator: Option<Arc<dyn RuleTranslator>>,
    pub notifier: Arc<NotificationManager>,
    pub start_time: DateTime<Utc>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Fan an alert event out to the notification sinks without blocking
    /// the request; delivery failures only reach the logs.
    pub fn notify_alert(&self, row: &AlertRow, kind: EventKind) {
        if self.notifier.is_empty() {
            return;
        }
        let notifier = self.notifier.clone();
        let event = AlertEvent {
            kind,
            alert_id: row.id.clone(),
            title: row.title.clone(),
            description: row.description.clone(),
            severity: row.severity,
            status: row.status,
            site_id: row.site_id.clone(),
            rule_id: row.rule_id.clone(),
            timestamp: row.updated_at,
        };
        tokio::spawn(async move {
            notifier.notify(&event).await;
        });
    }
}
