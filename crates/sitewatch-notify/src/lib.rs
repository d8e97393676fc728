//! Notification delivery with pluggable sink support.
//!
//! Alert events are routed to [`NotificationSink`] implementations based
//! on a per-sink minimum severity. Dispatch is fire-and-forget: failures
//! are logged and never surface to API callers.

pub mod channels;
pub mod manager;


use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitewatch_common::types::{AlertStatus, Severity};

pub use manager::NotificationManager;

/// What happened to the alert being announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Escalated,
}

/// One alert occurrence flattened for delivery to external services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: EventKind,
    pub alert_id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: AlertStatus,
    pub site_id: Option<String>,
    pub rule_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A delivery channel that pushes alert events to an external service.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers the alert event through this sink.
    async fn send(&self, event: &AlertEvent) -> Result<()>;

    /// Returns the sink type name (e.g. `"webhook"`).
    fn sink_name(&self) -> &str;
}
