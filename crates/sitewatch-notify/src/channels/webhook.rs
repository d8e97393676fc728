use anyhow::Result;
use async_trait::async_trait;

use crate::{AlertEvent, EventKind, NotificationSink};

/// Posts alert events as JSON to a configured URL.
pub struct WebhookSink {
    url: String,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn render_body(&self, event: &AlertEvent) -> String {
        serde_json::json!({
            "event": match event.kind {
                EventKind::Created => "alert.created",
                EventKind::Escalated => "alert.escalated",
            },
            "alert_id": event.alert_id,
            "title": event.title,
            "description": event.description,
            "severity": event.severity.to_string(),
            "status": event.status.to_string(),
            "site_id": event.site_id,
            "rule_id": event.rule_id,
            "timestamp": event.timestamp.to_rfc3339(),
        })
        .to_string()
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, event: &AlertEvent) -> Result<()> {
        let body = self.render_body(event);
        let resp = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let resp_body = resp.text().await.unwrap_or_default();
            anyhow::bail!("webhook returned HTTP {status}: {resp_body}");
        }
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "webhook"
    }
}
