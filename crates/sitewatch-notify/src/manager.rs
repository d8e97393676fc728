use sitewatch_common::types::Severity;

use crate::{AlertEvent, NotificationSink};

struct Route {
    sink: Box<dyn NotificationSink>,
    min_severity: Severity,
}

/// Fans alert events out to every sink whose severity floor is met.
pub struct NotificationManager {
    routes: Vec<Route>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Box<dyn NotificationSink>, min_severity: Severity) {
        self.routes.push(Route { sink, min_severity });
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Deliver an event to every matching sink. Failures are logged and
    /// swallowed; one broken sink must not block the rest.
    pub async fn notify(&self, event: &AlertEvent) {
        for route in &self.routes {
            if event.severity < route.min_severity {
                continue;
            }
            if let Err(e) = route.sink.send(event).await {
                tracing::error!(
                    sink = route.sink.sink_name(),
                    alert_id = %event.alert_id,
                    error = %e,
                    "Notification delivery failed"
                );
            } else {
                tracing::debug!(
                    sink = route.sink.sink_name(),
                    alert_id = %event.alert_id,
                    "Notification delivered"
                );
            }
        }
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}
