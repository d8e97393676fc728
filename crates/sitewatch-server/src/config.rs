use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sitewatch_common::types::Severity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// CORS allowed origins; empty allows all origins (development mode)
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; overrides the default file under `data_dir`.
    #[serde(default)]
    pub url: Option<String>,
}

impl DatabaseConfig {
    pub fn connection_url(&self, data_dir: &str) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{data_dir}/sitewatch.db?mode=rwc"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub webhooks: Vec<WebhookTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookTarget {
    pub url: String,
    /// Events below this severity are not delivered to this target.
    #[serde(default = "default_min_severity")]
    pub min_severity: String,
}

impl WebhookTarget {
    /// The configured severity floor. An unrecognized value falls back to
    /// LOW with a warning, so a typo widens delivery instead of silently
    /// dropping it but never goes unnoticed.
    pub fn severity_floor(&self) -> Severity {
        match self.min_severity.parse::<Severity>() {
            Ok(sev) => sev,
            Err(_) => {
                tracing::warn!(
                    url = %self.url,
                    min_severity = %self.min_severity,
                    "Unknown webhook min_severity, defaulting to LOW"
                );
                Severity::Low
            }
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_min_severity() -> String {
    "LOW".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            data_dir: default_data_dir(),
            cors_allowed_origins: Vec::new(),
            database: DatabaseConfig::default(),
            ai: AiConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{path}'"))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file '{path}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.data_dir, "data");
        assert!(!config.ai.enabled);
        assert!(config.notify.webhooks.is_empty());
        assert_eq!(
            config.database.connection_url("data"),
            "sqlite://data/sitewatch.db?mode=rwc"
        );
    }

    #[test]
    fn full_config_parses() {
        let config: ServerConfig = toml::from_str(
            r#"
            http_port = 9090
            data_dir = "/var/lib/sitewatch"

            [database]
            url = "sqlite:///tmp/test.db?mode=rwc"

            [ai]
            enabled = true
            api_key = "sk-test"
            model = "gpt-4-turbo-preview"

            [[notify.webhooks]]
            url = "https://hooks.example.com/safety"
            min_severity = "HIGH"
            "#,
        )
        .unwrap();
        assert_eq!(config.http_port, 9090);
        assert!(config.ai.enabled);
        assert_eq!(config.notify.webhooks.len(), 1);
        assert_eq!(config.notify.webhooks[0].min_severity, "HIGH");
        assert_eq!(
            config.database.connection_url(&config.data_dir),
            "sqlite:///tmp/test.db?mode=rwc"
        );
        assert_eq!(config.notify.webhooks[0].severity_floor(), Severity::High);
    }

    #[test]
    fn bad_webhook_severity_falls_back_to_low() {
        let target = WebhookTarget {
            url: "https://hooks.example.com/safety".to_string(),
            min_severity: "SEVERE".to_string(),
        };
        assert_eq!(target.severity_floor(), Severity::Low);
    }
}
