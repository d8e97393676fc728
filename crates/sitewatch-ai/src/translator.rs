use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitewatch_common::types::RawCondition;

/// Failure of one translation attempt. The API folds every variant into
/// a single generic error so a half-translated rule is never exposed.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    Request(String),
    #[error("translation provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("translation provider returned no choices")]
    EmptyResponse,
    #[error("could not parse translated rule: {0}")]
    Parse(String),
}

/// Model output for one translated rule, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub condition_type: String,
    pub severity: String,
    /// Parameter map for `condition_type`, exactly as the model wrote it.
    #[serde(default)]
    pub condition: serde_json::Map<String, serde_json::Value>,
}

impl RuleDraft {
    /// The draft's condition in the shape the validation gate takes.
    pub fn to_raw_condition(&self) -> RawCondition {
        RawCondition {
            condition_type: self.condition_type.clone(),
            parameters: self.condition.clone(),
        }
    }
}

/// A pluggable text-to-rule backend.
#[async_trait]
pub trait RuleTranslator: Send + Sync {
    /// Provider name, e.g. `openai`.
    fn provider(&self) -> &str;

    /// Model identifier used for requests.
    fn model_name(&self) -> &str;

    /// Translate a plain-language description into a rule draft.
    async fn translate(&self, text: &str) -> Result<RuleDraft, TranslateError>;
}
