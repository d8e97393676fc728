use async_trait::async_trait;
use reqwest::Client;

use crate::models::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat};
use crate::prompt::{build_translation_prompt, SYSTEM_PROMPT};
use crate::translator::{RuleDraft, RuleTranslator, TranslateError};

/// OpenAI-compatible chat-completions provider.
#[derive(Clone)]
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout_secs: Option<u64>,
        max_tokens: Option<usize>,
        temperature: Option<f32>,
    ) -> Result<Self, TranslateError> {
        let timeout = timeout_secs.unwrap_or(60);
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout))
            .build()
            .map_err(|e| TranslateError::Request(e.to_string()))?;

        Ok(Self {
            api_key,
            model: model.unwrap_or_else(|| "gpt-4-turbo-preview".to_string()),
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            client,
            max_tokens,
            temperature,
        })
    }

    async fn call_api(&self, prompt: &str) -> Result<String, TranslateError> {
        let req = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: Some(ResponseFormat::json_object()),
        };

        tracing::debug!(
            model = %self.model,
            prompt_length = prompt.len(),
            "Calling translation API"
        );

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&req)
            .send()
            .await
            .map_err(|e| TranslateError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status, body = %body, "Translation API request failed");
            return Err(TranslateError::Status { status, body });
        }

        let chat_resp: ChatResponse = resp
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;

        tracing::debug!(usage = ?chat_resp.usage, "Translation API response received");

        chat_resp
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or(TranslateError::EmptyResponse)
    }
}

#[async_trait]
impl RuleTranslator for OpenAiProvider {
    fn provider(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn translate(&self, text: &str) -> Result<RuleDraft, TranslateError> {
        let prompt = build_translation_prompt(text);
        let content = self.call_api(&prompt).await?;
        parse_rule_json(&content)
    }
}

/// Parse the model's JSON reply, tolerating markdown code fences some
/// models wrap around it despite the json_object response format.
fn parse_rule_json(content: &str) -> Result<RuleDraft, TranslateError> {
    let trimmed = content.trim();
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(stripped.trim()).map_err(|e| TranslateError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rule_json_plain() {
        let content = r#"{
            "name": "Forklift proximity",
            "description": "Forklift too close to a person",
            "type": "proximity",
            "severity": "HIGH",
            "condition": {
                "object1": "forklift",
                "object2": "person",
                "operator": "<",
                "threshold": 10,
                "unit": "ft"
            }
        }"#;
        let draft = parse_rule_json(content).unwrap();
        assert_eq!(draft.name, "Forklift proximity");
        assert_eq!(draft.condition_type, "proximity");
        assert_eq!(draft.severity, "HIGH");

        let raw = draft.to_raw_condition();
        assert_eq!(raw.condition_type, "proximity");
        assert_eq!(raw.parameters.get("unit"), Some(&json!("ft")));
    }

    #[test]
    fn test_parse_rule_json_fenced() {
        let content = "```json\n{\"name\":\"n\",\"type\":\"speed\",\"severity\":\"LOW\",\"condition\":{}}\n```";
        let draft = parse_rule_json(content).unwrap();
        assert_eq!(draft.condition_type, "speed");
        assert!(draft.condition.is_empty());
        assert!(draft.description.is_empty());
    }

    #[test]
    fn test_parse_rule_json_garbage() {
        assert!(matches!(
            parse_rule_json("the rule should be about forklifts"),
            Err(TranslateError::Parse(_))
        ));
    }
}
