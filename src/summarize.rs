use std::future::Future;

use log::debug;

use crate::ModelError;

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Older spelling, still honoured
pub const API_KEY_ENV_LEGACY: &str = "Google_API_KEY";

type Result<T> = std::result::Result<T, ModelError>;

/// Anything that turns a prompt into generated text
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Which model to call and how to authenticate
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl ModelConfig {
    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

/// Look up the API key, preferring [`API_KEY_ENV`]
pub fn api_key_from_env() -> Option<String> {
    api_key_from(|name| std::env::var(name).ok())
}

fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    [API_KEY_ENV, API_KEY_ENV_LEGACY]
        .into_iter()
        .filter_map(lookup)
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

/// Google Gemini `generateContent` client
#[derive(Debug, Clone)]
pub struct GeminiModel {
    client: reqwest::Client,
    config: ModelConfig,
}

impl GeminiModel {
    pub fn new(client: reqwest::Client, config: ModelConfig) -> Self {
        Self { client, config }
    }
}

impl TextGenerator for GeminiModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| ModelError::MissingApiKey {
            env_var: API_KEY_ENV.to_string(),
        })?;

        debug!(
            "Generating via Gemini API with model {} ({} chars)",
            self.config.model,
            prompt.chars().count()
        );

        let resp = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request_body(prompt))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, body });
        }

        let json: serde_json::Value = resp.json().await?;
        extract_gemini_text(&json)
    }
}

fn request_body(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": prompt }]
            }
        ]
    })
}

fn extract_gemini_text(json: &serde_json::Value) -> Result<String> {
    if let Some(reason) = json
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str())
    {
        return Err(ModelError::Blocked {
            reason: reason.to_string(),
        });
    }

    let candidate = json.get("candidates").and_then(|c| c.get(0));

    if let Some(parts) = candidate
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    {
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text")?.as_str())
            .collect::<Vec<_>>()
            .join("");
        if !text.is_empty() {
            return Ok(text);
        }
    }

    if let Some(reason) = candidate
        .and_then(|c| c.get("finishReason"))
        .and_then(|r| r.as_str())
        .filter(|r| *r != "STOP")
    {
        return Err(ModelError::Blocked {
            reason: reason.to_string(),
        });
    }

    Err(ModelError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let config = ModelConfig::default();
        assert_eq!(
            config.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro-latest:generateContent"
        );

        let config = ModelConfig {
            api_base: "http://localhost:8080/v1beta/".to_string(),
            model: "gemini-2.0-flash".to_string(),
            ..ModelConfig::default()
        };
        assert_eq!(
            config.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_forwards_prompt_verbatim() {
        let prompt = "  some transcript text, cut mid-wo";
        let body = request_body(prompt);
        assert_eq!(body["contents"][0]["parts"][0]["text"], prompt);
        assert_eq!(body["contents"][0]["role"], "user");
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_api_key_prefers_primary_name() {
        let key = api_key_from(|name| match name {
            API_KEY_ENV => Some("primary".to_string()),
            API_KEY_ENV_LEGACY => Some("legacy".to_string()),
            _ => None,
        });
        assert_eq!(key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_api_key_falls_back_to_legacy_name() {
        let key = api_key_from(|name| (name == API_KEY_ENV_LEGACY).then(|| "legacy".to_string()));
        assert_eq!(key.as_deref(), Some("legacy"));
    }

    #[test]
    fn test_api_key_blank_is_missing() {
        let key = api_key_from(|name| (name == API_KEY_ENV).then(|| "   ".to_string()));
        assert!(key.is_none());
    }

    #[tokio::test]
    async fn test_generate_without_api_key() {
        let model = GeminiModel::new(reqwest::Client::new(), ModelConfig::default());
        match model.generate("hello").await {
            Err(ModelError::MissingApiKey { env_var }) => assert_eq!(env_var, API_KEY_ENV),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_extract_gemini_text() {
        let json = serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [
                            { "text": "Here is " },
                            { "text": "the summary." }
                        ]
                    },
                    "finishReason": "STOP"
                }
            ]
        });
        assert_eq!(extract_gemini_text(&json).unwrap(), "Here is the summary.");
    }

    #[test]
    fn test_extract_gemini_text_blocked_prompt() {
        let json = serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        });
        match extract_gemini_text(&json) {
            Err(ModelError::Blocked { reason }) => assert_eq!(reason, "SAFETY"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_extract_gemini_text_finish_reason_without_text() {
        let json = serde_json::json!({
            "candidates": [{ "finishReason": "RECITATION" }]
        });
        assert!(matches!(
            extract_gemini_text(&json),
            Err(ModelError::Blocked { reason }) if reason == "RECITATION"
        ));
    }

    #[test]
    fn test_extract_gemini_text_empty() {
        let json = serde_json::json!({ "candidates": [] });
        assert!(matches!(extract_gemini_text(&json), Err(ModelError::EmptyResponse)));
    }
}
