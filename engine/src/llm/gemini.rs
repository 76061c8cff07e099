//! Gemini completion client
//!
//! Thin REST client for the Gemini `generateContent` endpoint. The system
//! prompt rides in the `systemInstruction` field; the response text is the
//! concatenation of all candidate parts. No tool-call interpretation
//! happens here: the tool loop parses structured requests out of the raw
//! text itself.

use crate::config::LlmConfig;
use async_trait::async_trait;
use sdk::services::{CompletionError, CompletionService};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

pub struct GeminiClient {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: LlmConfig, api_key: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            config,
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn check_health(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, CompletionError> {
        if self.api_key.is_empty() {
            return Err(CompletionError::AuthenticationFailed(
                "no API key configured".to_string(),
            ));
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.api_key
        );

        let mut payload = serde_json::Map::new();
        payload.insert(
            "contents".to_string(),
            json!([{
                "role": "user",
                "parts": [{"text": prompt}]
            }]),
        );
        if let Some(sys) = system_prompt {
            payload.insert(
                "systemInstruction".to_string(),
                json!({"parts": [{"text": sys}]}),
            );
        }

        debug!(
            "Gemini request: model={}, prompt={} chars, system={} chars",
            self.config.model,
            prompt.len(),
            system_prompt.map(str::len).unwrap_or(0)
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Unavailable("Gemini request timed out".to_string())
                } else {
                    CompletionError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                400 | 404 => CompletionError::InvalidRequest(text),
                401 | 403 => CompletionError::AuthenticationFailed(text),
                429 => CompletionError::RateLimitExceeded,
                _ => CompletionError::Unavailable(format!(
                    "Gemini API error ({}): {}",
                    status, text
                )),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CompletionError::Parse(e.to_string()))?;

        let parts = data
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| {
                CompletionError::Parse("No candidate parts in response".to_string())
            })?;

        let mut full_text = String::new();
        for part in parts {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                full_text.push_str(text);
            }
        }

        Ok(full_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_properties() {
        let client = GeminiClient::new(LlmConfig::default(), "key-123");
        assert_eq!(client.name(), "gemini");
    }

    #[tokio::test]
    async fn test_health_requires_api_key() {
        let client = GeminiClient::new(LlmConfig::default(), "");
        assert!(!client.check_health().await);

        let client = GeminiClient::new(LlmConfig::default(), "key-123");
        assert!(client.check_health().await);
    }

    #[tokio::test]
    async fn test_generate_without_key_fails_fast() {
        let client = GeminiClient::new(LlmConfig::default(), "");
        let result = client.generate("hello", None).await;
        assert!(matches!(
            result,
            Err(CompletionError::AuthenticationFailed(_))
        ));
    }
}
