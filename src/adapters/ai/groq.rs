//! Groq text analysis adapter.
//!
//! Implements `TextAnalyzer` against Groq's OpenAI-compatible chat
//! completions API with JSON response mode.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{AnalysisReport, DetectionError, TextAnalysisRequest, TextAnalyzer};

use super::prompts::text_system_prompt;

/// Configuration for the Groq adapter.
#[derive(Clone)]
pub struct GroqConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "llama-3.3-70b-versatile").
    pub model: String,
    /// Base URL for the API (default: https://api.groq.com/openai/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl GroqConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "llama-3.3-70b-versatile".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Groq text analysis adapter.
pub struct GroqTextAdapter {
    config: GroqConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl GroqTextAdapter {
    /// Creates a new Groq adapter with the given configuration.
    pub fn new(config: GroqConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Parses the model's JSON reply into a report, clamping the score.
    fn parse_report(content: &str) -> Result<AnalysisReport, DetectionError> {
        let mut report: AnalysisReport = serde_json::from_str(content)
            .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;
        report.ai_score = report.ai_score.min(100);
        Ok(report)
    }
}

#[async_trait]
impl TextAnalyzer for GroqTextAdapter {
    async fn analyze_text(
        &self,
        request: TextAnalysisRequest,
    ) -> Result<AnalysisReport, DetectionError> {
        let chat_request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: text_system_prompt(request.surface),
                },
                ChatMessage {
                    role: "user",
                    content: request.text,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            temperature: 0.2,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&chat_request)
            .send()
            .await
            // Timeouts and connection errors are plain failures; only an
            // overload status from the provider maps to RateLimited.
            .map_err(|e| DetectionError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 || status.as_u16() == 503 {
            tracing::warn!(status = %status, "Groq reported overload");
            return Err(DetectionError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %body, "Groq request failed");
            return Err(DetectionError::RequestFailed(format!(
                "status {status}: {body}"
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                DetectionError::MalformedResponse("response has no choices".to_string())
            })?;

        Self::parse_report(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_report_accepts_model_json() {
        let report = GroqTextAdapter::parse_report(
            r#"{"ai_score": 85, "summary": "formulaic", "findings": [], "rewritten": "better"}"#,
        )
        .unwrap();
        assert_eq!(report.ai_score, 85);
        assert_eq!(report.rewritten.as_deref(), Some("better"));
    }

    #[test]
    fn parse_report_clamps_out_of_range_score() {
        let report = GroqTextAdapter::parse_report(
            r#"{"ai_score": 250, "summary": "overconfident model"}"#,
        )
        .unwrap();
        assert_eq!(report.ai_score, 100);
    }

    #[test]
    fn parse_report_rejects_non_json() {
        let result = GroqTextAdapter::parse_report("The score is probably 85.");
        assert!(matches!(result, Err(DetectionError::MalformedResponse(_))));
    }
}
