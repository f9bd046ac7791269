//! Anthropic vision adapter.
//!
//! Implements `VisionAnalyzer` against Anthropic's Messages API. Image bytes
//! are base64-encoded into a vision content block alongside the detection
//! prompt.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{AnalysisReport, DetectionError, ImageAnalysisRequest, VisionAnalyzer};

use super::prompts::photo_prompt;

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic vision adapter.
#[derive(Clone)]
pub struct AnthropicVisionConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,
    /// Base URL for the API (default: https://api.anthropic.com).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl AnthropicVisionConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
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

/// Anthropic vision adapter.
pub struct AnthropicVisionAdapter {
    config: AnthropicVisionConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Image { source: ImageSource },
    Text { text: String },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

impl AnthropicVisionAdapter {
    /// Creates a new Anthropic adapter with the given configuration.
    pub fn new(config: AnthropicVisionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    fn build_request(&self, request: &ImageAnalysisRequest) -> MessagesRequest {
        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: 2048,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64",
                            media_type: request.media_type.clone(),
                            data: BASE64.encode(&request.bytes),
                        },
                    },
                    ContentBlock::Text {
                        text: photo_prompt(),
                    },
                ],
            }],
        }
    }

    /// Extracts the model's text and parses the report JSON out of it.
    ///
    /// Vision models sometimes wrap the JSON in prose even when told not to,
    /// so we parse the outermost brace-delimited span.
    fn parse_report(text: &str) -> Result<AnalysisReport, DetectionError> {
        let start = text.find('{');
        let end = text.rfind('}');
        let json = match (start, end) {
            (Some(s), Some(e)) if s < e => &text[s..=e],
            _ => {
                return Err(DetectionError::MalformedResponse(
                    "no JSON object in reply".to_string(),
                ))
            }
        };
        let mut report: AnalysisReport = serde_json::from_str(json)
            .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;
        report.ai_score = report.ai_score.min(100);
        Ok(report)
    }
}

#[async_trait]
impl VisionAnalyzer for AnthropicVisionAdapter {
    async fn analyze_image(
        &self,
        request: ImageAnalysisRequest,
    ) -> Result<AnalysisReport, DetectionError> {
        let body = self.build_request(&request);

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&body)
            .send()
            .await
            // Timeouts and connection errors are plain failures; only an
            // overload status from the provider maps to RateLimited.
            .map_err(|e| DetectionError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 || status.as_u16() == 529 {
            tracing::warn!(status = %status, "Anthropic reported overload");
            return Err(DetectionError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %body, "Anthropic request failed");
            return Err(DetectionError::RequestFailed(format!(
                "status {status}: {body}"
            )));
        }

        let messages_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;

        let text = messages_response
            .content
            .into_iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");

        Self::parse_report(&text)
    }
}
