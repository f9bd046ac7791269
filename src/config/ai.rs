//! AI provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration (Groq for text, Anthropic for vision)
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Groq API key (text analysis)
    pub groq_api_key: String,

    /// Anthropic API key (photo analysis)
    pub anthropic_api_key: String,

    /// Groq model identifier
    #[serde(default = "default_groq_model")]
    pub groq_model: String,

    /// Anthropic model identifier
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,

    /// Groq API base URL (overridable for tests)
    #[serde(default = "default_groq_base_url")]
    pub groq_base_url: String,

    /// Anthropic API base URL (overridable for tests)
    #[serde(default = "default_anthropic_base_url")]
    pub anthropic_base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.groq_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("AI_GROQ_API_KEY"));
        }
        if self.anthropic_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("AI_ANTHROPIC_API_KEY"));
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            groq_api_key: String::new(),
            anthropic_api_key: String::new(),
            groq_model: default_groq_model(),
            anthropic_model: default_anthropic_model(),
            groq_base_url: default_groq_base_url(),
            anthropic_base_url: default_anthropic_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_groq_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_timeout() -> u64 {
    120
}
