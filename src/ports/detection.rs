//! Detection ports - text and vision AI-content analysis providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which analysis surface a text request came from. Providers use it to pick
/// the right prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSurface {
    Resume,
    Essay,
    Profile,
}

impl TextSurface {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextSurface::Resume => "resume",
            TextSurface::Essay => "essay",
            TextSurface::Profile => "profile",
        }
    }
}

/// Text to analyze plus the surface it belongs to.
#[derive(Debug, Clone)]
pub struct TextAnalysisRequest {
    pub surface: TextSurface,
    pub text: String,
}

/// Image bytes to analyze.
#[derive(Debug, Clone)]
pub struct ImageAnalysisRequest {
    /// "image/jpeg", "image/png", or "image/webp".
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// A single flagged passage or trait in the analyzed content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub excerpt: String,
    pub reason: String,
}

/// Provider-produced analysis report, surfaced to clients as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// 0-100 likelihood the content is AI-generated.
    pub ai_score: u8,
    pub summary: String,
    #[serde(default)]
    pub findings: Vec<Finding>,
    /// Humanized rewrite, only for text surfaces that request one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewritten: Option<String>,
}

#[derive(Debug, Error)]
pub enum DetectionError {
    /// Upstream returned 429 or an overload status. The caller must not
    /// charge for the attempt and should alert the operator.
    #[error("analysis provider overloaded")]
    RateLimited,
    #[error("analysis provider request failed: {0}")]
    RequestFailed(String),
    /// Provider replied but the body was not the expected report shape.
    #[error("analysis provider returned malformed output: {0}")]
    MalformedResponse(String),
}

/// Port over the text analysis provider.
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    async fn analyze_text(
        &self,
        request: TextAnalysisRequest,
    ) -> Result<AnalysisReport, DetectionError>;
}

/// Port over the vision analysis provider.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    async fn analyze_image(
        &self,
        request: ImageAnalysisRequest,
    ) -> Result<AnalysisReport, DetectionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_omits_rewrite_when_absent() {
        let report = AnalysisReport {
            ai_score: 72,
            summary: "likely generated".to_string(),
            findings: vec![],
            rewritten: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("rewritten").is_none());
        assert_eq!(json["ai_score"], 72);
    }

    #[test]
    fn report_tolerates_missing_findings() {
        let report: AnalysisReport =
            serde_json::from_str(r#"{"ai_score": 10, "summary": "human"}"#).unwrap();
        assert!(report.findings.is_empty());
    }
}
