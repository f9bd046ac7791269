//! Request/response DTOs for the analysis endpoints.

use serde::{Deserialize, Serialize};

use crate::ports::AnalysisReport;

/// Bounds on analyzable text, shared by all text surfaces.
pub const MIN_TEXT_CHARS: usize = 50;
pub const MAX_TEXT_CHARS: usize = 50_000;

/// Body for POST /api/analyze/essay.
#[derive(Debug, Deserialize)]
pub struct EssayRequest {
    pub text: String,
}

/// Body for POST /api/analyze/profile.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub headline: Option<String>,
    pub bio: String,
}

impl ProfileRequest {
    /// Combined text sent to the analyzer.
    pub fn combined_text(&self) -> String {
        match self.headline.as_deref().filter(|h| !h.trim().is_empty()) {
            Some(headline) => format!("{}\n\n{}", headline.trim(), self.bio.trim()),
            None => self.bio.trim().to_string(),
        }
    }
}

/// Successful analysis response.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub report: AnalysisReport,

    /// Balance after the charge, for authenticated callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits_remaining: Option<i64>,

    /// Updated free-analysis counter, for anonymous callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_analyses_used: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_combines_headline_and_bio() {
        let request = ProfileRequest {
            headline: Some("Senior widget engineer".to_string()),
            bio: "Ten years of widget experience.".to_string(),
        };
        assert_eq!(
            request.combined_text(),
            "Senior widget engineer\n\nTen years of widget experience."
        );
    }

    #[test]
    fn blank_headline_is_dropped() {
        let request = ProfileRequest {
            headline: Some("   ".to_string()),
            bio: "Just the bio.".to_string(),
        };
        assert_eq!(request.combined_text(), "Just the bio.");
    }

    #[test]
    fn response_omits_absent_charge_fields() {
        let response = AnalysisResponse {
            report: AnalysisReport {
                ai_score: 10,
                summary: "looks human".to_string(),
                findings: vec![],
                rewritten: None,
            },
            credits_remaining: None,
            visitor_analyses_used: Some(1),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("credits_remaining").is_none());
        assert_eq!(json["visitor_analyses_used"], 1);
        assert_eq!(json["ai_score"], 10);
    }
}
