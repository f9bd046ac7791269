//! Detection prompts per analysis surface.
//!
//! Every prompt instructs the model to answer with a single JSON object
//! matching `AnalysisReport`; the adapters parse that shape and reject
//! anything else.

use crate::ports::TextSurface;

/// JSON shape the model must produce, appended to every prompt.
const REPORT_SHAPE: &str = r#"Respond with a single JSON object and nothing else:
{"ai_score": <integer 0-100, likelihood the content is AI-generated>,
 "summary": "<two or three sentences explaining the score>",
 "findings": [{"excerpt": "<quoted passage or trait>", "reason": "<why it reads as AI-generated>"}],
 "rewritten": "<optional: the content rewritten to read naturally human, omit if not applicable>"}"#;

/// System prompt for a text surface.
pub fn text_system_prompt(surface: TextSurface) -> String {
    let role = match surface {
        TextSurface::Resume => {
            "You are an expert recruiter who detects AI-generated resume content. \
             Look for generic buzzword strings, uniform bullet cadence, and \
             accomplishments with no concrete numbers or context. Include a \
             humanized rewrite of the weakest sections."
        }
        TextSurface::Essay => {
            "You are an expert writing instructor who detects AI-generated essays. \
             Look for hedged thesis statements, formulaic transitions, uniform \
             sentence length, and an absence of personal voice. Include a \
             humanized rewrite of the most formulaic passages."
        }
        TextSurface::Profile => {
            "You are an expert at detecting AI-generated dating and social \
             profiles. Look for interchangeable interest lists, cliches, and \
             tone that matches no age or region. Do not include a rewrite."
        }
    };
    format!("{role}\n\n{REPORT_SHAPE}")
}

/// User-facing vision prompt for photo analysis.
pub fn photo_prompt() -> String {
    format!(
        "Analyze this photo for signs of AI generation or manipulation: \
         anatomical inconsistencies, impossible lighting, texture smearing, \
         garbled text or background artifacts. Do not include a rewrite.\n\n{REPORT_SHAPE}"
    )
}
