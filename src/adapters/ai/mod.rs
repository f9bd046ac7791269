//! AI provider adapters - Groq for text, Anthropic for vision.

mod anthropic;
mod groq;
mod prompts;

pub use anthropic::{AnthropicVisionAdapter, AnthropicVisionConfig};
pub use groq::{GroqConfig, GroqTextAdapter};
