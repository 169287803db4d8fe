//! Wire types for the `generateContent` endpoint.

use serde::{Deserialize, Serialize};

/// Default base URL for the generative-language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";

/// Fixed sampling configuration — tuned for short spoken answers.
pub const TEMPERATURE: f32 = 0.7;
/// Output budget; replies are capped at a couple of sentences.
pub const MAX_OUTPUT_TOKENS: u32 = 150;
/// Top-k sampling cutoff.
pub const TOP_K: u32 = 40;
/// Nucleus sampling cutoff.
pub const TOP_P: f32 = 0.95;

/// Request body for `models/{model}:generateContent`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns; a single user turn for this client.
    pub contents: Vec<Content>,
    /// Sampling configuration.
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// Build the single-turn request used for every interpretation call.
    #[must_use]
    pub fn single_turn(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.into(),
                }],
            }],
            generation_config: GenerationConfig::default(),
        }
    }
}

/// One conversation turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Content {
    /// Content parts (text only for this client).
    pub parts: Vec<Part>,
}

/// One content part.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Part {
    /// Text payload.
    pub text: String,
}

/// Sampling configuration sent with every request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Hard cap on generated tokens.
    pub max_output_tokens: u32,
    /// Top-k cutoff.
    pub top_k: u32,
    /// Nucleus cutoff.
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            top_k: TOP_K,
            top_p: TOP_P,
        }
    }
}

/// Response body from `generateContent`.
#[derive(Clone, Debug, Deserialize)]
pub struct GenerateContentResponse {
    /// Generated candidates; absent on safety blocks.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// The text of the first candidate's first part, if any.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .parts
            .first()
            .map(|p| p.text.as_str())
    }
}

/// One generated candidate.
#[derive(Clone, Debug, Deserialize)]
pub struct Candidate {
    /// Generated content.
    pub content: Content,
}

/// Response body from the model-listing endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct ListModelsResponse {
    /// Available models.
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// One entry from the model-listing endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct ModelInfo {
    /// Fully qualified model name (`models/...`).
    pub name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
