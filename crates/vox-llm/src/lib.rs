//! # vox-llm
//!
//! Gemini text-generation client for the vox assistant.
//!
//! One prompt in, one block of generated text out. The client owns the
//! transport concerns — request timeout, linear-backoff retry for transient
//! failures — while model fallback (primary → fallback model id) is the
//! interpreter's policy, driven through the [`TextModel`] trait so tests can
//! substitute a scripted model.

#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod types;

pub use client::{GeminiClient, GeminiConfig};
pub use error::ModelError;

use async_trait::async_trait;

/// A text-generation model endpoint addressable by model id.
///
/// `generate` performs exactly one logical call (transport retries included);
/// it never falls back to another model on its own.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Generate text for `prompt` against the given model id.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ModelError>;

    /// The model id to try first.
    fn primary_model(&self) -> &str;

    /// The model id to retry against on timeout or unknown-model errors.
    fn fallback_model(&self) -> &str;
}
