//! Gemini HTTP client.
//!
//! One logical call = one `generateContent` POST, with transparent retry for
//! transient transport failures (connect errors, 429, 5xx) on a short linear
//! backoff. Timeouts are deliberately NOT retried here — they feed the
//! interpreter's model-fallback policy instead.

use std::time::Duration;

use metrics::counter;
use tracing::{debug, instrument, warn};

use vox_core::metrics::{MODEL_ERRORS_TOTAL, MODEL_REQUESTS_TOTAL, MODEL_RETRIES_TOTAL};

use crate::TextModel;
use crate::error::ModelError;
use crate::types::{
    DEFAULT_BASE_URL, GenerateContentRequest, GenerateContentResponse, ListModelsResponse,
};

/// Per-request time budget.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Time budget for the diagnostic model-listing call.
const LIST_MODELS_TIMEOUT: Duration = Duration::from_secs(5);
/// Extra attempts after the first for transient failures.
const MAX_TRANSPORT_RETRIES: u32 = 2;
/// Linear backoff unit: 500 ms, then 1000 ms.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Gemini client configuration.
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API key passed as the `key` query parameter.
    pub api_key: String,
    /// Primary model id.
    pub model: String,
    /// Fallback model id, tried by the interpreter on timeout/404.
    pub fallback_model: String,
    /// Override for the API base URL (tests point this at a mock server).
    pub base_url: Option<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl GeminiConfig {
    /// Config with production defaults for the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gemini-2.0-flash".into(),
            fallback_model: "gemini-1.5-flash".into(),
            base_url: None,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Gemini text-generation client.
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a new client with a shared HTTP client.
    #[must_use]
    pub fn with_client(config: GeminiConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// One `generateContent` POST, no retries.
    async fn generate_once(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
        let url = format!(
            "{}/models/{model}:generateContent?key={}",
            self.base_url(),
            self.config.api_key
        );
        let request = GenerateContentRequest::single_turn(prompt);

        let response = self
            .client
            .post(&url)
            .timeout(self.config.request_timeout)
            .json(&request)
            .send()
            .await
            .map_err(ModelError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: parse_api_error(&body),
            });
        }

        let body: GenerateContentResponse =
            response.json().await.map_err(ModelError::from_transport)?;
        body.first_text()
            .map(str::to_owned)
            .ok_or(ModelError::EmptyCandidates)
    }

    /// Diagnostic: list available model names. Failures are the caller's to
    /// log and ignore — this call gates nothing.
    pub async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let url = format!("{}/models?key={}", self.base_url(), self.config.api_key);
        let response = self
            .client
            .get(&url)
            .timeout(LIST_MODELS_TIMEOUT)
            .send()
            .await
            .map_err(ModelError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: parse_api_error(&body),
            });
        }

        let body: ListModelsResponse = response.json().await.map_err(ModelError::from_transport)?;
        Ok(body.models.into_iter().map(|m| m.name).collect())
    }
}

/// Whether a failed attempt is worth a transport-level retry.
///
/// Connect-class errors, 429 and 5xx are transient. Timeouts are excluded:
/// the model-fallback policy handles those.
fn is_transient(err: &ModelError) -> bool {
    match err {
        ModelError::Api { status, .. } => *status == 429 || (500..=599).contains(status),
        ModelError::Http(e) => e.is_connect(),
        ModelError::Timeout | ModelError::EmptyCandidates => false,
    }
}

/// Pull the human-readable message out of a Gemini error body, falling back
/// to the raw body.
fn parse_api_error(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait::async_trait]
impl TextModel for GeminiClient {
    #[instrument(skip(self, prompt))]
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
        counter!(MODEL_REQUESTS_TOTAL, "model" => model.to_string()).increment(1);

        let mut attempt: u32 = 0;
        loop {
            match self.generate_once(model, prompt).await {
                Err(err) if attempt < MAX_TRANSPORT_RETRIES && is_transient(&err) => {
                    attempt += 1;
                    let delay = RETRY_BASE_DELAY * attempt;
                    counter!(MODEL_RETRIES_TOTAL, "model" => model.to_string()).increment(1);
                    warn!(model, %err, attempt, ?delay, "transient model error, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    counter!(MODEL_ERRORS_TOTAL, "model" => model.to_string()).increment(1);
                    return Err(err);
                }
                Ok(text) => {
                    debug!(model, chars = text.len(), "model responded");
                    return Ok(text);
                }
            }
        }
    }

    fn primary_model(&self) -> &str {
        &self.config.model
    }

    fn fallback_model(&self) -> &str {
        &self.config.fallback_model
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
