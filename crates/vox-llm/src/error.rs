//! Model client error taxonomy.

/// Error from a text-generation call.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The request exceeded its time budget.
    #[error("model request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("model API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body, or the raw body.
        message: String,
    },

    /// Transport-level failure (connect, TLS, protocol).
    #[error("model transport error: {0}")]
    Http(reqwest::Error),

    /// The API answered 200 but carried no generated text.
    #[error("model returned no candidates")]
    EmptyCandidates,
}

impl ModelError {
    /// Classify a reqwest error, separating timeouts from other transport
    /// failures so the fallback policy can distinguish them.
    #[must_use]
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout
        } else {
            ModelError::Http(err)
        }
    }

    /// True when the call timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ModelError::Timeout)
    }

    /// True when the API reported the model id as unknown.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::Api { status: 404, .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
