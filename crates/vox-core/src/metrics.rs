//! Metric name constants, shared so producer crates cannot drift.

/// Model API requests total (counter, labels: model).
pub const MODEL_REQUESTS_TOTAL: &str = "model_requests_total";
/// Model transport retries total (counter, labels: model).
pub const MODEL_RETRIES_TOTAL: &str = "model_retries_total";
/// Model request failures total (counter, labels: model).
pub const MODEL_ERRORS_TOTAL: &str = "model_errors_total";
/// Primary→fallback model switches total (counter).
pub const MODEL_FALLBACKS_TOTAL: &str = "model_fallbacks_total";
/// Reply cache hits total (counter).
pub const REPLY_CACHE_HITS_TOTAL: &str = "reply_cache_hits_total";
/// Reply cache lazy expirations total (counter).
pub const REPLY_CACHE_EXPIRATIONS_TOTAL: &str = "reply_cache_expirations_total";
/// Short-circuit replies total (counter).
pub const INTERPRETER_SHORT_CIRCUITS_TOTAL: &str = "interpreter_short_circuits_total";
/// Degraded replies total (counter, labels: reason).
pub const INTERPRETER_DEGRADED_REPLIES_TOTAL: &str = "interpreter_degraded_replies_total";
/// Fire-and-forget history append failures total (counter).
pub const HISTORY_APPEND_FAILURES_TOTAL: &str = "history_append_failures_total";
