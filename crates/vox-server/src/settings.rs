//! Layered configuration.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`VoxSettings::default()`]
//! 2. **JSON file** — `~/.vox/settings.json` or `--settings <path>`,
//!    deep-merged over defaults (camelCase keys)
//! 3. **Environment variables** — `VOX_*` overrides (highest priority)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Settings-loading errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File read failure.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parse/shape failure.
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// HTTP listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

/// Gemini API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeminiSettings {
    /// API key (usually supplied via `GEMINI_API_KEY`).
    pub api_key: String,
    /// Primary model id.
    pub model: String,
    /// Fallback model id, tried on timeout/404.
    pub fallback_model: String,
    /// Base URL override (testing / proxies).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash".into(),
            fallback_model: "gemini-1.5-flash".into(),
            base_url: None,
        }
    }
}

/// Assistant behavior settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistantSettings {
    /// Assistant name for the unauthenticated path.
    pub default_assistant_name: String,
    /// User name for the unauthenticated path.
    pub default_user_name: String,
    /// Reply cache TTL in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            default_assistant_name: "Assistant".into(),
            default_user_name: "friend".into(),
            cache_ttl_secs: 300,
        }
    }
}

/// Storage settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// SQLite database path.
    pub db_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: "vox.db".into(),
        }
    }
}

/// Top-level settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoxSettings {
    /// HTTP listener.
    pub server: ServerSettings,
    /// Gemini API.
    pub gemini: GeminiSettings,
    /// Assistant behavior.
    pub assistant: AssistantSettings,
    /// Storage.
    pub storage: StorageSettings,
}

/// Resolve the default settings file path (`~/.vox/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".vox").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<VoxSettings, SettingsError> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<VoxSettings, SettingsError> {
    let defaults = serde_json::to_value(VoxSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: VoxSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides. Invalid values are silently ignored
/// so a typo falls back to the file/default layer instead of crashing boot.
pub fn apply_env_overrides(settings: &mut VoxSettings) {
    if let Some(v) = read_env_string("VOX_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("VOX_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = read_env_string("GEMINI_API_KEY") {
        settings.gemini.api_key = v;
    }
    if let Some(v) = read_env_string("VOX_GEMINI_MODEL") {
        settings.gemini.model = v;
    }
    if let Some(v) = read_env_string("VOX_GEMINI_FALLBACK_MODEL") {
        settings.gemini.fallback_model = v;
    }
    if let Some(v) = read_env_string("VOX_GEMINI_BASE_URL") {
        settings.gemini.base_url = Some(v);
    }
    if let Some(v) = read_env_u64("VOX_CACHE_TTL_SECS", 1, 86_400) {
        settings.assistant.cache_ttl_secs = v;
    }
    if let Some(v) = read_env_string("VOX_DB_PATH") {
        settings.storage.db_path = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_u16_range(&v, min, max))
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_u64_range(&v, min, max))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
