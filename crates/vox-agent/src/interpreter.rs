//! Command interpreter — the pipeline orchestrator.
//!
//! Per invocation the interpreter walks
//! `Received → (ShortCircuit | CacheHit | ModelCall) → Extracted → Overridden
//! → Persisted → Returned`. Every failure past validation degrades into a
//! valid reply; the only hard error is an empty command. History persistence
//! is fire-and-forget: append failures are logged and counted, never
//! surfaced.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use vox_core::metrics::{
    HISTORY_APPEND_FAILURES_TOTAL, INTERPRETER_DEGRADED_REPLIES_TOTAL,
    INTERPRETER_SHORT_CIRCUITS_TOTAL, MODEL_FALLBACKS_TOTAL,
};
use vox_core::{HistoryEntry, HistoryStore, IntentKind, ParsedReply};
use vox_llm::{ModelError, TextModel};

use crate::cache::ReplyCache;
use crate::extract::extract_reply;
use crate::prompt::{HISTORY_WINDOW, build_prompt};

/// Fixed phrase answered without a model call: creator attribution.
const CREATOR_TRIGGER: &str = "who created you";
/// Fixed phrase answered without a model call: direct YouTube open.
const OPEN_YOUTUBE_TRIGGER: &str = "open youtube";

const APOLOGY_TIMEOUT: &str =
    "Sorry, the AI service is taking too long to respond. Please try again.";
const APOLOGY_UNAVAILABLE: &str = "Sorry, I'm temporarily unavailable.";
const APOLOGY_CONNECTION: &str = "Error connecting to AI service. Please try again.";
const APOLOGY_UNPARSEABLE: &str = "Sorry, I couldn't understand that.";

/// Hard errors from interpretation. Everything else degrades into a reply.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InterpretError {
    /// The command was empty or whitespace-only.
    #[error("command must not be empty")]
    EmptyCommand,
}

/// One authenticated interpretation request.
#[derive(Clone, Debug)]
pub struct AskRequest {
    /// Session owning the history this exchange joins.
    pub session_id: String,
    /// Raw command text.
    pub command: String,
    /// The session user's display name (creator attribution, prompt persona).
    pub user_name: String,
    /// The assistant's configured name.
    pub assistant_name: String,
}

/// Where the returned reply came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplySource {
    /// Fixed-phrase match, zero model calls.
    ShortCircuit,
    /// Live cache entry, zero model calls.
    Cache,
    /// Fresh model call, successfully extracted.
    Model,
    /// Locally synthesized after model/parse failure.
    Degraded,
}

/// The interpreter's result for the authenticated path.
#[derive(Clone, Debug)]
pub struct Interpretation {
    /// The validated reply; `response` is always non-empty.
    pub reply: ParsedReply,
    /// Received → Returned latency. Observability only.
    pub elapsed_ms: u64,
    /// Provenance of the reply.
    pub source: ReplySource,
}

/// Narrow result shape for the unauthenticated path.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicReply {
    /// The text to speak or display.
    pub response: String,
    /// The intent wire tag, for the client to act on.
    pub action_hint: String,
}

/// Default persona for the unauthenticated path.
#[derive(Clone, Debug)]
pub struct PublicPersona {
    /// Assistant name used when no session exists.
    pub assistant_name: String,
    /// User name used when no session exists.
    pub user_name: String,
}

impl Default for PublicPersona {
    fn default() -> Self {
        Self {
            assistant_name: "Assistant".into(),
            user_name: "friend".into(),
        }
    }
}

/// The command interpreter.
///
/// Holds the model client behind [`TextModel`] (fallback policy lives here,
/// not in the client), the process-wide reply cache, and the history store.
pub struct Interpreter {
    model: Arc<dyn TextModel>,
    history: Arc<dyn HistoryStore>,
    cache: Arc<ReplyCache>,
    public_persona: PublicPersona,
}

impl Interpreter {
    /// Create a new interpreter.
    pub fn new(
        model: Arc<dyn TextModel>,
        history: Arc<dyn HistoryStore>,
        cache: Arc<ReplyCache>,
    ) -> Self {
        Self {
            model,
            history,
            cache,
            public_persona: PublicPersona::default(),
        }
    }

    /// Override the default persona used by the unauthenticated path.
    #[must_use]
    pub fn with_public_persona(mut self, persona: PublicPersona) -> Self {
        self.public_persona = persona;
        self
    }

    /// Interpret one command for an established session.
    #[instrument(skip(self, req), fields(session_id = %req.session_id))]
    pub async fn interpret(&self, req: &AskRequest) -> Result<Interpretation, InterpretError> {
        let started = Instant::now();
        let command = req.command.trim();
        if command.is_empty() {
            return Err(InterpretError::EmptyCommand);
        }

        let (mut reply, source) = if let Some(reply) = self.short_circuit(command, &req.user_name)
        {
            counter!(INTERPRETER_SHORT_CIRCUITS_TOTAL).increment(1);
            (reply, ReplySource::ShortCircuit)
        } else if let Some(reply) = self.cache.get(command) {
            (reply, ReplySource::Cache)
        } else {
            self.resolve_via_model(command, &req.assistant_name, &req.user_name, Some(&req.session_id))
                .await
        };

        // Calendar kinds always speak locally computed time, even from cache.
        apply_calendar_override(&mut reply, Local::now());

        self.submit_history_append(&req.session_id, command, &reply);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(intent = %reply.intent, ?source, elapsed_ms, "command interpreted");
        Ok(Interpretation {
            reply,
            elapsed_ms,
            source,
        })
    }

    /// Interpret one command with no session: fixed persona, no history, no
    /// short-circuits, no calendar overrides. Shares the process-wide cache.
    #[instrument(skip(self, command))]
    pub async fn interpret_public(&self, command: &str) -> Result<PublicReply, InterpretError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(InterpretError::EmptyCommand);
        }

        let (reply, _) = if let Some(reply) = self.cache.get(command) {
            (reply, ReplySource::Cache)
        } else {
            let persona = self.public_persona.clone();
            self.resolve_via_model(command, &persona.assistant_name, &persona.user_name, None)
                .await
        };

        Ok(PublicReply {
            response: reply.response,
            action_hint: reply.intent.as_tag().to_owned(),
        })
    }

    /// Fixed-phrase matches that bypass the model: common, latency-sensitive
    /// commands with one deterministic correct answer the model tends to get
    /// wrong (it attributes its creation to the platform vendor).
    fn short_circuit(&self, command: &str, user_name: &str) -> Option<ParsedReply> {
        let normalized = command.to_lowercase();
        if normalized.contains(CREATOR_TRIGGER) {
            return Some(ParsedReply::general(
                command,
                format!("{user_name} created me."),
            ));
        }
        if normalized.contains(OPEN_YOUTUBE_TRIGGER) {
            return Some(ParsedReply {
                intent: IntentKind::YoutubePlay,
                user_input: command.to_owned(),
                response: "Opening YouTube in browser.".into(),
                search_query: Some("youtube".into()),
            });
        }
        None
    }

    /// ModelCall + Extracted: prompt → model (with fallback) → extraction.
    /// Every failure returns a degraded reply instead of an error.
    async fn resolve_via_model(
        &self,
        command: &str,
        assistant_name: &str,
        user_name: &str,
        session_id: Option<&str>,
    ) -> (ParsedReply, ReplySource) {
        let recent = match session_id {
            Some(sid) => match self.history.load(sid, HISTORY_WINDOW).await {
                Ok(entries) => entries,
                Err(err) => {
                    // Context is best-effort; interpret without it.
                    warn!(%err, session_id = sid, "history load failed, proceeding without context");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let prompt = build_prompt(command, assistant_name, user_name, &recent);

        let raw = match self.call_with_fallback(&prompt).await {
            Ok(raw) => raw,
            Err(err) => {
                counter!(INTERPRETER_DEGRADED_REPLIES_TOTAL, "reason" => "model").increment(1);
                return (degraded_reply(command, &err), ReplySource::Degraded);
            }
        };

        let Some(mut reply) = extract_reply(&raw) else {
            warn!(raw_len = raw.len(), "model output had no parseable reply");
            counter!(INTERPRETER_DEGRADED_REPLIES_TOTAL, "reason" => "parse").increment(1);
            return (
                ParsedReply::general(command, APOLOGY_UNPARSEABLE),
                ReplySource::Degraded,
            );
        };

        // The caller's text is authoritative over the model's echo.
        reply.user_input = command.to_owned();

        self.cache.insert(command, reply.clone());
        (reply, ReplySource::Model)
    }

    /// Primary model, then one retry against the fallback model on timeout or
    /// unknown-model (404). When the fallback also fails, the PRIMARY error
    /// classifies the apology — the user asked the primary model a question.
    async fn call_with_fallback(&self, prompt: &str) -> Result<String, ModelError> {
        let primary = self.model.primary_model().to_owned();
        let primary_err = match self.model.generate(&primary, prompt).await {
            Ok(raw) => return Ok(raw),
            Err(err) if err.is_timeout() || err.is_not_found() => err,
            Err(err) => return Err(err),
        };

        let fallback = self.model.fallback_model().to_owned();
        counter!(MODEL_FALLBACKS_TOTAL).increment(1);
        warn!(%primary_err, primary, fallback, "primary model failed, trying fallback");

        match self.model.generate(&fallback, prompt).await {
            Ok(raw) => Ok(raw),
            Err(fallback_err) => {
                warn!(%fallback_err, fallback, "fallback model also failed");
                Err(primary_err)
            }
        }
    }

    /// Persisted: fire-and-forget append. The returned payload never waits on
    /// durability; failures are logged and counted.
    fn submit_history_append(&self, session_id: &str, command: &str, reply: &ParsedReply) {
        let entry = HistoryEntry::new(command, reply.response.clone(), reply.intent);
        let store = Arc::clone(&self.history);
        let session_id = session_id.to_owned();
        let _handle = tokio::spawn(async move {
            if let Err(err) = store.append(&session_id, entry).await {
                counter!(HISTORY_APPEND_FAILURES_TOTAL).increment(1);
                warn!(%err, session_id, "history append failed");
            } else {
                debug!(session_id, "history entry appended");
            }
        });
    }
}

/// Replace the model's text for calendar kinds with a locally computed
/// string. The model cannot know the server's wall-clock time.
fn apply_calendar_override(reply: &mut ParsedReply, now: DateTime<Local>) {
    let text = match reply.intent {
        IntentKind::GetDate => format!("current date is {}", now.format("%Y-%m-%d")),
        IntentKind::GetTime => format!("current time is {}", now.format("%I:%M %p")),
        IntentKind::GetDay => format!("today is {}", now.format("%A")),
        IntentKind::GetMonth => format!("today is {}", now.format("%B")),
        _ => return,
    };
    reply.response = text;
}

/// Map a final model error to its user-facing apology.
fn degraded_reply(command: &str, err: &ModelError) -> ParsedReply {
    let apology = if err.is_timeout() {
        APOLOGY_TIMEOUT
    } else if err.is_not_found() {
        APOLOGY_UNAVAILABLE
    } else {
        APOLOGY_CONNECTION
    };
    ParsedReply::general(command, apology)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
