//! Axum router and handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use vox_agent::{AskRequest, Interpreter, PublicReply};
use vox_core::{HistoryEntry, ParsedReply};
use vox_store::SqliteStore;

use crate::error::ApiError;
use crate::metrics;

/// Shared state accessible from handlers.
#[derive(Clone)]
pub struct AppState {
    /// The command interpreter.
    pub interpreter: Arc<Interpreter>,
    /// Session + history store.
    pub store: SqliteStore,
    /// Prometheus render handle; `None` when no recorder is installed (tests).
    pub metrics: Option<PrometheusHandle>,
    /// When the server started.
    pub start_time: Instant,
}

/// Build the router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}/history", get(session_history))
        .route("/api/assistant/ask", post(ask))
        .route("/api/assistant/ask-public", post(ask_public))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Request/response shapes ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AskBody {
    session_id: String,
    command: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AskResponse {
    #[serde(flatten)]
    reply: ParsedReply,
    elapsed_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicAskBody {
    command: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionBody {
    user_name: String,
    assistant_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    session_id: String,
    entries: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/assistant/ask
async fn ask(
    State(state): State<AppState>,
    Json(body): Json<AskBody>,
) -> Result<Json<AskResponse>, ApiError> {
    // Identity is resolved before any interpretation work.
    let session = state
        .store
        .get_session(&body.session_id)
        .await?
        .ok_or_else(|| ApiError::UnknownSession(body.session_id.clone()))?;

    let req = AskRequest {
        session_id: session.id,
        command: body.command,
        user_name: session.user_name,
        assistant_name: session.assistant_name,
    };
    let out = state.interpreter.interpret(&req).await?;
    Ok(Json(AskResponse {
        reply: out.reply,
        elapsed_ms: out.elapsed_ms,
    }))
}

/// POST /api/assistant/ask-public
async fn ask_public(
    State(state): State<AppState>,
    Json(body): Json<PublicAskBody>,
) -> Result<Json<PublicReply>, ApiError> {
    let reply = state.interpreter.interpret_public(&body.command).await?;
    Ok(Json(reply))
}

/// POST /api/sessions
async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .store
        .create_session(&body.user_name, &body.assistant_name)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/sessions/{id}/history
async fn session_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let entries = state.store.session_history(&id).await?;
    Ok(Json(HistoryResponse {
        session_id: id,
        entries,
    }))
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
async fn metrics_text(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, metrics::render(handle)).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed",
        )
            .into_response(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use vox_agent::ReplyCache;
    use vox_agent::cache::DEFAULT_TTL;
    use vox_core::{HistoryStore, IntentKind};
    use vox_llm::{ModelError, TextModel};

    /// Model that answers every call with the same scripted JSON.
    struct FixedModel {
        body: Mutex<String>,
    }

    impl FixedModel {
        fn new(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: Mutex::new(body.to_owned()),
            })
        }
    }

    #[async_trait]
    impl TextModel for FixedModel {
        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ModelError> {
            Ok(self.body.lock().unwrap().clone())
        }

        fn primary_model(&self) -> &str {
            "gemini-2.0-flash"
        }

        fn fallback_model(&self) -> &str {
            "gemini-1.5-flash"
        }
    }

    fn app(model_body: &str) -> (TempDir, SqliteStore, Router) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("vox.db")).unwrap();
        let interpreter = Arc::new(Interpreter::new(
            FixedModel::new(model_body) as Arc<dyn TextModel>,
            Arc::new(store.clone()) as Arc<dyn HistoryStore>,
            Arc::new(ReplyCache::new(DEFAULT_TTL)),
        ));
        let state = AppState {
            interpreter,
            store: store.clone(),
            metrics: None,
            start_time: Instant::now(),
        };
        (dir, store, router(state))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const MODEL_REPLY: &str =
        r#"{"type":"general","userInput":"hi","response":"Hello there."}"#;

    async fn create_test_session(app: &Router) -> String {
        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/sessions",
                serde_json::json!({"userName": "Sam", "assistantName": "Friday"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        body["id"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (_dir, _store, app) = app(MODEL_REPLY);
        let resp = app.oneshot(get_req("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert!(body["uptime_secs"].is_number());
    }

    #[tokio::test]
    async fn create_session_returns_camel_case_row() {
        let (_dir, _store, app) = app(MODEL_REPLY);
        let resp = app
            .oneshot(post_json(
                "/api/sessions",
                serde_json::json!({"userName": "Sam", "assistantName": "Friday"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert!(body["id"].as_str().unwrap().starts_with("ses_"));
        assert_eq!(body["userName"], "Sam");
        assert_eq!(body["assistantName"], "Friday");
        assert!(body["createdAt"].is_string());
    }

    #[tokio::test]
    async fn ask_returns_full_result_shape() {
        let (_dir, _store, app) = app(MODEL_REPLY);
        let sid = create_test_session(&app).await;

        let resp = app
            .oneshot(post_json(
                "/api/assistant/ask",
                serde_json::json!({"sessionId": sid, "command": "hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["type"], "general");
        assert_eq!(body["userInput"], "hi");
        assert_eq!(body["response"], "Hello there.");
        assert!(body["elapsedMs"].is_number());
        assert!(body.get("searchQuery").is_none());
    }

    #[tokio::test]
    async fn ask_unknown_session_is_404() {
        let (_dir, _store, app) = app(MODEL_REPLY);
        let resp = app
            .oneshot(post_json(
                "/api/assistant/ask",
                serde_json::json!({"sessionId": "ses_missing", "command": "hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("unknown session"));
    }

    #[tokio::test]
    async fn ask_empty_command_is_400() {
        let (_dir, _store, app) = app(MODEL_REPLY);
        let sid = create_test_session(&app).await;
        let resp = app
            .oneshot(post_json(
                "/api/assistant/ask",
                serde_json::json!({"sessionId": sid, "command": "   "}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ask_public_returns_narrow_shape() {
        let reply =
            r#"{"type":"google-search","userInput":"x","response":"Searching.","searchQuery":"x"}"#;
        let (_dir, _store, app) = app(reply);
        let resp = app
            .oneshot(post_json(
                "/api/assistant/ask-public",
                serde_json::json!({"command": "search x"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["response"], "Searching.");
        assert_eq!(body["actionHint"], "google-search");
        // The narrow shape carries nothing else.
        assert!(body.get("userInput").is_none());
    }

    #[tokio::test]
    async fn history_endpoint_lists_entries() {
        let (_dir, store, app) = app(MODEL_REPLY);
        let sid = create_test_session(&app).await;

        store
            .append(
                &sid,
                HistoryEntry::new("what time is it", "current time is 03:15 PM", IntentKind::GetTime),
            )
            .await
            .unwrap();

        let resp = app
            .oneshot(get_req(&format!("/api/sessions/{sid}/history")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["sessionId"], sid);
        assert_eq!(body["entries"][0]["command"], "what time is it");
        assert_eq!(body["entries"][0]["type"], "get-time");
    }

    #[tokio::test]
    async fn history_unknown_session_is_404() {
        let (_dir, _store, app) = app(MODEL_REPLY);
        let resp = app
            .oneshot(get_req("/api/sessions/ses_missing/history"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_unavailable_without_recorder() {
        let (_dir, _store, app) = app(MODEL_REPLY);
        let resp = app.oneshot(get_req("/metrics")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (_dir, _store, app) = app(MODEL_REPLY);
        let resp = app.oneshot(get_req("/nonexistent")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
