//! vox-server binary: load settings, wire the pipeline, serve HTTP.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use vox_agent::{Interpreter, PublicPersona, ReplyCache};
use vox_core::HistoryStore;
use vox_llm::{GeminiClient, GeminiConfig, TextModel};
use vox_server::routes::{AppState, router};
use vox_server::settings::{VoxSettings, load_settings, load_settings_from_path};
use vox_server::{metrics, settings};

/// Personal assistant backend.
#[derive(Debug, Parser)]
#[command(name = "vox-server", version, about)]
struct Cli {
    /// Listen port (overrides settings).
    #[arg(long)]
    port: Option<u16>,
    /// Path to a JSON settings file (default: ~/.vox/settings.json).
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Path to the SQLite database (overrides settings).
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = load(&cli)?;
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if let Some(db) = &cli.db {
        settings.storage.db_path = db.display().to_string();
    }

    let metrics_handle = metrics::install_recorder();

    let store = vox_store::SqliteStore::open(Path::new(&settings.storage.db_path))?;
    info!(db_path = %settings.storage.db_path, "store opened");

    if settings.gemini.api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set, model calls will fail");
    }
    let client = Arc::new(GeminiClient::new(gemini_config(&settings)));
    spawn_model_probe(&client);

    let cache = Arc::new(ReplyCache::new(Duration::from_secs(
        settings.assistant.cache_ttl_secs,
    )));
    let interpreter = Arc::new(
        Interpreter::new(
            Arc::clone(&client) as Arc<dyn TextModel>,
            Arc::new(store.clone()) as Arc<dyn HistoryStore>,
            cache,
        )
        .with_public_persona(PublicPersona {
            assistant_name: settings.assistant.default_assistant_name.clone(),
            user_name: settings.assistant.default_user_name.clone(),
        }),
    );

    let state = AppState {
        interpreter,
        store,
        metrics: Some(metrics_handle),
        start_time: Instant::now(),
    };

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, model = %settings.gemini.model, "vox server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

fn load(cli: &Cli) -> Result<VoxSettings, settings::SettingsError> {
    match &cli.settings {
        Some(path) => load_settings_from_path(path),
        None => load_settings(),
    }
}

fn gemini_config(settings: &VoxSettings) -> GeminiConfig {
    let mut config = GeminiConfig::new(settings.gemini.api_key.clone());
    config.model = settings.gemini.model.clone();
    config.fallback_model = settings.gemini.fallback_model.clone();
    config.base_url = settings.gemini.base_url.clone();
    config
}

/// Boot diagnostic: log which models the key can reach. Gates nothing.
fn spawn_model_probe(client: &Arc<GeminiClient>) {
    let client = Arc::clone(client);
    let _handle = tokio::spawn(async move {
        match client.list_models().await {
            Ok(models) => debug!(count = models.len(), "available models listed"),
            Err(err) => warn!(%err, "model listing failed"),
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
