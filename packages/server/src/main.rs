//! StudyForge HTTP server binary
//!
//! # Environment Variables
//!
//! See [`studyforge_server::config`] for the full list. The most common:
//!
//! - `STUDYFORGE_PORT`: Server port (default: 3001)
//! - `STUDYFORGE_DB_PATH`: Database file
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use std::sync::Arc;

use studyforge_core::{DatabaseService, TursoStore};
use studyforge_server::clients::{
    build_http_client, GoogleSpeechClient, OpenAiChatClient, SupabaseStorage,
};
use studyforge_server::config::ServerConfig;
use studyforge_server::{create_router, start_server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("StudyForge server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env()?;
    tracing::info!("Database: {}", config.db_path.display());

    let db = Arc::new(DatabaseService::new(config.db_path.clone()).await?);
    let store = Arc::new(TursoStore::new(db));

    let http = build_http_client(config.http_timeout);
    if config.chat.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; speech feedback is disabled");
    }
    if config.speech.api_key.is_none() {
        tracing::warn!("TTS_API_KEY not set; text-to-speech is disabled");
    }
    if config.storage.base_url.is_none() || config.storage.api_key.is_none() {
        tracing::warn!("STORAGE_URL/STORAGE_API_KEY not set; audio upload is disabled");
    }

    let state = AppState::new(
        store,
        Arc::new(OpenAiChatClient::new(http.clone(), config.chat.clone())),
        Arc::new(GoogleSpeechClient::new(http.clone(), config.speech.clone())),
        Arc::new(SupabaseStorage::new(http, config.storage.clone())),
    );

    let app = create_router(state, &config.cors_origins);
    start_server(app, &config.socket_address()).await
}
