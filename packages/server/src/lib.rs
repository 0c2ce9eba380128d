//! StudyForge HTTP API
//!
//! Exposes the core services as a JSON REST API. Routes are grouped into
//! endpoint modules that are merged into one router:
//!
//! - `node_endpoints`: study hierarchy, notes and mastery
//! - `session_endpoints`: speaking practice history
//! - `fitness_endpoints`: profile, weight log and workouts
//! - `media_endpoints`: AI feedback, text-to-speech and recording upload
//!
//! # Usage
//!
//! ```bash
//! STUDYFORGE_PORT=3001 RUST_LOG=debug cargo run --bin studyforge-server
//! ```

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use studyforge_core::{FitnessService, NodeService, SessionService, TursoStore};

pub mod clients;
pub mod config;
mod endpoints;
mod http_error;

pub use http_error::HttpError;

use clients::{ChatClient, ObjectStorage, SpeechClient};

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub node_service: NodeService,
    pub session_service: SessionService,
    pub fitness_service: FitnessService,
    pub chat: Arc<dyn ChatClient>,
    pub speech: Arc<dyn SpeechClient>,
    pub storage: Arc<dyn ObjectStorage>,
}

impl AppState {
    /// Wire every service to the same store
    pub fn new(
        store: Arc<TursoStore>,
        chat: Arc<dyn ChatClient>,
        speech: Arc<dyn SpeechClient>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            node_service: NodeService::new(store.clone()),
            session_service: SessionService::new(store.clone()),
            fitness_service: FitnessService::new(store),
            chat,
            speech,
            storage,
        }
    }
}

/// Create the application router with all endpoint modules
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(endpoints::node_endpoints::routes(state.clone()))
        .merge(endpoints::session_endpoints::routes(state.clone()))
        .merge(endpoints::fitness_endpoints::routes(state.clone()))
        .merge(endpoints::media_endpoints::routes(state))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Browser access is limited to the configured origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(false)
}

/// Bind `address` and serve until Ctrl+C or SIGTERM
///
/// # Errors
///
/// Returns error if the listener cannot bind or the server fails.
pub async fn start_server(app: Router, address: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!("HTTP server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
