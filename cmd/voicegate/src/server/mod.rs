//! HTTP server setup and routing.
//!
//! API endpoints:
//! - GET    /health                     - liveness and registered speaker count
//! - POST   /embed                      - raw PCM (base64) -> embedding (base64)
//! - POST   /verify                     - raw PCM vs candidate embeddings -> best index
//! - POST   /verify-files               - two uploaded files -> same speaker?
//! - POST   /register                   - store an uploaded speaker sample
//! - GET    /registered                 - list registered speakers
//! - DELETE /delete/{filename}          - remove a registered speaker
//! - POST   /verify-against-registered  - rank an upload against the registry

mod embed;
mod form;
mod speakers;
mod verify;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{delete, get, post},
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use voicegate_voiceprint::{Embedding, Verifier, VoiceprintModel};

use crate::config::Config;
use crate::error::ApiError;
use crate::registry::DirRegistry;
use crate::transcode::{FfmpegTranscoder, Transcoder};
use crate::upload::Upload;

pub use form::Form;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub verifier: Arc<Verifier>,
    pub registry: Arc<DirRegistry>,
    pub transcoder: Arc<dyn Transcoder>,
}

impl AppState {
    /// Builds the state around an already constructed model.
    pub fn new(config: Config, model: Arc<dyn VoiceprintModel>) -> Result<Self> {
        let transcoder = Arc::new(FfmpegTranscoder::new(config.ffmpeg_path.clone()));
        Self::with_transcoder(config, model, transcoder)
    }

    pub fn with_transcoder(
        config: Config,
        model: Arc<dyn VoiceprintModel>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Result<Self> {
        config.validate()?;
        let verifier = Verifier::new(model, config.verifier.clone())?;
        let registry = DirRegistry::open(&config.registry_dir)?;
        Ok(Self {
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            registry: Arc::new(registry),
            transcoder,
        })
    }

    /// Runs blocking work (transcoding, extraction, registry I/O) on the
    /// blocking pool under the configured deadline.
    ///
    /// On timeout the task keeps running to completion in the background;
    /// only the response is abandoned.
    pub async fn run_blocking<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&AppState) -> Result<T, ApiError> + Send + 'static,
    {
        let state = self.clone();
        let secs = self.config.extract_timeout_secs;
        let task = tokio::task::spawn_blocking(move || f(&state));
        match tokio::time::timeout(Duration::from_secs(secs), task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ApiError::Internal(format!("worker failed: {e}"))),
            Err(_) => Err(ApiError::Timeout(secs)),
        }
    }

    /// Decodes an upload and computes its embedding. Blocking.
    pub fn embed_upload(&self, upload: &Upload) -> Result<Embedding, ApiError> {
        let (_, audio) = upload.decode(self.transcoder.as_ref())?;
        Ok(self
            .verifier
            .embed_samples(&audio.samples, audio.format.sample_rate)?)
    }
}

/// Builds the router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Two files plus form fields fit.
    let body_limit = state.config.max_upload_bytes * 2 + 64 * 1024;

    Router::new()
        .route("/health", get(health))
        .route("/embed", post(embed::embed))
        .route("/verify", post(embed::verify))
        .route("/verify-files", post(verify::verify_files))
        .route("/register", post(speakers::register))
        .route("/registered", get(speakers::list))
        .route("/delete/{filename}", delete(speakers::delete))
        .route("/verify-against-registered", post(verify::verify_against_registered))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until `shutdown` resolves.
pub async fn serve<S>(state: AppState, shutdown: S) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = state.config.listen_addr()?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "voicegate listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("voicegate stopped");
    Ok(())
}

/// Rounds a score for presentation. Ordering always uses the raw score.
pub(crate) fn round4(score: f32) -> f32 {
    ((score as f64 * 10_000.0).round() / 10_000.0) as f32
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    registered_speakers: usize,
    embedding_dimension: usize,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let registered_speakers = state.run_blocking(|s| Ok(s.registry.count()?)).await?;
    Ok(Json(HealthResponse {
        status: "healthy",
        message: "Speaker Verification API is running",
        registered_speakers,
        embedding_dimension: state.verifier.dimension(),
    }))
}
