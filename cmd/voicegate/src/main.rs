//! voicegate - speaker verification service.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voicegate::config::{Config, ModelBackend, Overrides};
use voicegate::{AppState, server};

/// Speaker verification service.
///
/// Settings are read from the YAML file given by --config, then overridden by
/// flags or their VOICEGATE_* environment variables.
#[derive(Parser, Debug)]
#[command(name = "voicegate")]
#[command(about = "Speaker verification HTTP service")]
#[command(version)]
struct Args {
    /// YAML config file
    #[arg(short, long, env = "VOICEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (e.g. :5000, 127.0.0.1:8080)
    #[arg(long, env = "VOICEGATE_LISTEN")]
    listen: Option<String>,

    /// Directory of registered speaker audio
    #[arg(long, env = "VOICEGATE_REGISTRY_DIR")]
    registry_dir: Option<PathBuf>,

    /// Default verification threshold in [0, 1]
    #[arg(long, env = "VOICEGATE_THRESHOLD")]
    threshold: Option<f32>,

    /// Minimum audio duration in seconds
    #[arg(long, env = "VOICEGATE_MIN_SECONDS")]
    min_seconds: Option<f32>,

    /// Embedding model backend
    #[arg(long, value_enum, env = "VOICEGATE_MODEL")]
    model: Option<ModelBackend>,

    /// Inference endpoint for the remote backend
    #[arg(long, env = "VOICEGATE_MODEL_URL")]
    model_url: Option<String>,

    /// API key for the remote backend ($VAR references are expanded)
    #[arg(long, env = "VOICEGATE_MODEL_API_KEY", hide_env_values = true)]
    model_api_key: Option<String>,

    /// ffmpeg executable for non-WAV uploads
    #[arg(long, env = "VOICEGATE_FFMPEG")]
    ffmpeg: Option<String>,

    /// Per-request extraction deadline in seconds
    #[arg(long, env = "VOICEGATE_EXTRACT_TIMEOUT")]
    extract_timeout: Option<u64>,

    /// Per-file upload limit in bytes
    #[arg(long, env = "VOICEGATE_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            listen: self.listen.clone(),
            registry_dir: self.registry_dir.clone(),
            threshold: self.threshold,
            min_seconds: self.min_seconds,
            model: self.model,
            model_url: self.model_url.clone(),
            model_api_key: self.model_api_key.clone(),
            ffmpeg_path: self.ffmpeg.clone(),
            extract_timeout_secs: self.extract_timeout,
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = Config::load(args.config.as_deref())?;
    config.apply(args.overrides());
    config.validate().context("invalid configuration")?;

    if args.print_config {
        let mut shown = config.clone();
        if shown.model.remote.api_key.is_some() {
            shown.model.remote.api_key = Some("<redacted>".to_string());
        }
        print!("{}", serde_yaml::to_string(&shown)?);
        return Ok(());
    }

    if config.model.backend == ModelBackend::Stub {
        warn!("using the stub model: scores carry no speaker information");
    }
    let model = config.model.build().context("build model")?;
    info!(
        backend = ?config.model.backend,
        dimension = model.dimension(),
        registry = %config.registry_dir.display(),
        "model ready"
    );

    let state = AppState::new(config, model)?;
    server::serve(state, shutdown_signal()).await
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "voicegate=debug,voicegate_voiceprint=debug,voicegate_audio=debug,tower_http=debug"
    } else {
        "voicegate=info,voicegate_voiceprint=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
