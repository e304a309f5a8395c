//! Service configuration.
//!
//! Loaded from an optional YAML file, then overridden field by field from
//! the command line (each flag also reads a `VOICEGATE_*` environment
//! variable), then validated before the server binds.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voicegate_voiceprint::{
    RemoteModel, RemoteModelConfig, STUB_DIMENSION, StubModel, VerifierConfig, VoiceprintModel,
};

/// Default per-file upload limit (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which extractor backs the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// Deterministic fake extractor; carries no speaker information.
    #[default]
    Stub,
    /// HTTP inference service.
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: ModelBackend,
    /// Embedding dimension of the stub backend.
    pub stub_dimension: usize,
    pub remote: RemoteModelConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: ModelBackend::Stub,
            stub_dimension: STUB_DIMENSION,
            remote: RemoteModelConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Constructs the configured extractor. Called once at startup.
    pub fn build(&self) -> Result<Arc<dyn VoiceprintModel>, ConfigError> {
        match self.backend {
            ModelBackend::Stub => Ok(Arc::new(StubModel::new(self.stub_dimension))),
            ModelBackend::Remote => {
                let mut cfg = self.remote.clone();
                cfg.api_key = cfg.api_key.as_deref().map(expand_env).filter(|k| !k.is_empty());
                let model =
                    RemoteModel::new(cfg).map_err(|e| ConfigError::Invalid(e.to_string()))?;
                Ok(Arc::new(model))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listen address; a leading `:` binds all interfaces (default: ":5000").
    pub listen: String,
    /// Directory holding registered audio and `metadata.json`.
    pub registry_dir: PathBuf,
    /// Per-file upload limit in bytes.
    pub max_upload_bytes: usize,
    /// Deadline for one request's blocking work (transcode + extraction).
    pub extract_timeout_secs: u64,
    /// `ffmpeg` executable used for non-WAV uploads.
    pub ffmpeg_path: String,
    /// Sample rate assumed for raw PCM when a request omits it.
    pub default_pcm_rate: u32,
    pub model: ModelConfig,
    pub verifier: VerifierConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ":5000".to_string(),
            registry_dir: PathBuf::from("registered-audios"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            extract_timeout_secs: 30,
            ffmpeg_path: "ffmpeg".to_string(),
            default_pcm_rate: 16000,
            model: ModelConfig::default(),
            verifier: VerifierConfig::default(),
        }
    }
}

/// Values taken from flags or the environment. `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<String>,
    pub registry_dir: Option<PathBuf>,
    pub threshold: Option<f32>,
    pub min_seconds: Option<f32>,
    pub model: Option<ModelBackend>,
    pub model_url: Option<String>,
    pub model_api_key: Option<String>,
    pub ffmpeg_path: Option<String>,
    pub extract_timeout_secs: Option<u64>,
    pub max_upload_bytes: Option<usize>,
}

impl Config {
    /// Reads `path` if given, otherwise starts from the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(data: &[u8]) -> Result<Self, serde_yaml::Error> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_yaml::from_slice(data)
    }

    pub fn apply(&mut self, o: Overrides) {
        if let Some(v) = o.listen {
            self.listen = v;
        }
        if let Some(v) = o.registry_dir {
            self.registry_dir = v;
        }
        if let Some(v) = o.threshold {
            self.verifier.threshold = v;
        }
        if let Some(v) = o.min_seconds {
            self.verifier.min_seconds = v;
        }
        if let Some(v) = o.model {
            self.model.backend = v;
        }
        if let Some(v) = o.model_url {
            self.model.remote.url = v;
        }
        if let Some(v) = o.model_api_key {
            self.model.remote.api_key = Some(v);
        }
        if let Some(v) = o.ffmpeg_path {
            self.ffmpeg_path = v;
        }
        if let Some(v) = o.extract_timeout_secs {
            self.extract_timeout_secs = v;
        }
        if let Some(v) = o.max_upload_bytes {
            self.max_upload_bytes = v;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        self.verifier
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be positive".into()));
        }
        if self.extract_timeout_secs == 0 {
            return Err(ConfigError::Invalid("extract_timeout_secs must be positive".into()));
        }
        let accepted = self.verifier.min_source_rate..=self.verifier.max_source_rate;
        if !accepted.contains(&self.default_pcm_rate) {
            return Err(ConfigError::Invalid(format!(
                "default_pcm_rate {} is outside the accepted source rates {accepted:?}",
                self.default_pcm_rate
            )));
        }
        if self.ffmpeg_path.trim().is_empty() {
            return Err(ConfigError::Invalid("ffmpeg_path is empty".into()));
        }
        match self.model.backend {
            ModelBackend::Stub if self.model.stub_dimension == 0 => {
                Err(ConfigError::Invalid("model.stub_dimension must be positive".into()))
            }
            ModelBackend::Remote if self.model.remote.url.is_empty() => {
                Err(ConfigError::Invalid("model.remote.url is required".into()))
            }
            ModelBackend::Remote if self.model.remote.dimension == 0 => {
                Err(ConfigError::Invalid("model.remote.dimension must be positive".into()))
            }
            _ => Ok(()),
        }
    }

    /// Parses the listen address. `:5000` means `0.0.0.0:5000`.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = if self.listen.starts_with(':') {
            format!("0.0.0.0{}", self.listen)
        } else {
            self.listen.clone()
        };
        addr.parse()
            .map_err(|e| ConfigError::Invalid(format!("listen address {:?}: {e}", self.listen)))
    }
}

/// Expands a `$VAR` or `${VAR}` reference. Other strings pass through.
fn expand_env(s: &str) -> String {
    match s.strip_prefix('$') {
        Some(rest) => {
            let name = rest
                .strip_prefix('{')
                .and_then(|r| r.strip_suffix('}'))
                .unwrap_or(rest);
            std::env::var(name).unwrap_or_default()
        }
        None => s.to_string(),
    }
}
