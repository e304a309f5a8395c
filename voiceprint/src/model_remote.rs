//! [`VoiceprintModel`] implementation backed by an HTTP inference service.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::VoiceprintError;
use crate::model::VoiceprintModel;
use crate::waveform::Waveform;

/// Configuration for [`RemoteModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteModelConfig {
    /// Endpoint accepting `POST {"sample_rate", "samples"}`.
    pub url: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Expected embedding dimension (default: 192).
    pub dimension: usize,
    /// Whole-request timeout in seconds (default: 30).
    pub timeout_secs: u64,
}

impl Default for RemoteModelConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8500/v1/speaker/embed".to_string(),
            api_key: None,
            dimension: 192,
            timeout_secs: 30,
        }
    }
}

#[derive(Serialize)]
struct ExtractRequest<'a> {
    sample_rate: u32,
    samples: &'a [f32],
}

#[derive(Deserialize)]
struct ExtractResponse {
    embedding: Vec<f32>,
}

/// Sends each waveform to a remote inference server and returns the raw
/// embedding it answers with.
///
/// The agent is shared; concurrent extractions issue concurrent requests.
pub struct RemoteModel {
    agent: ureq::Agent,
    url: String,
    auth: Option<String>,
    dim: usize,
}

impl RemoteModel {
    pub fn new(cfg: RemoteModelConfig) -> Result<Self, VoiceprintError> {
        if cfg.url.is_empty() {
            return Err(VoiceprintError::Config("remote model url is empty".into()));
        }
        if cfg.dimension == 0 {
            return Err(VoiceprintError::Config(
                "remote model dimension must be positive".into(),
            ));
        }
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(cfg.timeout_secs.max(1))))
            .build()
            .into();
        Ok(Self {
            agent,
            url: cfg.url,
            auth: cfg.api_key.map(|k| format!("Bearer {k}")),
            dim: cfg.dimension,
        })
    }
}

impl VoiceprintModel for RemoteModel {
    fn extract(&self, waveform: &Waveform) -> Result<Vec<f32>, VoiceprintError> {
        let body = ExtractRequest {
            sample_rate: waveform.sample_rate(),
            samples: waveform.samples(),
        };

        let mut req = self.agent.post(&self.url);
        if let Some(auth) = &self.auth {
            req = req.header("Authorization", auth);
        }
        let mut resp = req
            .send_json(&body)
            .map_err(|e| VoiceprintError::Model(format!("remote extract: {e}")))?;
        let out: ExtractResponse = resp
            .body_mut()
            .read_json()
            .map_err(|e| VoiceprintError::Model(format!("remote extract: decode response: {e}")))?;

        debug!(dim = out.embedding.len(), samples = waveform.len(), "remote embedding received");
        Ok(out.embedding)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
