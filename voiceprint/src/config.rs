use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceScale;
use crate::error::VoiceprintError;
use crate::matcher::{DEFAULT_THRESHOLD, Threshold};
use crate::waveform::{
    DEFAULT_MAX_SOURCE_RATE, DEFAULT_MIN_SECONDS, DEFAULT_MIN_SOURCE_RATE,
    DEFAULT_MODEL_SAMPLE_RATE, WaveformConfig,
};

/// Tunables of the verification engine.
///
/// The defaults are business constants rather than invariants; every field
/// can be overridden and is checked by [`VerifierConfig::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Rate the embedding model requires (default: 16000).
    pub model_sample_rate: u32,
    /// Minimum audio duration in seconds (default: 2.0).
    pub min_seconds: f32,
    /// Lowest accepted input sample rate (default: 8000).
    pub min_source_rate: u32,
    /// Highest accepted input sample rate (default: 192000).
    pub max_source_rate: u32,
    /// Default verification threshold (default: 0.25).
    pub threshold: f32,
    /// Confidence bucket boundaries.
    pub confidence: ConfidenceScale,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            model_sample_rate: DEFAULT_MODEL_SAMPLE_RATE,
            min_seconds: DEFAULT_MIN_SECONDS,
            min_source_rate: DEFAULT_MIN_SOURCE_RATE,
            max_source_rate: DEFAULT_MAX_SOURCE_RATE,
            threshold: DEFAULT_THRESHOLD,
            confidence: ConfidenceScale::default(),
        }
    }
}

impl VerifierConfig {
    pub fn validate(&self) -> Result<(), VoiceprintError> {
        self.waveform().validate()?;
        Threshold::new(self.threshold).map_err(|e| VoiceprintError::Config(e.to_string()))?;
        self.confidence.validate()
    }

    pub fn waveform(&self) -> WaveformConfig {
        WaveformConfig {
            model_sample_rate: self.model_sample_rate,
            min_seconds: self.min_seconds,
            min_source_rate: self.min_source_rate,
            max_source_rate: self.max_source_rate,
        }
    }
}
