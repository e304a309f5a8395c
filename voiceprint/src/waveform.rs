//! Canonical waveform preparation.

use serde::{Deserialize, Serialize};
use voicegate_audio::{pcm, resampler};

use crate::error::VoiceprintError;

/// Sample rate speaker embedding models expect by default.
pub const DEFAULT_MODEL_SAMPLE_RATE: u32 = 16000;

/// Default minimum audio duration in seconds.
pub const DEFAULT_MIN_SECONDS: f32 = 2.0;

/// Lowest source sample rate accepted by default.
pub const DEFAULT_MIN_SOURCE_RATE: u32 = 8000;

/// Highest source sample rate accepted by default.
pub const DEFAULT_MAX_SOURCE_RATE: u32 = 192_000;

/// Mono float audio at the model's sample rate.
///
/// Produced only by [`WaveformNormalizer`], so it is never empty and is at
/// least as long as the configured minimum.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Settings of [`WaveformNormalizer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// Rate the embedding model requires (default: 16000).
    pub model_sample_rate: u32,
    /// Minimum duration after resampling (default: 2.0).
    pub min_seconds: f32,
    /// Accepted source rates, inclusive (default: 8000..=192000). The
    /// resampler's buffers grow with the rate ratio, so callers cannot be
    /// allowed to pick arbitrary rates.
    pub min_source_rate: u32,
    pub max_source_rate: u32,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            model_sample_rate: DEFAULT_MODEL_SAMPLE_RATE,
            min_seconds: DEFAULT_MIN_SECONDS,
            min_source_rate: DEFAULT_MIN_SOURCE_RATE,
            max_source_rate: DEFAULT_MAX_SOURCE_RATE,
        }
    }
}

impl WaveformConfig {
    pub fn validate(&self) -> Result<(), VoiceprintError> {
        if self.model_sample_rate == 0 {
            return Err(VoiceprintError::Config(
                "model_sample_rate must be positive".to_string(),
            ));
        }
        if !self.min_seconds.is_finite() || self.min_seconds < 0.0 {
            return Err(VoiceprintError::Config(format!(
                "min_seconds must be a non-negative number, got {}",
                self.min_seconds
            )));
        }
        if self.min_source_rate == 0 || self.min_source_rate > self.max_source_rate {
            return Err(VoiceprintError::Config(format!(
                "source rate range {}..={} is empty",
                self.min_source_rate, self.max_source_rate
            )));
        }
        Ok(())
    }

    /// Minimum number of samples at the model rate.
    pub fn min_samples(&self) -> usize {
        (self.min_seconds as f64 * self.model_sample_rate as f64) as usize
    }
}

/// Converts PCM16 audio into a [`Waveform`].
///
/// Int16 samples are scaled by the fixed factor 32768.0, resampled to the
/// model rate when needed, and checked against the minimum duration.
/// Source rates outside the configured range are rejected before any
/// resampling work is done.
#[derive(Debug, Clone, Copy)]
pub struct WaveformNormalizer {
    cfg: WaveformConfig,
}

impl WaveformNormalizer {
    pub fn new(cfg: WaveformConfig) -> Result<Self, VoiceprintError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &WaveformConfig {
        &self.cfg
    }

    /// Normalizes raw little-endian PCM16 mono bytes.
    pub fn normalize(&self, pcm_bytes: &[u8], source_rate: u32) -> Result<Waveform, VoiceprintError> {
        let samples = pcm::decode_s16le(pcm_bytes)?;
        self.normalize_samples(&samples, source_rate)
    }

    /// Normalizes already-decoded mono int16 samples.
    pub fn normalize_samples(&self, samples: &[i16], source_rate: u32) -> Result<Waveform, VoiceprintError> {
        if samples.is_empty() {
            return Err(VoiceprintError::EmptyAudio);
        }
        if !(self.cfg.min_source_rate..=self.cfg.max_source_rate).contains(&source_rate) {
            return Err(VoiceprintError::UnsupportedSampleRate {
                rate: source_rate,
                min: self.cfg.min_source_rate,
                max: self.cfg.max_source_rate,
            });
        }

        let mut floats = pcm::to_f32(samples);
        let rate = self.cfg.model_sample_rate;
        if source_rate != rate {
            floats = resampler::resample(&floats, source_rate, rate)?;
        }

        let min_samples = self.cfg.min_samples();
        if floats.len() < min_samples {
            return Err(VoiceprintError::AudioTooShort {
                min_samples,
                got_samples: floats.len(),
            });
        }

        Ok(Waveform {
            samples: floats,
            sample_rate: rate,
        })
    }
}

impl Default for WaveformNormalizer {
    fn default() -> Self {
        Self {
            cfg: WaveformConfig::default(),
        }
    }
}
