//! Speaker verification via audio embeddings.
//!
//! # Architecture
//!
//! A request flows through four stages:
//!
//! 1. [`WaveformNormalizer::normalize`]: PCM16 bytes at any rate -> mono
//!    float [`Waveform`] at the model rate, gated on minimum duration
//! 2. [`VoiceprintModel::extract`]: waveform -> raw embedding vector
//! 3. [`codec::normalize`]: raw vector -> unit-length [`Embedding`]
//! 4. [`matcher`]: probe vs candidates -> [`BestMatch`] or [`Ranking`]
//!
//! [`Verifier`] wires the stages together around one shared model.
//!
//! # Storage Format
//!
//! Embeddings are persisted as raw little-endian `f32` values with no
//! header ([`codec::serialize`]). Decoding always re-normalizes, and a
//! zero-norm payload decodes with a `degenerate` flag instead of failing so
//! one corrupt registry entry cannot take a ranking down.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use voicegate_voiceprint::{StubModel, Verifier, VerifierConfig};
//!
//! let verifier = Verifier::new(Arc::new(StubModel::default()), VerifierConfig::default()).unwrap();
//! let samples: Vec<i16> = (0..32000).map(|i| ((i * 37) % 2000 - 1000) as i16).collect();
//! let a = verifier.embed_samples(&samples, 16000).unwrap();
//! let cmp = verifier.compare(&a, &a, verifier.threshold(None).unwrap()).unwrap();
//! assert!(cmp.same_speaker);
//! ```

pub mod codec;
mod confidence;
mod config;
mod error;
pub mod matcher;
mod model;
#[cfg(feature = "remote")]
mod model_remote;
mod model_stub;
mod registry;
mod score;
mod verifier;
mod waveform;

pub use codec::{Decoded, Embedding};
pub use confidence::{Confidence, ConfidenceScale, classify};
pub use config::VerifierConfig;
pub use error::VoiceprintError;
pub use matcher::{
    BestMatch, Candidate, DEFAULT_THRESHOLD, MatchResult, NO_MATCH_SCORE, RankOptions, Ranking,
    Threshold,
};
pub use model::{ExclusiveModel, LockedModel, VoiceprintModel};
#[cfg(feature = "remote")]
pub use model_remote::{RemoteModel, RemoteModelConfig};
pub use model_stub::{STUB_DIMENSION, StubModel};
pub use registry::{MemoryRegistry, Registry, RegistryEntry, StoredVoice};
pub use score::score;
pub use verifier::{Comparison, Verifier};
pub use waveform::{
    DEFAULT_MAX_SOURCE_RATE, DEFAULT_MIN_SECONDS, DEFAULT_MIN_SOURCE_RATE,
    DEFAULT_MODEL_SAMPLE_RATE, Waveform, WaveformConfig, WaveformNormalizer,
};
