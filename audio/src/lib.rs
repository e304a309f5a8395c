//! Audio plumbing for the speaker verification pipeline.
//!
//! This crate turns the audio that reaches the verifier into plain sample
//! buffers:
//!
//! - `pcm`: raw PCM16 little-endian decoding, int16 -> float scaling, down-mix
//! - `resampler`: deterministic fixed-ratio sample rate conversion (rubato)
//! - `wav`: WAV container decoding/encoding (hound)
//!
//! # Example
//!
//! ```rust
//! use voicegate_audio::pcm::{self, Format};
//! use voicegate_audio::resampler;
//!
//! let bytes = [0x00, 0x40, 0x00, 0xc0]; // 16384, -16384
//! let samples = pcm::decode_s16le(&bytes).unwrap();
//! let floats = pcm::to_f32(&samples);
//! assert_eq!(floats, vec![0.5, -0.5]);
//!
//! let same = resampler::resample(&floats, 16000, 16000).unwrap();
//! assert_eq!(same, floats);
//! assert_eq!(Format::MONO_16K.channels, 1);
//! ```

mod error;
pub mod pcm;
pub mod resampler;
pub mod wav;

pub use error::AudioError;
pub use pcm::Format;
