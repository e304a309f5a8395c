//! Sample rate conversion.
//!
//! Uses rubato's FFT-based synchronous resampler, a pure Rust implementation
//! without FFI dependencies. For a given input and rate pair the output is
//! fully deterministic, which the verifier relies on: the same upload must
//! always produce the same embedding.
//!
//! # Example
//!
//! ```rust
//! use voicegate_audio::resampler::{resample, Resampler};
//!
//! let input = vec![0.0f32; 4410];
//! let output = resample(&input, 44100, 16000).unwrap();
//! assert_eq!(output.len(), 1600);
//!
//! let mut r = Resampler::new(8000, 16000).unwrap();
//! assert_eq!(r.process(&[0.0; 80]).unwrap().len(), 160);
//! ```

mod rubato_impl;

pub use rubato_impl::{Resampler, resample};
