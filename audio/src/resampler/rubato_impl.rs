//! Rubato-based resampler implementation.

use rubato::{FftFixedInOut, Resampler as RubatoResampler};

use crate::error::AudioError;

/// Frames per processing block handed to rubato.
const CHUNK_SIZE: usize = 1024;

/// Converts whole mono buffers from one sample rate to another.
///
/// The output of [`Resampler::process`] is aligned with the input (the filter
/// delay is removed) and holds exactly `ceil(len * to / from)` samples,
/// clamped to [-1.0, 1.0].
pub struct Resampler {
    from: u32,
    to: u32,
    /// None when both rates are equal.
    inner: Option<FftFixedInOut<f32>>,
}

impl Resampler {
    /// Creates a mono resampler from `from` Hz to `to` Hz.
    pub fn new(from: u32, to: u32) -> Result<Self, AudioError> {
        if from == 0 || to == 0 {
            return Err(AudioError::InvalidFormat(format!(
                "sample rate must be positive, got {from} -> {to}"
            )));
        }
        let inner = if from != to {
            Some(FftFixedInOut::<f32>::new(
                from as usize,
                to as usize,
                CHUNK_SIZE,
                1,
            )?)
        } else {
            None
        };
        Ok(Self { from, to, inner })
    }

    /// Returns the source sample rate.
    pub fn from_rate(&self) -> u32 {
        self.from
    }

    /// Returns the destination sample rate.
    pub fn to_rate(&self) -> u32 {
        self.to
    }

    /// Resamples a complete buffer.
    ///
    /// The resampler is reset before each call so results never depend on
    /// previously processed audio.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, AudioError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(input.to_vec());
        };
        if input.is_empty() {
            return Ok(Vec::new());
        }
        inner.reset();

        let expected = (input.len() as u64 * self.to as u64).div_ceil(self.from as u64) as usize;
        let delay = inner.output_delay();
        let wanted = expected + delay;

        let mut output = Vec::with_capacity(wanted + inner.output_frames_max());
        let mut chunk = Vec::with_capacity(inner.input_frames_max());
        let mut pos = 0usize;

        while output.len() < wanted {
            let need = inner.input_frames_next();
            chunk.clear();
            chunk.resize(need, 0.0);
            if pos < input.len() {
                let end = (pos + need).min(input.len());
                chunk[..end - pos].copy_from_slice(&input[pos..end]);
            }
            pos += need;

            let processed = inner.process(std::slice::from_ref(&chunk), None)?;
            output.extend_from_slice(&processed[0]);
        }

        output.drain(..delay);
        output.truncate(expected);
        for s in &mut output {
            *s = s.clamp(-1.0, 1.0);
        }
        Ok(output)
    }
}

/// Resamples a mono buffer from `from` Hz to `to` Hz.
///
/// Returns a copy of the input when the rates match.
pub fn resample(input: &[f32], from: u32, to: u32) -> Result<Vec<f32>, AudioError> {
    Resampler::new(from, to)?.process(input)
}
