//! PCM16 stream format.

use std::time::Duration;

/// Describes a 16-bit signed integer PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Sample rate in Hz (e.g., 16000, 44100).
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl Format {
    /// Creates a mono format with the given sample rate.
    pub const fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }

    /// Creates a format with an arbitrary channel count.
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Returns the number of bytes per frame (2 bytes per channel).
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * 2
    }

    /// Returns the number of mono samples needed to cover `duration`.
    /// Fractional samples are truncated.
    pub fn samples_in(&self, duration: Duration) -> usize {
        (duration.as_secs_f64() * self.sample_rate as f64) as usize
    }

    /// Returns the playback duration of `frames` frames.
    pub fn duration(&self, frames: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }
}

impl Format {
    /// 16kHz mono, the rate speaker embedding models are trained on.
    pub const MONO_16K: Format = Format::mono(16000);
    /// 8kHz mono (telephony).
    pub const MONO_8K: Format = Format::mono(8000);
    /// 44.1kHz mono.
    pub const MONO_44K: Format = Format::mono(44100);
    /// 48kHz mono.
    pub const MONO_48K: Format = Format::mono(48000);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_bytes() {
        assert_eq!(Format::MONO_16K.frame_bytes(), 2);
        assert_eq!(Format::new(44100, 2).frame_bytes(), 4);
    }

    #[test]
    fn test_samples_in() {
        assert_eq!(Format::MONO_16K.samples_in(Duration::from_secs(2)), 32000);
        assert_eq!(Format::MONO_8K.samples_in(Duration::from_millis(500)), 4000);
    }

    #[test]
    fn test_duration() {
        assert_eq!(Format::MONO_16K.duration(16000), Duration::from_secs(1));
        assert_eq!(Format::mono(0).duration(100), Duration::ZERO);
    }
}
