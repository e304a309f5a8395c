//! Raw PCM16 handling.
//!
//! Speaker models consume float waveforms, but everything upstream (devices,
//! network payloads, WAV files) speaks signed 16-bit little-endian PCM. The
//! helpers here convert between the two without any normalization: int16
//! samples are divided by the fixed scale 32768.0, never by peak amplitude.

mod format;

pub use format::Format;

use crate::error::AudioError;

/// Fixed int16 -> float scale factor.
pub const I16_SCALE: f32 = 32768.0;

/// Decodes little-endian int16 samples.
///
/// Returns [`AudioError::OddLength`] when the buffer does not hold a whole
/// number of samples. An empty buffer decodes to an empty vector.
pub fn decode_s16le(data: &[u8]) -> Result<Vec<i16>, AudioError> {
    if data.len() % 2 != 0 {
        return Err(AudioError::OddLength(data.len()));
    }
    Ok(data
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect())
}

/// Encodes int16 samples as little-endian bytes.
pub fn encode_s16le(samples: &[i16]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        data.extend_from_slice(&s.to_le_bytes());
    }
    data
}

/// Converts int16 samples to floats in [-1.0, 1.0).
pub fn to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / I16_SCALE).collect()
}

/// Averages interleaved frames down to a single channel.
///
/// A trailing partial frame is dropped.
pub fn downmix(interleaved: &[i16], channels: u16) -> Vec<i16> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_s16le() {
        let data = [0xe8, 0x03, 0x18, 0xfc]; // 1000, -1000
        assert_eq!(decode_s16le(&data).unwrap(), vec![1000, -1000]);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode_s16le(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_odd_length() {
        let err = decode_s16le(&[0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err, AudioError::OddLength(3)));
    }

    #[test]
    fn test_encode_decode() {
        let samples = vec![i16::MIN, -1, 0, 1, i16::MAX];
        assert_eq!(decode_s16le(&encode_s16le(&samples)).unwrap(), samples);
    }

    #[test]
    fn test_to_f32_fixed_scale() {
        let f = to_f32(&[i16::MIN, 0, 16384, i16::MAX]);
        assert_eq!(f[0], -1.0);
        assert_eq!(f[1], 0.0);
        assert_eq!(f[2], 0.5);
        // Quiet audio is not stretched towards full scale.
        assert!((f[3] - 32767.0 / 32768.0).abs() < 1e-7);
    }

    #[test]
    fn test_downmix_stereo() {
        // L=1000, R=2000 -> 1500
        let mono = downmix(&[1000, 2000, -1000, -3000], 2);
        assert_eq!(mono, vec![1500, -2000]);
    }

    #[test]
    fn test_downmix_partial_frame() {
        let mono = downmix(&[3, 3, 3, 9, 9, 9, 7], 3);
        assert_eq!(mono, vec![3, 9]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        assert_eq!(downmix(&[1, 2, 3], 1), vec![1, 2, 3]);
        assert_eq!(downmix(&[1, 2, 3], 0), vec![1, 2, 3]);
    }
}
