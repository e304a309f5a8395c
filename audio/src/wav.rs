//! WAV container decoding and encoding.
//!
//! Uploaded files reach the verifier as WAV, either directly or after an
//! external transcoder converted them. Integer PCM of any bit depth up to 32
//! and 32-bit float are accepted; everything is folded into mono int16.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::AudioError;
use crate::pcm::{self, Format};

/// Decoded mono int16 audio.
#[derive(Debug, Clone, PartialEq)]
pub struct WavAudio {
    /// Mono samples.
    pub samples: Vec<i16>,
    /// Sample rate of `samples`. `channels` records the source layout.
    pub format: Format,
}

/// Decodes a WAV file held in memory into mono int16 samples.
pub fn decode_wav(data: &[u8]) -> Result<WavAudio, AudioError> {
    let reader = WavReader::new(Cursor::new(data))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::InvalidFormat("wav declares zero channels".into()));
    }

    let interleaved: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader.into_samples::<i16>().collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ 8..=32) => reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| rescale_int(v, bits)))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| (v * pcm::I16_SCALE).clamp(i16::MIN as f32, i16::MAX as f32) as i16))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits) => {
            return Err(AudioError::UnsupportedWav { format: "int", bits });
        }
        (SampleFormat::Float, bits) => {
            return Err(AudioError::UnsupportedWav { format: "float", bits });
        }
    };

    Ok(WavAudio {
        samples: pcm::downmix(&interleaved, spec.channels),
        format: Format::new(spec.sample_rate, spec.channels),
    })
}

/// Encodes mono int16 samples as a 16-bit PCM WAV file.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &s in samples {
            writer.write_sample(s)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

fn rescale_int(v: i32, bits: u16) -> i16 {
    if bits > 16 {
        (v >> (bits - 16)) as i16
    } else {
        (v << (16 - bits)) as i16
    }
}
