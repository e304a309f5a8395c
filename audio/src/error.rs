use thiserror::Error;

/// Errors returned by audio decoding and resampling.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio: pcm16 buffer has odd length {0}")]
    OddLength(usize),

    #[error("audio: invalid format: {0}")]
    InvalidFormat(String),

    #[error("audio: resample: {0}")]
    Resample(String),

    #[error("audio: wav: {0}")]
    Wav(String),

    #[error("audio: unsupported wav encoding: {format} {bits}-bit")]
    UnsupportedWav { format: &'static str, bits: u16 },
}

impl From<rubato::ResamplerConstructionError> for AudioError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        AudioError::Resample(e.to_string())
    }
}

impl From<rubato::ResampleError> for AudioError {
    fn from(e: rubato::ResampleError) -> Self {
        AudioError::Resample(e.to_string())
    }
}

impl From<hound::Error> for AudioError {
    fn from(e: hound::Error) -> Self {
        AudioError::Wav(e.to_string())
    }
}
