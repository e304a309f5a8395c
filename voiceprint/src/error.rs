use thiserror::Error;

use voicegate_audio::AudioError;

/// Errors returned by voiceprint operations.
///
/// Variants fall into two classes, see [`VoiceprintError::is_client_error`]:
/// problems with the caller's input, and faults of the extractor, registry
/// or configuration. The mapping to transport status codes belongs to the
/// caller.
#[derive(Debug, Error)]
pub enum VoiceprintError {
    #[error("empty audio buffer")]
    EmptyAudio,

    #[error("audio too short: need at least {min_samples} samples, got {got_samples}")]
    AudioTooShort {
        min_samples: usize,
        got_samples: usize,
    },

    #[error("unsupported sample rate {rate}: must be between {min} and {max}")]
    UnsupportedSampleRate { rate: u32, min: u32, max: u32 },

    #[error("degenerate embedding: norm is {norm}")]
    DegenerateVector { norm: f32 },

    #[error("invalid threshold {0}: must be between 0.0 and 1.0")]
    InvalidThreshold(f32),

    #[error("no registered speakers to compare against")]
    NoCandidates,

    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("audio error: {0}")]
    Audio(#[source] AudioError),

    #[error("model error: {0}")]
    Model(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VoiceprintError {
    /// Reports whether the error was caused by the caller's input rather
    /// than by the extractor, the registry or the configuration.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::EmptyAudio
            | Self::AudioTooShort { .. }
            | Self::UnsupportedSampleRate { .. }
            | Self::DegenerateVector { .. }
            | Self::InvalidThreshold(_)
            | Self::NoCandidates
            | Self::MalformedEncoding(_)
            | Self::DimensionMismatch { .. } => true,
            Self::Audio(e) => !matches!(e, AudioError::Resample(_)),
            Self::Model(_) | Self::Registry(_) | Self::Config(_) => false,
        }
    }

    /// Returns a machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyAudio => "EMPTY_AUDIO",
            Self::AudioTooShort { .. } => "AUDIO_TOO_SHORT",
            Self::UnsupportedSampleRate { .. } => "UNSUPPORTED_SAMPLE_RATE",
            Self::DegenerateVector { .. } => "DEGENERATE_VECTOR",
            Self::InvalidThreshold(_) => "INVALID_THRESHOLD",
            Self::NoCandidates => "NO_CANDIDATES",
            Self::MalformedEncoding(_) => "MALFORMED_ENCODING",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::Audio(_) => "AUDIO_ERROR",
            Self::Model(_) => "MODEL_ERROR",
            Self::Registry(_) => "REGISTRY_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<AudioError> for VoiceprintError {
    fn from(e: AudioError) -> Self {
        match e {
            AudioError::OddLength(n) => VoiceprintError::MalformedEncoding(format!(
                "pcm16 buffer length {n} is not a multiple of 2"
            )),
            other => VoiceprintError::Audio(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors() {
        assert!(VoiceprintError::EmptyAudio.is_client_error());
        assert!(VoiceprintError::NoCandidates.is_client_error());
        assert!(VoiceprintError::InvalidThreshold(1.5).is_client_error());
        assert!(VoiceprintError::Audio(AudioError::Wav("bad riff".into())).is_client_error());
        assert!(!VoiceprintError::Audio(AudioError::Resample("x".into())).is_client_error());
        assert!(!VoiceprintError::Model("boom".into()).is_client_error());
        assert!(!VoiceprintError::Registry("io".into()).is_client_error());
    }

    #[test]
    fn odd_pcm_is_malformed() {
        let err: VoiceprintError = AudioError::OddLength(3).into();
        assert_eq!(err.code(), "MALFORMED_ENCODING");
    }

    #[test]
    fn messages() {
        let err = VoiceprintError::AudioTooShort {
            min_samples: 32000,
            got_samples: 16000,
        };
        assert_eq!(
            err.to_string(),
            "audio too short: need at least 32000 samples, got 16000"
        );
    }
}
