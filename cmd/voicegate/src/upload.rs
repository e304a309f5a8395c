//! Uploaded audio files: validation, naming and decoding.

use unicode_normalization::UnicodeNormalization;
use voicegate_audio::wav::{self, WavAudio};

use crate::error::ApiError;
use crate::transcode::Transcoder;

/// Extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a", "aac"];

/// A validated uploaded audio file.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Sanitized client filename.
    pub filename: String,
    /// Lowercase extension, one of [`ALLOWED_EXTENSIONS`].
    pub extension: String,
    pub data: Vec<u8>,
}

impl Upload {
    /// Validates the client filename and wraps the payload.
    pub fn new(filename: &str, data: Vec<u8>) -> Result<Self, ApiError> {
        if filename.trim().is_empty() {
            return Err(ApiError::EmptyFilename);
        }
        let extension = extension_of(filename).unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApiError::UnsupportedFileType(
                extension,
                ALLOWED_EXTENSIONS.join(", "),
            ));
        }
        Ok(Self {
            filename: secure_filename(filename),
            extension,
            data,
        })
    }

    pub fn is_wav(&self) -> bool {
        self.extension == "wav"
    }

    /// Returns WAV bytes: the upload itself for WAV files, otherwise the
    /// transcoder's output.
    pub fn to_wav(&self, transcoder: &dyn Transcoder) -> Result<Vec<u8>, ApiError> {
        if self.is_wav() {
            return Ok(self.data.clone());
        }
        Ok(transcoder.to_wav(&self.data, &self.extension)?)
    }

    /// Transcodes if needed and decodes to mono int16 samples.
    pub fn decode(&self, transcoder: &dyn Transcoder) -> Result<(Vec<u8>, WavAudio), ApiError> {
        let bytes = self.to_wav(transcoder)?;
        let audio = wav::decode_wav(&bytes)?;
        Ok((bytes, audio))
    }
}

/// Returns the lowercase extension after the last dot.
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// Reduces a client-supplied name to a safe single path component.
///
/// The name is NFKD-folded to ASCII first, so accented letters keep their
/// base letter. Path separators and whitespace runs become `_`, characters
/// outside `[A-Za-z0-9._-]` are dropped, and leading or trailing `.` and `_`
/// are stripped. The result may be empty.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}
