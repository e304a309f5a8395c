//! Conversion of uploaded audio containers to 16 kHz mono WAV.

use std::io::Write;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

/// Sample rate of transcoded output.
pub const TRANSCODE_RATE: u32 = 16000;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("stage {ext} input: {source}")]
    Io {
        ext: String,
        #[source]
        source: std::io::Error,
    },

    #[error("run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {ext} audio: {stderr}")]
    Failed { ext: String, stderr: String },
}

/// Converts an encoded audio file into WAV bytes.
///
/// `ext` is the lowercase file extension of the upload (e.g. "mp3").
/// Implementations block; callers run them on the blocking pool.
pub trait Transcoder: Send + Sync {
    fn to_wav(&self, data: &[u8], ext: &str) -> Result<Vec<u8>, TranscodeError>;
}

/// [`Transcoder`] that shells out to `ffmpeg`.
///
/// The input is staged in a temporary file so containers whose index sits
/// at the end (m4a) decode correctly. The WAV goes to a second temporary
/// file and is read back once ffmpeg exits.
pub struct FfmpegTranscoder {
    program: String,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Transcoder for FfmpegTranscoder {
    fn to_wav(&self, data: &[u8], ext: &str) -> Result<Vec<u8>, TranscodeError> {
        let io_err = |source| TranscodeError::Io {
            ext: ext.to_string(),
            source,
        };

        let mut input = tempfile::Builder::new()
            .prefix("voicegate-")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .map_err(io_err)?;
        input.write_all(data).map_err(io_err)?;
        input.flush().map_err(io_err)?;

        // ffmpeg only patches the RIFF sizes on seekable output.
        let target = tempfile::Builder::new()
            .prefix("voicegate-")
            .suffix(".wav")
            .tempfile()
            .map_err(io_err)?;

        let rate = TRANSCODE_RATE.to_string();
        let output = Command::new(&self.program)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i"])
            .arg(input.path())
            .args(["-ac", "1", "-ar", &rate, "-acodec", "pcm_s16le", "-f", "wav"])
            .arg(target.path())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| TranscodeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TranscodeError::Failed {
                ext: ext.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let wav = std::fs::read(target.path()).map_err(io_err)?;
        debug!(ext, in_bytes = data.len(), out_bytes = wav.len(), "transcoded upload");
        Ok(wav)
    }
}
