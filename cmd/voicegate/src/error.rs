use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use voicegate_audio::AudioError;
use voicegate_voiceprint::VoiceprintError;

use crate::registry::StoreError;
use crate::transcode::TranscodeError;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Voiceprint(#[from] VoiceprintError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} is required")]
    MissingFile(&'static str),

    #[error("file must have a valid filename")]
    EmptyFilename,

    #[error("unsupported file type {0:?}, allowed types: {1}")]
    UnsupportedFileType(String, String),

    #[error("file exceeds the upload limit of {0} bytes")]
    PayloadTooLarge(usize),

    #[error("request body too large: {0}")]
    BodyTooLarge(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Voiceprint(VoiceprintError::NoCandidates) => StatusCode::NOT_FOUND,
            Self::Voiceprint(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Voiceprint(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transcode(TranscodeError::Failed { .. }) => StatusCode::BAD_REQUEST,
            Self::Transcode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_)
            | Self::MissingFile(_)
            | Self::EmptyFilename
            | Self::UnsupportedFileType(..) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) | Self::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Voiceprint(e) => e.code(),
            Self::Store(StoreError::NotFound(_)) => "NOT_FOUND",
            Self::Store(_) => "REGISTRY_ERROR",
            Self::Transcode(_) => "TRANSCODE_FAILED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::MissingFile(_) => "MISSING_FILE",
            Self::EmptyFilename => "EMPTY_FILENAME",
            Self::UnsupportedFileType(..) => "UNSUPPORTED_FILE_TYPE",
            Self::PayloadTooLarge(_) | Self::BodyTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<AudioError> for ApiError {
    fn from(e: AudioError) -> Self {
        Self::Voiceprint(e.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::BodyTooLarge(e.body_text());
        }
        Self::BadRequest(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "request failed");
        } else {
            warn!(code = self.code(), error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (VoiceprintError::NoCandidates.into(), StatusCode::NOT_FOUND),
            (VoiceprintError::EmptyAudio.into(), StatusCode::BAD_REQUEST),
            (VoiceprintError::InvalidThreshold(2.0).into(), StatusCode::BAD_REQUEST),
            (VoiceprintError::Model("down".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
            (StoreError::NotFound("x.wav".into()).into(), StatusCode::NOT_FOUND),
            (ApiError::Timeout(30), StatusCode::GATEWAY_TIMEOUT),
            (ApiError::MissingFile("audio"), StatusCode::BAD_REQUEST),
            (ApiError::PayloadTooLarge(10), StatusCode::PAYLOAD_TOO_LARGE),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn audio_errors_go_through_voiceprint() {
        let err: ApiError = AudioError::OddLength(5).into();
        assert_eq!(err.code(), "MALFORMED_ENCODING");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
