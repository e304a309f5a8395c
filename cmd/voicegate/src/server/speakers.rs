//! Registry management endpoints.

use axum::{
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;

use super::{AppState, Form};
use crate::error::ApiError;
use crate::registry::{Listing, NewSpeaker};

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: &'static str,
    pub filename: String,
    pub speaker_name: String,
    pub original_format: String,
    pub converted_to: &'static str,
    pub registered_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub registered_speakers: Vec<Listing>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
    pub filename: String,
}

/// Stores an uploaded sample. Non-WAV uploads are converted to 16 kHz mono
/// WAV first; the embedding is computed once and kept in the metadata.
pub async fn register(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let mut form = Form::read(multipart?, state.config.max_upload_bytes).await?;
    let upload = form.take_upload("audio")?;
    let speaker_name = form.text("speaker_name").map(str::to_owned);

    let (filename, record) = state
        .run_blocking(move |s| {
            let (wav, audio) = upload.decode(s.transcoder.as_ref())?;
            let embedding = s
                .verifier
                .embed_samples(&audio.samples, audio.format.sample_rate)?;
            Ok(s.registry.register(NewSpeaker {
                speaker_name: speaker_name.as_deref(),
                original_filename: &upload.filename,
                original_format: &upload.extension,
                wav: &wav,
                embedding: Some(&embedding),
            })?)
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "Audio registered successfully",
            filename,
            speaker_name: record.speaker_name,
            original_format: record.original_format,
            converted_to: "wav",
            registered_at: record.registered_at,
        }),
    ))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
    let registered_speakers = state.run_blocking(|s| Ok(s.registry.list()?)).await?;
    Ok(Json(ListResponse {
        success: true,
        count: registered_speakers.len(),
        registered_speakers,
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let filename = state
        .run_blocking(move |s| Ok(s.registry.delete(&filename)?))
        .await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Audio deleted successfully",
        filename,
    }))
}
