//! Raw-PCM endpoints used by devices that record audio themselves.

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use voicegate_voiceprint::codec;

use super::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct EmbedRequest {
    /// Base64 little-endian PCM16 mono.
    pub pcm_base64: String,
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct EmbedResponse {
    /// Base64 little-endian `f32` unit vector.
    pub embedding: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub pcm_base64: String,
    pub sample_rate: Option<u32>,
    /// Base64 serialized embeddings, in caller order.
    #[serde(default)]
    pub candidates: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Index of the best candidate, -1 if there were none.
    pub best_index: i64,
    pub score: f32,
}

pub async fn embed(
    State(state): State<AppState>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let Json(req) = payload?;
    let pcm = codec::decode_base64(&req.pcm_base64)?;
    let rate = req.sample_rate.unwrap_or(state.config.default_pcm_rate);

    let embedding = state
        .run_blocking(move |s| Ok(s.verifier.embed_pcm(&pcm, rate)?))
        .await?;
    info!(sample_rate = rate, dim = embedding.dim(), "embedded pcm");
    Ok(Json(EmbedResponse {
        embedding: codec::to_base64(&embedding),
    }))
}

pub async fn verify(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(req) = payload?;
    let pcm = codec::decode_base64(&req.pcm_base64)?;
    let rate = req.sample_rate.unwrap_or(state.config.default_pcm_rate);
    let candidates = req
        .candidates
        .iter()
        .map(|c| codec::decode_base64(c))
        .collect::<Result<Vec<_>, _>>()?;

    let best = state
        .run_blocking(move |s| Ok(s.verifier.verify_candidates(&pcm, rate, &candidates)?))
        .await?;
    Ok(Json(VerifyResponse {
        best_index: best.wire_index(),
        score: best.score,
    }))
}
