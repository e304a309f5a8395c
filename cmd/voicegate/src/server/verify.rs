//! File-upload verification endpoints.

use axum::{
    extract::{Multipart, State, multipart::MultipartRejection},
    response::Json,
};
use serde::Serialize;
use tracing::info;
use voicegate_voiceprint::{Confidence, MatchResult, RankOptions, VoiceprintError};

use super::{AppState, Form, round4};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct Interpretation {
    pub message: &'static str,
    pub certainty: Confidence,
}

#[derive(Debug, Serialize)]
pub struct VerifyFilesResponse {
    pub success: bool,
    pub score: f32,
    pub threshold: f32,
    pub same_speaker: bool,
    pub confidence: Confidence,
    pub interpretation: Interpretation,
}

#[derive(Debug, Serialize)]
pub struct RankedSpeaker {
    pub filename: String,
    pub speaker_name: String,
    pub score: f32,
    pub same_speaker: bool,
    pub confidence: Confidence,
}

impl From<MatchResult> for RankedSpeaker {
    fn from(m: MatchResult) -> Self {
        Self {
            filename: m.id,
            speaker_name: m.speaker_name,
            score: round4(m.score),
            same_speaker: m.same_speaker,
            confidence: m.confidence,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyRegisteredResponse {
    pub success: bool,
    pub threshold: f32,
    pub total_registered: usize,
    pub best_match: Option<RankedSpeaker>,
    pub all_results: Vec<RankedSpeaker>,
}

/// Compares two uploaded files.
pub async fn verify_files(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VerifyFilesResponse>, ApiError> {
    let mut form = Form::read(multipart?, state.config.max_upload_bytes).await?;
    let first = form.take_upload("audio1")?;
    let second = form.take_upload("audio2")?;
    let threshold = state.verifier.threshold(form.parse("threshold")?)?;

    let cmp = state
        .run_blocking(move |s| {
            let a = s.embed_upload(&first)?;
            let b = s.embed_upload(&second)?;
            Ok(s.verifier.compare(&a, &b, threshold)?)
        })
        .await?;

    info!(
        score = cmp.score,
        threshold = cmp.threshold,
        same_speaker = cmp.same_speaker,
        "verified file pair"
    );
    let message = if cmp.same_speaker {
        "The speakers are LIKELY the same person"
    } else {
        "The speakers are LIKELY different people"
    };
    Ok(Json(VerifyFilesResponse {
        success: true,
        score: round4(cmp.score),
        threshold: cmp.threshold,
        same_speaker: cmp.same_speaker,
        confidence: cmp.confidence,
        interpretation: Interpretation {
            message,
            certainty: cmp.confidence,
        },
    }))
}

/// Ranks an uploaded file against every registered speaker.
///
/// `top_n` of 0 or absent returns every result; `matches_only` drops
/// results below the threshold. `best_match` ignores both.
pub async fn verify_against_registered(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VerifyRegisteredResponse>, ApiError> {
    let mut form = Form::read(multipart?, state.config.max_upload_bytes).await?;
    let upload = form.take_upload("audio")?;
    let opts = RankOptions {
        threshold: state.verifier.threshold(form.parse("threshold")?)?,
        top_k: form.parse::<usize>("top_n")?.filter(|&n| n > 0),
        matches_only: form.flag("matches_only")?,
    };

    let ranking = state
        .run_blocking(move |s| {
            // Fail before paying for an extraction.
            if s.registry.count()? == 0 {
                return Err(VoiceprintError::NoCandidates.into());
            }
            let probe = s.embed_upload(&upload)?;
            Ok(s.verifier.rank(&probe, &*s.registry, &opts)?)
        })
        .await?;

    Ok(Json(VerifyRegisteredResponse {
        success: true,
        threshold: ranking.threshold,
        total_registered: ranking.total,
        best_match: ranking.best_match.map(Into::into),
        all_results: ranking.results.into_iter().map(Into::into).collect(),
    }))
}
