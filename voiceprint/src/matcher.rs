//! Match selection: best-of-N and ranking against a registry.

use serde::Serialize;
use tracing::{debug, warn};

use crate::codec::{self, Embedding};
use crate::confidence::{Confidence, ConfidenceScale};
use crate::error::VoiceprintError;
use crate::score::score;

/// Default verification threshold.
pub const DEFAULT_THRESHOLD: f32 = 0.25;

/// Score reported when there is nothing to match against. Real scores of
/// unit embeddings are never below it, so any candidate replaces it.
pub const NO_MATCH_SCORE: f32 = -1.0;

/// A validated verification threshold in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Threshold(f32);

impl Threshold {
    /// Validates `value`. NaN and values outside [0.0, 1.0] fail with
    /// [`VoiceprintError::InvalidThreshold`].
    pub fn new(value: f32) -> Result<Self, VoiceprintError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(VoiceprintError::InvalidThreshold(value))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Returns the verdict for `score`: same speaker iff strictly above.
    pub fn accepts(self, score: f32) -> bool {
        score > self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

/// Outcome of a best-of-N selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    /// Position of the winning candidate, `None` if there were none.
    pub index: Option<usize>,
    pub score: f32,
}

impl BestMatch {
    pub fn none() -> Self {
        Self {
            index: None,
            score: NO_MATCH_SCORE,
        }
    }

    /// Index in the wire convention: -1 when there is no match.
    pub fn wire_index(&self) -> i64 {
        self.index.map_or(-1, |i| i as i64)
    }
}

/// Picks the highest score. The first occurrence wins ties. Non-finite
/// scores never win.
pub fn select_best<I>(scores: I) -> BestMatch
where
    I: IntoIterator<Item = f32>,
{
    let mut best = BestMatch::none();
    for (i, s) in scores.into_iter().enumerate() {
        if s.is_finite() && s > best.score {
            best.score = s;
            best.index = Some(i);
        }
    }
    best
}

/// Decodes each serialized candidate, scores it against the probe and
/// returns the best one.
///
/// An empty candidate list is not an error; it yields [`BestMatch::none`].
pub fn best_of<C>(probe: &Embedding, candidates: &[C]) -> Result<BestMatch, VoiceprintError>
where
    C: AsRef<[u8]>,
{
    let scores = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let decoded = codec::deserialize(c.as_ref())?;
            check_dim(probe, &decoded.embedding)?;
            let s = score(probe, &decoded.embedding);
            debug!(candidate = i, score = s, degenerate = decoded.degenerate, "scored candidate");
            Ok(s)
        })
        .collect::<Result<Vec<_>, VoiceprintError>>()?;

    let best = select_best(scores);
    debug!(index = best.wire_index(), score = best.score, "best-of-n selected");
    Ok(best)
}

/// A registry entry resolved to an embedding, ready to be ranked.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub speaker_name: String,
    pub embedding: Embedding,
}

/// One row of a ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub id: String,
    pub speaker_name: String,
    pub score: f32,
    pub same_speaker: bool,
    pub confidence: Confidence,
}

/// Options for [`rank`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RankOptions {
    pub threshold: Threshold,
    /// Keep only the first K results after sorting.
    pub top_k: Option<usize>,
    /// Keep only results whose verdict is a match.
    pub matches_only: bool,
}

/// Ranked comparison of one probe against every registry entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub threshold: f32,
    /// Number of entries compared.
    pub total: usize,
    /// Top entry of the full ranking, before filtering and truncation.
    pub best_match: Option<MatchResult>,
    /// Sorted, filtered and truncated results.
    pub results: Vec<MatchResult>,
}

/// Scores the probe against every candidate and sorts the results by
/// descending score. Equal scores keep the candidates' original order.
/// An entry whose score is not finite is reported at [`NO_MATCH_SCORE`].
///
/// Fails with [`VoiceprintError::NoCandidates`] when `candidates` is empty.
/// Filtering everything out is not an error.
pub fn rank(
    probe: &Embedding,
    candidates: Vec<Candidate>,
    opts: &RankOptions,
    scale: &ConfidenceScale,
) -> Result<Ranking, VoiceprintError> {
    if candidates.is_empty() {
        return Err(VoiceprintError::NoCandidates);
    }
    let total = candidates.len();

    let mut results = Vec::with_capacity(total);
    for c in candidates {
        check_dim(probe, &c.embedding)?;
        let mut s = score(probe, &c.embedding);
        if !s.is_finite() {
            warn!(id = %c.id, score = s, "non-finite score, ranking entry last");
            s = NO_MATCH_SCORE;
        }
        debug!(id = %c.id, score = s, "scored registry entry");
        results.push(MatchResult {
            id: c.id,
            speaker_name: c.speaker_name,
            score: s,
            same_speaker: opts.threshold.accepts(s),
            confidence: scale.classify(s),
        });
    }

    // Stable: ties stay in registry order.
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    let best_match = results.first().cloned();

    if opts.matches_only {
        results.retain(|r| r.same_speaker);
    }
    if let Some(k) = opts.top_k {
        results.truncate(k);
    }

    Ok(Ranking {
        threshold: opts.threshold.value(),
        total,
        best_match,
        results,
    })
}

fn check_dim(probe: &Embedding, candidate: &Embedding) -> Result<(), VoiceprintError> {
    if probe.dim() != candidate.dim() {
        return Err(VoiceprintError::DimensionMismatch {
            expected: probe.dim(),
            got: candidate.dim(),
        });
    }
    Ok(())
}
