use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::codec::{self, Embedding};
use crate::config::VerifierConfig;
use crate::confidence::{Confidence, ConfidenceScale};
use crate::error::VoiceprintError;
use crate::matcher::{self, BestMatch, Candidate, RankOptions, Ranking, Threshold};
use crate::model::VoiceprintModel;
use crate::registry::{Registry, RegistryEntry, StoredVoice};
use crate::score::score;
use crate::waveform::{Waveform, WaveformNormalizer};

/// Outcome of comparing two samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub score: f32,
    pub threshold: f32,
    pub same_speaker: bool,
    pub confidence: Confidence,
}

/// Entry point of the verification engine.
///
/// Owns the extractor (constructed once by the caller and only read
/// afterwards) together with the validated configuration. Every operation is
/// independent, so one `Verifier` can serve concurrent requests.
///
/// Extraction may block for the duration of a model inference; async
/// callers should run these methods on a blocking pool.
pub struct Verifier {
    model: Arc<dyn VoiceprintModel>,
    normalizer: WaveformNormalizer,
    threshold: Threshold,
    scale: ConfidenceScale,
}

impl Verifier {
    /// Validates `cfg` and builds a verifier around `model`.
    pub fn new(model: Arc<dyn VoiceprintModel>, cfg: VerifierConfig) -> Result<Self, VoiceprintError> {
        cfg.validate()?;
        if model.dimension() == 0 {
            return Err(VoiceprintError::Config(
                "model reports zero embedding dimension".to_string(),
            ));
        }
        info!(
            dimension = model.dimension(),
            sample_rate = cfg.model_sample_rate,
            min_seconds = cfg.min_seconds,
            threshold = cfg.threshold,
            "verifier ready"
        );
        Ok(Self {
            model,
            normalizer: WaveformNormalizer::new(cfg.waveform())?,
            threshold: Threshold::new(cfg.threshold)?,
            scale: cfg.confidence,
        })
    }

    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }

    pub fn normalizer(&self) -> &WaveformNormalizer {
        &self.normalizer
    }

    pub fn confidence_scale(&self) -> &ConfidenceScale {
        &self.scale
    }

    /// Returns the configured default threshold, or validates an override.
    pub fn threshold(&self, value: Option<f32>) -> Result<Threshold, VoiceprintError> {
        match value {
            Some(v) => Threshold::new(v),
            None => Ok(self.threshold),
        }
    }

    /// Extracts and normalizes an embedding.
    ///
    /// A zero-norm extractor output is a fault of the extractor and fails
    /// with [`VoiceprintError::DegenerateVector`].
    pub fn embed_waveform(&self, waveform: &Waveform) -> Result<Embedding, VoiceprintError> {
        let raw = self.model.extract(waveform)?;
        if raw.len() != self.model.dimension() {
            return Err(VoiceprintError::Model(format!(
                "extractor returned {} values, expected {}",
                raw.len(),
                self.model.dimension()
            )));
        }
        let embedding = codec::normalize(&raw)?;
        debug!(samples = waveform.len(), dim = embedding.dim(), "embedding extracted");
        Ok(embedding)
    }

    /// Embeds raw little-endian PCM16 mono audio.
    pub fn embed_pcm(&self, pcm: &[u8], sample_rate: u32) -> Result<Embedding, VoiceprintError> {
        let waveform = self.normalizer.normalize(pcm, sample_rate)?;
        self.embed_waveform(&waveform)
    }

    /// Embeds decoded mono int16 samples.
    pub fn embed_samples(&self, samples: &[i16], sample_rate: u32) -> Result<Embedding, VoiceprintError> {
        let waveform = self.normalizer.normalize_samples(samples, sample_rate)?;
        self.embed_waveform(&waveform)
    }

    /// Embeds the probe audio and selects the best serialized candidate.
    pub fn verify_candidates<C>(
        &self,
        pcm: &[u8],
        sample_rate: u32,
        candidates: &[C],
    ) -> Result<BestMatch, VoiceprintError>
    where
        C: AsRef<[u8]>,
    {
        let probe = self.embed_pcm(pcm, sample_rate)?;
        let best = matcher::best_of(&probe, candidates)?;
        info!(
            candidates = candidates.len(),
            best_index = best.wire_index(),
            score = best.score,
            "verified against candidates"
        );
        Ok(best)
    }

    /// Scores two embeddings and applies the threshold and confidence scale.
    pub fn compare(&self, a: &Embedding, b: &Embedding, threshold: Threshold) -> Result<Comparison, VoiceprintError> {
        if a.dim() != b.dim() {
            return Err(VoiceprintError::DimensionMismatch {
                expected: a.dim(),
                got: b.dim(),
            });
        }
        let s = score(a, b);
        Ok(Comparison {
            score: s,
            threshold: threshold.value(),
            same_speaker: threshold.accepts(s),
            confidence: self.scale.classify(s),
        })
    }

    /// Ranks every registry entry against the probe.
    ///
    /// Entries holding a serialized embedding go through the tolerant decode
    /// path; entries holding audio are embedded like a fresh probe and their
    /// failures propagate.
    pub fn rank(
        &self,
        probe: &Embedding,
        registry: &dyn Registry,
        opts: &RankOptions,
    ) -> Result<Ranking, VoiceprintError> {
        let entries = registry.entries()?;
        if entries.is_empty() {
            return Err(VoiceprintError::NoCandidates);
        }

        let candidates = entries
            .into_iter()
            .map(|e| self.resolve(e))
            .collect::<Result<Vec<_>, _>>()?;

        let ranking = matcher::rank(probe, candidates, opts, &self.scale)?;
        info!(
            total = ranking.total,
            returned = ranking.results.len(),
            best = ranking.best_match.as_ref().map(|m| m.id.as_str()),
            "ranked against registry"
        );
        Ok(ranking)
    }

    fn resolve(&self, entry: RegistryEntry) -> Result<Candidate, VoiceprintError> {
        let embedding = match &entry.voice {
            StoredVoice::Embedding(data) => codec::deserialize(data)?.embedding,
            StoredVoice::Pcm { samples, sample_rate } => self.embed_samples(samples, *sample_rate)?,
        };
        Ok(Candidate {
            id: entry.id,
            speaker_name: entry.speaker_name,
            embedding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_stub::StubModel;
    use crate::registry::MemoryRegistry;
    use voicegate_audio::pcm;

    fn verifier() -> Verifier {
        Verifier::new(Arc::new(StubModel::new(32)), VerifierConfig::default()).unwrap()
    }

    fn tone(seed: i32, n: usize) -> Vec<i16> {
        (0..n as i32).map(|i| ((i * 31 + seed * 977) % 4000 - 2000) as i16).collect()
    }

    struct ZeroModel;

    impl VoiceprintModel for ZeroModel {
        fn extract(&self, _: &Waveform) -> Result<Vec<f32>, VoiceprintError> {
            Ok(vec![0.0; 4])
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    struct ShortModel;

    impl VoiceprintModel for ShortModel {
        fn extract(&self, _: &Waveform) -> Result<Vec<f32>, VoiceprintError> {
            Ok(vec![1.0; 3])
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    #[test]
    fn embed_is_unit_length() {
        let e = verifier().embed_samples(&tone(1, 32000), 16000).unwrap();
        assert_eq!(e.dim(), 32);
        assert!((e.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fresh_degenerate_vector_propagates() {
        let v = Verifier::new(Arc::new(ZeroModel), VerifierConfig::default()).unwrap();
        let err = v.embed_samples(&tone(1, 32000), 16000).unwrap_err();
        assert!(matches!(err, VoiceprintError::DegenerateVector { .. }));
    }

    #[test]
    fn wrong_output_length_is_model_fault() {
        let v = Verifier::new(Arc::new(ShortModel), VerifierConfig::default()).unwrap();
        let err = v.embed_samples(&tone(1, 32000), 16000).unwrap_err();
        assert!(matches!(err, VoiceprintError::Model(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = VerifierConfig {
            threshold: -0.1,
            ..VerifierConfig::default()
        };
        assert!(Verifier::new(Arc::new(StubModel::default()), cfg).is_err());
    }

    #[test]
    fn threshold_override() {
        let v = verifier();
        assert_eq!(v.threshold(None).unwrap().value(), 0.25);
        assert_eq!(v.threshold(Some(0.0)).unwrap().value(), 0.0);
        assert_eq!(v.threshold(Some(1.0)).unwrap().value(), 1.0);
        assert!(matches!(
            v.threshold(Some(1.5)),
            Err(VoiceprintError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn verify_candidates_finds_same_audio() {
        let v = verifier();
        let a = tone(1, 32000);
        let b = tone(2, 32000);
        let cands = vec![
            codec::serialize(&v.embed_samples(&b, 16000).unwrap()),
            codec::serialize(&v.embed_samples(&a, 16000).unwrap()),
        ];
        let best = v
            .verify_candidates(&pcm::encode_s16le(&a), 16000, &cands)
            .unwrap();
        assert_eq!(best.index, Some(1));
        assert!((best.score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn verify_candidates_empty_list() {
        let v = verifier();
        let cands: Vec<Vec<u8>> = vec![];
        let best = v
            .verify_candidates(&pcm::encode_s16le(&tone(1, 32000)), 16000, &cands)
            .unwrap();
        assert_eq!(best.wire_index(), -1);
    }

    #[test]
    fn compare_same_and_different() {
        let v = verifier();
        let a = v.embed_samples(&tone(1, 32000), 16000).unwrap();
        let b = v.embed_samples(&tone(5, 32000), 16000).unwrap();

        let same = v.compare(&a, &a, v.threshold(None).unwrap()).unwrap();
        assert!(same.same_speaker);
        assert_eq!(same.confidence, Confidence::VeryHigh);

        let strict = v.compare(&a, &b, Threshold::new(1.0).unwrap()).unwrap();
        assert!(!strict.same_speaker);
        assert_eq!(strict.threshold, 1.0);
    }

    #[test]
    fn rank_empty_registry() {
        let v = verifier();
        let probe = v.embed_samples(&tone(1, 32000), 16000).unwrap();
        let err = v
            .rank(&probe, &MemoryRegistry::new(), &RankOptions::default())
            .unwrap_err();
        assert!(matches!(err, VoiceprintError::NoCandidates));
    }

    #[test]
    fn rank_mixed_entries() {
        let v = verifier();
        let a = tone(1, 32000);
        let probe = v.embed_samples(&a, 16000).unwrap();

        let registry = MemoryRegistry::new();
        registry.insert(RegistryEntry {
            id: "other.wav".into(),
            speaker_name: "Bob".into(),
            voice: StoredVoice::Embedding(codec::serialize(
                &v.embed_samples(&tone(9, 32000), 16000).unwrap(),
            )),
        });
        registry.insert(RegistryEntry {
            id: "alice.wav".into(),
            speaker_name: "Alice".into(),
            voice: StoredVoice::Pcm {
                samples: a.clone(),
                sample_rate: 16000,
            },
        });
        registry.insert(RegistryEntry {
            id: "corrupt.wav".into(),
            speaker_name: "Unknown".into(),
            voice: StoredVoice::Embedding(vec![0u8; 32 * 4]),
        });

        let ranking = v.rank(&probe, &registry, &RankOptions::default()).unwrap();
        assert_eq!(ranking.total, 3);
        let best = ranking.best_match.unwrap();
        assert_eq!(best.id, "alice.wav");
        assert!(best.same_speaker);
        assert_eq!(ranking.results.len(), 3);
    }

    #[test]
    fn rank_short_registered_audio_fails() {
        let v = verifier();
        let probe = v.embed_samples(&tone(1, 32000), 16000).unwrap();
        let registry = MemoryRegistry::new();
        registry.insert(RegistryEntry {
            id: "short.wav".into(),
            speaker_name: "Short".into(),
            voice: StoredVoice::Pcm {
                samples: tone(1, 100),
                sample_rate: 16000,
            },
        });
        let err = v.rank(&probe, &registry, &RankOptions::default()).unwrap_err();
        assert!(matches!(err, VoiceprintError::AudioTooShort { .. }));
    }
}
