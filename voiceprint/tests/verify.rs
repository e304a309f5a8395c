use std::sync::Arc;

use voicegate_audio::pcm;
use voicegate_voiceprint::{
    Confidence, ExclusiveModel, LockedModel, MemoryRegistry, RankOptions, RegistryEntry,
    StoredVoice, StubModel, Threshold, Verifier, VerifierConfig, VoiceprintError, Waveform, codec,
    score,
};

fn speech(seed: i32, seconds: f32, rate: u32) -> Vec<i16> {
    let n = (seconds * rate as f32) as i32;
    (0..n)
        .map(|i| {
            let t = i as f32 / rate as f32;
            let f = 120.0 + seed as f32 * 35.0;
            (8000.0 * (2.0 * std::f32::consts::PI * f * t).sin()) as i16
        })
        .collect()
}

fn verifier() -> Verifier {
    Verifier::new(Arc::new(StubModel::default()), VerifierConfig::default()).unwrap()
}

#[test]
fn minimum_duration_gate() {
    let v = verifier();
    let short = pcm::encode_s16le(&speech(1, 1.0, 16000));
    let err = v.embed_pcm(&short, 16000).unwrap_err();
    assert!(matches!(
        err,
        VoiceprintError::AudioTooShort {
            min_samples: 32000,
            got_samples: 16000
        }
    ));

    let exact = pcm::encode_s16le(&speech(1, 2.0, 16000));
    assert!(v.embed_pcm(&exact, 16000).is_ok());
}

#[test]
fn odd_and_empty_buffers() {
    let v = verifier();
    assert!(matches!(
        v.embed_pcm(&[0u8; 3], 16000),
        Err(VoiceprintError::MalformedEncoding(_))
    ));
    assert!(matches!(v.embed_pcm(&[], 16000), Err(VoiceprintError::EmptyAudio)));
}

#[test]
fn resampled_input_is_embedded() {
    let v = verifier();
    let e = v
        .embed_pcm(&pcm::encode_s16le(&speech(2, 2.5, 44100)), 44100)
        .unwrap();
    assert_eq!(e.dim(), 192);
    assert!((e.norm() - 1.0).abs() < 1e-6);
}

#[test]
fn identical_audio_scores_one() {
    let v = verifier();
    let samples = speech(3, 2.0, 16000);
    let a = v.embed_samples(&samples, 16000).unwrap();
    let b = v.embed_samples(&samples, 16000).unwrap();
    assert_eq!(a, b);
    assert!((score(&a, &b) - 1.0).abs() < 1e-6);
}

#[test]
fn storage_round_trip() {
    let v = verifier();
    let e = v.embed_samples(&speech(4, 2.0, 16000), 16000).unwrap();
    let text = codec::to_base64(&e);
    let decoded = codec::from_base64(&text).unwrap();
    assert!(!decoded.degenerate);
    for (x, y) in e.as_slice().iter().zip(decoded.embedding.as_slice()) {
        assert!((x - y).abs() < 1e-6);
    }
}

#[test]
fn verify_against_registry_end_to_end() {
    let v = verifier();
    let registry = MemoryRegistry::new();
    for (i, name) in ["Alice", "Bob", "Carol"].iter().enumerate() {
        let e = v.embed_samples(&speech(i as i32, 2.0, 16000), 16000).unwrap();
        registry.insert(RegistryEntry {
            id: format!("{name}.wav"),
            speaker_name: name.to_string(),
            voice: StoredVoice::Embedding(codec::serialize(&e)),
        });
    }

    let probe = v.embed_samples(&speech(1, 2.0, 16000), 16000).unwrap();
    let opts = RankOptions {
        threshold: Threshold::new(0.9).unwrap(),
        top_k: Some(2),
        matches_only: false,
    };
    let ranking = v.rank(&probe, &registry, &opts).unwrap();

    assert_eq!(ranking.total, 3);
    assert_eq!(ranking.results.len(), 2);
    let best = ranking.best_match.unwrap();
    assert_eq!(best.speaker_name, "Bob");
    assert!(best.same_speaker);
    assert_eq!(best.confidence, Confidence::VeryHigh);
    assert!(ranking.results[0].score >= ranking.results[1].score);

    let only = RankOptions {
        matches_only: true,
        ..opts
    };
    let filtered = v.rank(&probe, &registry, &only).unwrap();
    assert_eq!(filtered.results.len(), 1);
    assert_eq!(filtered.results[0].id, "Bob.wav");
}

#[test]
fn verify_candidates_dimension_mismatch() {
    let v = verifier();
    let probe = pcm::encode_s16le(&speech(1, 2.0, 16000));
    let wrong = codec::serialize(&codec::normalize(&[1.0, 0.0, 0.0]).unwrap());
    let err = v.verify_candidates(&probe, 16000, &[wrong]).unwrap_err();
    assert!(matches!(
        err,
        VoiceprintError::DimensionMismatch {
            expected: 192,
            got: 3
        }
    ));
    assert!(err.is_client_error());
}

struct CountingEngine {
    calls: usize,
}

impl ExclusiveModel for CountingEngine {
    fn extract(&mut self, waveform: &Waveform) -> Result<Vec<f32>, VoiceprintError> {
        self.calls += 1;
        let energy: f32 = waveform.samples().iter().map(|s| s.abs()).sum();
        Ok(vec![1.0, energy, 0.5, 0.25])
    }

    fn dimension(&self) -> usize {
        4
    }
}

#[test]
fn locked_engine_behind_verifier() {
    let model = Arc::new(LockedModel::new(CountingEngine { calls: 0 }));
    let v = Verifier::new(model.clone(), VerifierConfig::default()).unwrap();

    let samples = speech(1, 2.0, 16000);
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| v.embed_samples(&samples, 16000).unwrap());
        }
    });

    drop(v);
    let engine = Arc::try_unwrap(model).ok().unwrap().into_inner();
    assert_eq!(engine.calls, 4);
}
