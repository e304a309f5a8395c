use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use voicegate_voiceprint::{
    Candidate, ConfidenceScale, Embedding, RankOptions, StubModel, VerifierConfig, Verifier,
    codec, matcher, score,
};

fn make_sine_pcm(freq_hz: f64, n_samples: usize, sample_rate: usize) -> Vec<u8> {
    let mut audio = vec![0u8; n_samples * 2];
    for i in 0..n_samples {
        let t = i as f64 / sample_rate as f64;
        let sample = (16000.0 * (freq_hz * 2.0 * std::f64::consts::PI * t).sin()) as i16;
        audio[2 * i] = sample as u8;
        audio[2 * i + 1] = (sample >> 8) as u8;
    }
    audio
}

fn make_embedding(seed: usize, dim: usize) -> Embedding {
    let raw: Vec<f32> = (0..dim)
        .map(|i| ((i * 7919 + seed * 104_729) % 1000) as f32 / 1000.0 - 0.5)
        .collect();
    codec::normalize(&raw).unwrap()
}

fn bench_codec(c: &mut Criterion) {
    let emb = make_embedding(1, 192);
    let bytes = codec::serialize(&emb);

    c.bench_function("voiceprint_serialize_192d", |b| {
        b.iter(|| black_box(codec::serialize(black_box(&emb))));
    });
    c.bench_function("voiceprint_deserialize_192d", |b| {
        b.iter(|| black_box(codec::deserialize(black_box(&bytes)).unwrap()));
    });
}

fn bench_score(c: &mut Criterion) {
    let a = make_embedding(1, 192);
    let b_emb = make_embedding(2, 192);

    c.bench_function("voiceprint_score_192d", |b| {
        b.iter(|| black_box(score(black_box(&a), black_box(&b_emb))));
    });
}

fn bench_best_of(c: &mut Criterion) {
    let probe = make_embedding(0, 192);
    let candidates: Vec<Vec<u8>> = (1..=100)
        .map(|i| codec::serialize(&make_embedding(i, 192)))
        .collect();

    c.bench_function("voiceprint_best_of_100", |b| {
        b.iter(|| black_box(matcher::best_of(black_box(&probe), &candidates).unwrap()));
    });
}

fn bench_rank(c: &mut Criterion) {
    let probe = make_embedding(0, 192);
    let candidates: Vec<Candidate> = (1..=1000)
        .map(|i| Candidate {
            id: format!("speaker_{i}.wav"),
            speaker_name: format!("speaker_{i}"),
            embedding: make_embedding(i, 192),
        })
        .collect();
    let opts = RankOptions {
        top_k: Some(10),
        ..RankOptions::default()
    };
    let scale = ConfidenceScale::default();

    c.bench_function("voiceprint_rank_1000", |b| {
        b.iter(|| {
            let ranking = matcher::rank(&probe, candidates.clone(), &opts, &scale).unwrap();
            black_box(ranking)
        });
    });
}

fn bench_embed_pcm(c: &mut Criterion) {
    let verifier = Verifier::new(Arc::new(StubModel::default()), VerifierConfig::default()).unwrap();
    let native = make_sine_pcm(440.0, 48000, 16000); // 3s
    let resampled = make_sine_pcm(440.0, 144_000, 48000); // 3s

    c.bench_function("voiceprint_embed_3s_16k", |b| {
        b.iter(|| black_box(verifier.embed_pcm(black_box(&native), 16000).unwrap()));
    });
    c.bench_function("voiceprint_embed_3s_48k", |b| {
        b.iter(|| black_box(verifier.embed_pcm(black_box(&resampled), 48000).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_codec,
    bench_score,
    bench_best_of,
    bench_rank,
    bench_embed_pcm,
);
criterion_main!(benches);
