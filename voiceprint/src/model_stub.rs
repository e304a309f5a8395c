//! Deterministic stand-in extractor.

use crate::VoiceprintError;
use crate::model::VoiceprintModel;
use crate::waveform::Waveform;

/// Default dimensionality, matching ECAPA-TDNN speaker models.
pub const STUB_DIMENSION: usize = 192;

/// [`VoiceprintModel`] that derives a pseudo-random vector from the exact
/// waveform content.
///
/// The waveform's sample bits and rate are hashed with FNV-1a, the hash seeds
/// a xoshiro256** generator, and the vector is drawn from a scaled normal
/// distribution. The same waveform always yields the same vector; different
/// waveforms yield nearly orthogonal ones. The output is deliberately not
/// unit length.
///
/// Used by tests and by the service's stub mode; it carries no speaker
/// information.
#[derive(Debug, Clone)]
pub struct StubModel {
    dim: usize,
}

impl StubModel {
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "voiceprint: dim must be positive");
        Self { dim }
    }
}

impl Default for StubModel {
    fn default() -> Self {
        Self::new(STUB_DIMENSION)
    }
}

impl VoiceprintModel for StubModel {
    fn extract(&self, waveform: &Waveform) -> Result<Vec<f32>, VoiceprintError> {
        let mut rng = Xoshiro256ss::new(fingerprint(waveform));
        Ok((0..self.dim)
            .map(|_| (rng.norm_float64() * 4.0) as f32)
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

fn fingerprint(waveform: &Waveform) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut h = OFFSET;
    let mut feed = |bytes: &[u8]| {
        for b in bytes {
            h ^= *b as u64;
            h = h.wrapping_mul(PRIME);
        }
    };
    feed(&waveform.sample_rate().to_le_bytes());
    for s in waveform.samples() {
        feed(&s.to_bits().to_le_bytes());
    }
    h
}

// ---------------------------------------------------------------------------
// Xoshiro256** PRNG + Box-Muller normal distribution
// ---------------------------------------------------------------------------

struct Xoshiro256ss {
    s: [u64; 4],
    spare: Option<f64>,
}

impl Xoshiro256ss {
    fn new(seed: u64) -> Self {
        // SplitMix64 to initialize state from single seed.
        let mut z = seed;
        let mut s = [0u64; 4];
        for slot in &mut s {
            z = z.wrapping_add(0x9e3779b97f4a7c15);
            let mut x = z;
            x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
            x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
            *slot = x ^ (x >> 31);
        }
        Self { s, spare: None }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.s[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.s[1] << 17;
        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];
        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);
        result
    }

    /// Uniform in [0, 1).
    fn float64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Standard normal via Box-Muller.
    fn norm_float64(&mut self) -> f64 {
        if let Some(v) = self.spare.take() {
            return v;
        }
        loop {
            let u1 = self.float64();
            let u2 = self.float64();
            if u1 > 0.0 {
                let mag = (-2.0 * u1.ln()).sqrt();
                let angle = 2.0 * std::f64::consts::PI * u2;
                self.spare = Some(mag * angle.sin());
                return mag * angle.cos();
            }
        }
    }
}
