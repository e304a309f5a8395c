use crate::codec::Embedding;

/// Computes the similarity of two embeddings as their dot product.
///
/// Both inputs are expected to be unit length, which every codec path
/// guarantees; under that precondition the result is the cosine similarity
/// in [-1, 1]. The norms are not re-checked here since this runs once per
/// candidate in ranking loops. Accumulates in f64 so the result is
/// symmetric and independent of summation drift.
pub fn score(a: &Embedding, b: &Embedding) -> f32 {
    dot(a.as_slice(), b.as_slice())
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "voiceprint: embedding dimension mismatch");
    a.iter()
        .zip(b)
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum::<f64>() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::normalize;

    #[test]
    fn self_similarity() {
        let a = normalize(&[0.2, -0.4, 0.9, 1.3, -0.05]).unwrap();
        assert!((score(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn symmetric() {
        let a = normalize(&[0.2, -0.4, 0.9]).unwrap();
        let b = normalize(&[-1.0, 0.3, 0.5]).unwrap();
        assert_eq!(score(&a, &b), score(&b, &a));
    }

    #[test]
    fn orthogonal_and_opposite() {
        let x = normalize(&[1.0, 0.0]).unwrap();
        let y = normalize(&[0.0, 1.0]).unwrap();
        let neg = normalize(&[-3.0, 0.0]).unwrap();
        assert!(score(&x, &y).abs() < 1e-6);
        assert!((score(&x, &neg) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn unnormalized_input_scales() {
        let unit = normalize(&[1.0, 0.0]).unwrap();
        let double = Embedding::new_unchecked(vec![2.0, 0.0]);
        assert!((score(&unit, &double) - 2.0).abs() < 1e-6);
    }
}
