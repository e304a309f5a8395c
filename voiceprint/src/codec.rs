//! Embedding normalization and the portable byte encoding.
//!
//! The wire form of an embedding is its raw `f32` values in little-endian
//! order, with no header and no compression; the caller already knows the
//! dimensionality. The text form is the standard base64 of those bytes.
//!
//! Decoding always re-normalizes. Stored or received vectors may come from
//! another process or version whose normalization drifted, and those are
//! scored as if they were unit length. A vector with zero or non-finite norm
//! on this path is replaced by the zero vector and reported through
//! [`Decoded::degenerate`] instead of failing, so one corrupt registry entry
//! cannot abort a batch comparison or win it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;

use crate::error::VoiceprintError;

/// A speaker embedding.
///
/// Every constructor except [`Embedding::new_unchecked`] guarantees a
/// Euclidean norm of 1.0 within floating-point tolerance. The one exception
/// is a degenerate decode, flagged in [`Decoded`], which yields the zero
/// vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Wraps a vector without normalizing it.
    ///
    /// Scores computed with such an embedding are scaled by its norm rather
    /// than being true cosine similarities.
    pub fn new_unchecked(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }

    /// Returns the dimensionality.
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Returns the Euclidean norm.
    pub fn norm(&self) -> f32 {
        l2_norm(&self.0)
    }
}

impl AsRef<[f32]> for Embedding {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Result of [`deserialize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub embedding: Embedding,
    /// True when the decoded vector had zero or non-finite norm. The
    /// embedding is then all zeros.
    pub degenerate: bool,
}

/// Normalizes a raw extractor output to unit length.
///
/// Fails with [`VoiceprintError::DegenerateVector`] if the vector is empty,
/// has zero norm or contains non-finite values.
pub fn normalize(raw: &[f32]) -> Result<Embedding, VoiceprintError> {
    let norm = l2_norm(raw);
    if !(norm > 0.0 && norm.is_finite()) {
        return Err(VoiceprintError::DegenerateVector { norm });
    }
    Ok(Embedding(scale(raw, norm)))
}

/// Serializes an embedding to little-endian `f32` bytes.
pub fn serialize(embedding: &Embedding) -> Vec<u8> {
    let mut out = Vec::with_capacity(embedding.dim() * 4);
    for v in embedding.as_slice() {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Parses little-endian `f32` bytes and re-normalizes the result.
pub fn deserialize(data: &[u8]) -> Result<Decoded, VoiceprintError> {
    if data.is_empty() {
        return Err(VoiceprintError::MalformedEncoding(
            "empty embedding".to_string(),
        ));
    }
    if data.len() % 4 != 0 {
        return Err(VoiceprintError::MalformedEncoding(format!(
            "embedding length {} is not a multiple of 4",
            data.len()
        )));
    }

    let raw: Vec<f32> = data
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    let norm = l2_norm(&raw);
    if norm > 0.0 && norm.is_finite() {
        return Ok(Decoded {
            embedding: Embedding(scale(&raw, norm)),
            degenerate: false,
        });
    }

    // Zero, NaN and infinite norms all collapse to the zero vector, which
    // scores 0 against everything.
    warn!(norm, dim = raw.len(), "decoded embedding has no usable norm, zeroing it");
    Ok(Decoded {
        embedding: Embedding(vec![0.0; raw.len()]),
        degenerate: true,
    })
}

/// Serializes an embedding to standard base64.
pub fn to_base64(embedding: &Embedding) -> String {
    STANDARD.encode(serialize(embedding))
}

/// Decodes standard base64 into raw bytes.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, VoiceprintError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| VoiceprintError::MalformedEncoding(format!("invalid base64: {e}")))
}

/// Decodes a base64 embedding and re-normalizes it.
pub fn from_base64(text: &str) -> Result<Decoded, VoiceprintError> {
    deserialize(&decode_base64(text)?)
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt() as f32
}

fn scale(v: &[f32], norm: f32) -> Vec<f32> {
    v.iter().map(|x| x / norm).collect()
}
