use parking_lot::Mutex;

use crate::VoiceprintError;
use crate::waveform::Waveform;

/// Extracts speaker embedding vectors from a canonical waveform.
///
/// The input is mono float audio at the model's sample rate (see
/// [`crate::WaveformNormalizer`]). The output is a raw dense vector whose
/// length is [`VoiceprintModel::dimension`]; it does not need to be
/// normalized, callers always normalize it again.
///
/// Identical waveforms must produce identical vectors, up to whatever
/// numerical nondeterminism the underlying engine documents.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use. Engines that cannot run
/// two inferences at once should implement [`ExclusiveModel`] and be wrapped
/// in a [`LockedModel`].
pub trait VoiceprintModel: Send + Sync {
    /// Computes a raw speaker embedding.
    fn extract(&self, waveform: &Waveform) -> Result<Vec<f32>, VoiceprintError>;

    /// Returns the dimensionality of the embedding vectors (e.g., 192).
    fn dimension(&self) -> usize;
}

/// An extractor that needs exclusive access for each inference.
pub trait ExclusiveModel: Send {
    fn extract(&mut self, waveform: &Waveform) -> Result<Vec<f32>, VoiceprintError>;

    fn dimension(&self) -> usize;
}

/// Serializes calls into a non-reentrant [`ExclusiveModel`] so it can be
/// shared as a [`VoiceprintModel`].
pub struct LockedModel<M> {
    inner: Mutex<M>,
    dim: usize,
}

impl<M: ExclusiveModel> LockedModel<M> {
    pub fn new(model: M) -> Self {
        let dim = model.dimension();
        Self {
            inner: Mutex::new(model),
            dim,
        }
    }

    /// Returns the wrapped model.
    pub fn into_inner(self) -> M {
        self.inner.into_inner()
    }
}

impl<M: ExclusiveModel> VoiceprintModel for LockedModel<M> {
    fn extract(&self, waveform: &Waveform) -> Result<Vec<f32>, VoiceprintError> {
        self.inner.lock().extract(waveform)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
