//! Per-window acoustic features.

pub mod chroma;

pub use chroma::{ChromaConfig, ChromaExtractor, chroma_filterbank, chroma_stft};

use crate::Result;
use crate::signal::{AudioWindow, FeatureMatrix};

/// Computes a feature matrix from a window's samples.
///
/// Implementations must be deterministic in `(samples, sample_rate)`.
pub trait FeatureExtractor: Send + Sync {
    /// Compute features for raw samples. `samples` is never empty.
    fn compute(&self, samples: &[f32], sample_rate: u32) -> Result<FeatureMatrix>;

    /// Fill `window`'s features if absent and return them.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidWindow`] for an empty window.
    fn extract<'w>(&self, window: &'w mut AudioWindow) -> Result<&'w FeatureMatrix> {
        window.features_or_try_insert(|samples, sample_rate| self.compute(samples, sample_rate))
    }
}
