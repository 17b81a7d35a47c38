use crate::{Error, Result};
use ndarray::Array2;

/// Time-frequency features of one window: rows are feature channels,
/// columns are analysis frames.
pub type FeatureMatrix = Array2<f32>;

/// A decoded mono audio signal at a fixed sample rate.
///
/// # Example
/// ```
/// use audiocollage::signal::AudioSignal;
///
/// let signal = AudioSignal::new(vec![0.0, 0.5, -0.5, 0.0], 22050).unwrap();
/// assert_eq!(signal.len(), 4);
/// assert_eq!(signal.sample_rate(), 22050);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSignal {
    /// Wrap decoded samples.
    ///
    /// # Errors
    /// Returns an error if `sample_rate` is zero or any sample is NaN/Inf.
    /// An empty signal is accepted here and rejected by [`require_samples`]
    /// before indexing or assembly.
    ///
    /// [`require_samples`]: AudioSignal::require_samples
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidSize {
                name: "sample_rate",
                value: 0,
                reason: "must be > 0",
            });
        }
        if !samples.iter().all(|v| v.is_finite()) {
            return Err(Error::NonFiniteAudio);
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Fail with [`Error::DegenerateSignal`] if the signal has no samples.
    ///
    /// `what` names the input in the error message (e.g. `"corpus"`).
    pub fn require_samples(&self, what: &'static str) -> Result<()> {
        if self.samples.is_empty() {
            return Err(Error::DegenerateSignal(what));
        }
        Ok(())
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// A contiguous slice of a parent [`AudioSignal`] with lazily extracted features.
///
/// `offset` is the index of the first sample within the parent signal and is
/// what the assembler later maps onto video frames.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioWindow {
    samples: Vec<f32>,
    sample_rate: u32,
    offset: usize,
    features: Option<FeatureMatrix>,
}

impl AudioWindow {
    /// Build a window from raw samples with no features yet.
    pub fn new(samples: Vec<f32>, sample_rate: u32, offset: usize) -> Self {
        Self {
            samples,
            sample_rate,
            offset,
            features: None,
        }
    }

    /// Copy `len` samples of `signal` starting at `offset`, truncated at the
    /// end of the signal.
    ///
    /// # Errors
    /// Returns [`Error::InvalidWindow`] if `offset` lies at or past the end of
    /// the signal or `len` is zero, since the window would be empty.
    ///
    /// # Example
    /// ```
    /// use audiocollage::signal::{AudioSignal, AudioWindow};
    ///
    /// let signal = AudioSignal::new(vec![0.1; 10], 100).unwrap();
    /// let window = AudioWindow::from_signal(&signal, 8, 4).unwrap();
    /// assert_eq!(window.len(), 2);
    /// assert_eq!(window.offset(), 8);
    /// ```
    pub fn from_signal(signal: &AudioSignal, offset: usize, len: usize) -> Result<Self> {
        if len == 0 || offset >= signal.len() {
            return Err(Error::InvalidWindow {
                offset,
                len: 0,
                reason: "window holds no samples",
            });
        }
        let end = offset.saturating_add(len).min(signal.len());
        Ok(Self::new(
            signal.samples()[offset..end].to_vec(),
            signal.sample_rate(),
            offset,
        ))
    }

    /// Attach precomputed features, replacing any present.
    pub fn with_features(mut self, features: FeatureMatrix) -> Self {
        self.features = Some(features);
        self
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn features(&self) -> Option<&FeatureMatrix> {
        self.features.as_ref()
    }

    /// Features of this window, or [`Error::MissingFeatures`] if none were
    /// extracted yet.
    pub fn require_features(&self) -> Result<&FeatureMatrix> {
        self.features.as_ref().ok_or(Error::MissingFeatures {
            offset: self.offset,
        })
    }

    /// Run `compute` over the samples unless features are already present.
    ///
    /// Features are filled at most once; later calls return the stored matrix.
    pub fn features_or_try_insert<F>(&mut self, compute: F) -> Result<&FeatureMatrix>
    where
        F: FnOnce(&[f32], u32) -> Result<FeatureMatrix>,
    {
        if self.samples.is_empty() {
            return Err(Error::InvalidWindow {
                offset: self.offset,
                len: 0,
                reason: "window holds no samples",
            });
        }
        if self.features.is_none() {
            let features = compute(&self.samples, self.sample_rate)?;
            self.features = Some(features);
        }
        self.require_features()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_rejects_zero_rate() {
        assert!(matches!(
            AudioSignal::new(vec![0.0; 4], 0),
            Err(Error::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_signal_rejects_non_finite() {
        assert!(matches!(
            AudioSignal::new(vec![0.0, f32::NAN], 100),
            Err(Error::NonFiniteAudio)
        ));
    }

    #[test]
    fn test_require_samples() {
        let empty = AudioSignal::new(Vec::new(), 100).unwrap();
        assert!(matches!(
            empty.require_samples("target"),
            Err(Error::DegenerateSignal("target"))
        ));
    }

    #[test]
    fn test_window_past_end() {
        let signal = AudioSignal::new(vec![0.0; 4], 100).unwrap();
        assert!(AudioWindow::from_signal(&signal, 4, 2).is_err());
        assert!(AudioWindow::from_signal(&signal, 0, 0).is_err());
    }

    #[test]
    fn test_features_computed_once() {
        let mut window = AudioWindow::new(vec![1.0; 8], 100, 0);
        let mut calls = 0;
        for _ in 0..3 {
            window
                .features_or_try_insert(|samples, _| {
                    calls += 1;
                    Ok(Array2::from_elem((1, 1), samples.len() as f32))
                })
                .unwrap();
        }
        assert_eq!(calls, 1);
        assert_eq!(window.features().unwrap()[(0, 0)], 8.0);
    }

    #[test]
    fn test_missing_features() {
        let window = AudioWindow::new(vec![1.0; 8], 100, 12);
        assert!(matches!(
            window.require_features(),
            Err(Error::MissingFeatures { offset: 12 })
        ));
    }
}
