use crate::distance::{DtwDistance, SequenceDistance};
use crate::feature::FeatureExtractor;
use crate::segment::segment;
use crate::signal::{AudioSignal, AudioWindow};
use crate::vptree::VpTree;
use crate::Result;

/// One vantage-point tree per corpus window duration.
///
/// Entries keep the order in which window sizes were supplied. Built once
/// before assembly and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct WindowSizeIndex<D = DtwDistance> {
    entries: Vec<(u32, VpTree<D>)>,
}

impl<D: SequenceDistance + Clone> WindowSizeIndex<D> {
    /// Segment `corpus` at every size in `window_sizes_ms`, extract features
    /// for each window and index them.
    ///
    /// # Errors
    /// * [`crate::Error::DegenerateSignal`] if the corpus is empty
    /// * [`crate::Error::InvalidWindow`] if a size rounds to zero samples
    /// * any feature extraction or distance error
    ///
    /// # Example
    /// ```
    /// use audiocollage::distance::DtwDistance;
    /// use audiocollage::feature::ChromaExtractor;
    /// use audiocollage::index::WindowSizeIndex;
    /// use audiocollage::{io, signal::AudioSignal};
    ///
    /// let corpus = AudioSignal::new(io::tone(440.0, 8000, 2.0), 8000).unwrap();
    /// let index = WindowSizeIndex::build(
    ///     &corpus,
    ///     &[1000, 500],
    ///     &ChromaExtractor::default(),
    ///     DtwDistance::default(),
    /// )
    /// .unwrap();
    /// assert_eq!(index.get(1000).unwrap().len(), 3);
    /// assert_eq!(index.get(500).unwrap().len(), 7);
    /// ```
    pub fn build<E: FeatureExtractor>(
        corpus: &AudioSignal,
        window_sizes_ms: &[u32],
        extractor: &E,
        distance: D,
    ) -> Result<Self> {
        corpus.require_samples("corpus")?;
        let mut entries = Vec::with_capacity(window_sizes_ms.len());
        for &window_ms in window_sizes_ms {
            let mut windows = segment(corpus, window_ms)?;
            extract_all(&mut windows, extractor)?;
            log::debug!(
                "indexing {} corpus windows of {} ms",
                windows.len(),
                window_ms
            );
            entries.push((window_ms, VpTree::build(windows, distance.clone())?));
        }
        Ok(Self { entries })
    }
}

impl<D> WindowSizeIndex<D> {
    /// Assemble an index from trees built elsewhere.
    pub fn from_trees(entries: Vec<(u32, VpTree<D>)>) -> Self {
        Self { entries }
    }

    /// Tree for `window_ms`, the first one if the size was given twice.
    pub fn get(&self, window_ms: u32) -> Option<&VpTree<D>> {
        self.entries
            .iter()
            .find(|(ms, _)| *ms == window_ms)
            .map(|(_, tree)| tree)
    }

    pub fn window_sizes_ms(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|(ms, _)| *ms)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &VpTree<D>)> {
        self.entries.iter().map(|(ms, tree)| (*ms, tree))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn extract_all<E: FeatureExtractor>(windows: &mut [AudioWindow], extractor: &E) -> Result<()> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        windows
            .par_iter_mut()
            .try_for_each(|w| extractor.extract(w).map(|_| ()))
    }
    #[cfg(not(feature = "parallel"))]
    {
        windows
            .iter_mut()
            .try_for_each(|w| extractor.extract(w).map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::ChromaExtractor;
    use crate::io::tone;
    use crate::Error;

    #[test]
    fn test_build_keeps_order_and_features() {
        let corpus = AudioSignal::new(tone(330.0, 4000, 1.5), 4000).unwrap();
        let index = WindowSizeIndex::build(
            &corpus,
            &[500, 250],
            &ChromaExtractor::default(),
            DtwDistance::default(),
        )
        .unwrap();
        assert_eq!(index.window_sizes_ms().collect::<Vec<_>>(), vec![500, 250]);
        for (_, tree) in index.iter() {
            assert!(tree.items().iter().all(|w| w.features().is_some()));
        }
        assert!(index.get(125).is_none());
    }

    #[test]
    fn test_empty_corpus() {
        let corpus = AudioSignal::new(Vec::new(), 4000).unwrap();
        let result = WindowSizeIndex::build(
            &corpus,
            &[500],
            &ChromaExtractor::default(),
            DtwDistance::default(),
        );
        assert!(matches!(result, Err(Error::DegenerateSignal("corpus"))));
    }
}
