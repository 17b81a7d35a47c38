//! Greedy collage assembly.
//!
//! The assembler walks the target signal with a single sample pointer. At
//! each step it cuts one target chunk per candidate window size, finds the
//! nearest corpus window of that size, keeps the overall closest match, maps
//! it onto a range of sample-video frames and advances the pointer by the
//! chunk length minus the declick padding.

use crate::distance::{DtwDistance, SequenceDistance};
use crate::feature::FeatureExtractor;
use crate::index::WindowSizeIndex;
use crate::segment::window_length;
use crate::signal::{AudioSignal, AudioWindow};
use crate::vptree::Neighbor;
use crate::window::DeclickFunction;
use crate::{Error, Result};
use std::ops::Range;
use std::path::PathBuf;

/// Collage settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CollageConfig {
    /// Candidate window durations in milliseconds, in evaluation order.
    /// Earlier entries win exact distance ties.
    pub window_sizes_ms: Vec<u32>,
    /// Overlap between consecutive snippets. `None` falls back to the
    /// declick function's default, or 0 without one.
    pub declick_padding_ms: Option<u32>,
    /// Fade applied when rendering audio.
    pub declick: Option<DeclickFunction>,
    /// Destination of the encoded collage; not used by the matching engine.
    pub output_path: PathBuf,
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            window_sizes_ms: vec![1000, 500],
            declick_padding_ms: None,
            declick: None,
            output_path: PathBuf::from("./collage.mp4"),
        }
    }
}

impl CollageConfig {
    /// Resolved declick padding in milliseconds.
    ///
    /// # Example
    /// ```
    /// use audiocollage::assemble::CollageConfig;
    /// use audiocollage::window::DeclickFunction;
    ///
    /// let mut config = CollageConfig::default();
    /// assert_eq!(config.padding_ms(), 0);
    /// config.declick = Some(DeclickFunction::Linear);
    /// assert_eq!(config.padding_ms(), 70);
    /// config.declick_padding_ms = Some(35);
    /// assert_eq!(config.padding_ms(), 35);
    /// ```
    pub fn padding_ms(&self) -> u32 {
        self.declick_padding_ms
            .or(self.declick.map(DeclickFunction::default_padding_ms))
            .unwrap_or(0)
    }

    /// Window sizes widened by the padding; these key the corpus index.
    pub fn effective_window_sizes_ms(&self) -> Vec<u32> {
        let padding = self.padding_ms();
        self.window_sizes_ms.iter().map(|ms| ms + padding).collect()
    }

    /// Padding expressed in samples at `sample_rate`.
    pub fn padding_samples(&self, sample_rate: u32) -> usize {
        window_length(self.padding_ms(), sample_rate)
    }

    /// Check the configuration against the target sample rate.
    ///
    /// # Errors
    /// [`Error::InvalidParameter`] for an empty size list, or for a size
    /// whose per-step advance would not be positive.
    pub fn validate(&self, sample_rate: u32) -> Result<()> {
        if self.window_sizes_ms.is_empty() {
            return Err(Error::InvalidParameter {
                name: "window_sizes_ms",
                value: "[]".into(),
                reason: "at least one window size is required".into(),
            });
        }
        let padding = self.padding_samples(sample_rate);
        for ms in self.effective_window_sizes_ms() {
            let len = window_length(ms, sample_rate);
            if len <= padding {
                return Err(Error::InvalidParameter {
                    name: "window_sizes_ms",
                    value: ms.to_string(),
                    reason: format!(
                        "window of {len} samples does not exceed the {padding}-sample declick padding"
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Half-open range `[start, end)` of sample-video frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRange {
    pub start: usize,
    pub end: usize,
}

impl FrameRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Timing of the sample video relative to its corpus audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoTimeline {
    frame_count: usize,
    fps: f64,
    corpus_samples: usize,
}

impl VideoTimeline {
    /// # Errors
    /// [`Error::DegenerateSignal`] if the video has no frames or the corpus
    /// no samples; [`Error::InvalidParameter`] for a non-positive frame rate.
    pub fn new(frame_count: usize, fps: f64, corpus_samples: usize) -> Result<Self> {
        if frame_count == 0 {
            return Err(Error::DegenerateSignal("video"));
        }
        if corpus_samples == 0 {
            return Err(Error::DegenerateSignal("corpus"));
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err(Error::InvalidParameter {
                name: "fps",
                value: fps.to_string(),
                reason: "must be a positive finite frame rate".into(),
            });
        }
        Ok(Self {
            frame_count,
            fps,
            corpus_samples,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Video duration in seconds.
    pub fn duration(&self) -> f64 {
        self.frame_count as f64 / self.fps
    }

    /// Video frames per corpus audio sample.
    pub fn frames_per_sample(&self) -> f64 {
        self.frame_count as f64 / self.corpus_samples as f64
    }

    /// Map a corpus window to video frames, clamped to `[0, frame_count - 1]`.
    ///
    /// # Example
    /// ```
    /// use audiocollage::assemble::VideoTimeline;
    ///
    /// // 100 frames over 10 000 samples: one frame per 100 samples
    /// let timeline = VideoTimeline::new(100, 25.0, 10_000).unwrap();
    /// let range = timeline.frame_range(2_000, 500);
    /// assert_eq!((range.start, range.end), (20, 25));
    /// assert_eq!(timeline.frame_range(9_800, 500).end, 99);
    /// ```
    pub fn frame_range(&self, offset: usize, len: usize) -> FrameRange {
        let ratio = self.frames_per_sample();
        let last = self.frame_count - 1;
        let to_frame = |sample: usize| ((sample as f64 * ratio) as usize).min(last);
        let start = to_frame(offset);
        let end = to_frame(offset + len).max(start);
        FrameRange { start, end }
    }
}

/// One selected snippet.
#[derive(Debug, Clone, PartialEq)]
pub struct CollageStep {
    /// Target sample position the snippet starts at.
    pub pointer: usize,
    /// Effective (padded) window duration that won.
    pub window_ms: u32,
    /// Pointer increment taken after this step.
    pub advance: usize,
    pub distance: f32,
    /// Offset of the matched window in the corpus signal.
    pub source_offset: usize,
    /// Length of the matched corpus window in samples.
    pub source_len: usize,
    pub frames: FrameRange,
}

/// Ordered snippets covering the target track.
#[derive(Debug, Clone, PartialEq)]
pub struct CollagePlan {
    pub steps: Vec<CollageStep>,
    pub target_len: usize,
    pub padding_ms: u32,
}

impl CollagePlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollageStep> {
        self.steps.iter()
    }

    /// Frame ranges in target-time order.
    pub fn frame_ranges(&self) -> Vec<FrameRange> {
        self.steps.iter().map(|s| s.frames).collect()
    }

    /// Slice decoded video frames into the collage frame run.
    ///
    /// Ranges beyond `frames` are cut short rather than panicking.
    pub fn frame_run<'a, F>(&self, frames: &'a [F]) -> Vec<&'a [F]> {
        self.steps
            .iter()
            .map(|s| {
                let end = s.frames.end.min(frames.len());
                let start = s.frames.start.min(end);
                &frames[start..end]
            })
            .collect()
    }
}

/// Best match for one candidate window size.
struct Candidate<'a> {
    rank: usize,
    window_ms: u32,
    target_len: usize,
    neighbor: Neighbor<'a>,
}

/// Drives the greedy matching walk over a target signal.
pub struct CollageAssembler<'a, E, D = DtwDistance> {
    config: &'a CollageConfig,
    index: &'a WindowSizeIndex<D>,
    extractor: &'a E,
    timeline: VideoTimeline,
}

impl<'a, E: FeatureExtractor, D: SequenceDistance> CollageAssembler<'a, E, D> {
    /// `index` must be keyed by [`CollageConfig::effective_window_sizes_ms`];
    /// sizes missing from it are treated as empty.
    pub fn new(
        config: &'a CollageConfig,
        index: &'a WindowSizeIndex<D>,
        extractor: &'a E,
        timeline: VideoTimeline,
    ) -> Self {
        Self {
            config,
            index,
            extractor,
            timeline,
        }
    }

    /// Walk `target` from sample 0 to its end and collect the chosen snippets.
    ///
    /// # Errors
    /// * [`Error::DegenerateSignal`] if `target` is empty
    /// * [`Error::InvalidParameter`] if the configuration is invalid
    /// * [`Error::NoEligibleMatch`] if every candidate index is empty at a step
    pub fn assemble(&self, target: &AudioSignal) -> Result<CollagePlan> {
        target.require_samples("target")?;
        self.config.validate(target.sample_rate())?;

        let mut steps = Vec::new();
        let mut pointer = 0;
        while pointer < target.len() {
            log::debug!(
                "collage {}% complete (sample {} of {})",
                pointer * 100 / target.len(),
                pointer,
                target.len()
            );
            let step = self.step(target, pointer)?;
            pointer += step.advance;
            steps.push(step);
        }

        log::info!(
            "collage assembled from {} snippets over {} target samples",
            steps.len(),
            target.len()
        );
        Ok(CollagePlan {
            steps,
            target_len: target.len(),
            padding_ms: self.config.padding_ms(),
        })
    }

    /// Select the best snippet for the target chunk starting at `pointer`.
    pub fn step(&self, target: &AudioSignal, pointer: usize) -> Result<CollageStep> {
        let sizes = self.config.effective_window_sizes_ms();
        let padding = self.config.padding_samples(target.sample_rate());

        let evaluated: Vec<Result<Option<Candidate<'_>>>> = {
            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                sizes
                    .par_iter()
                    .enumerate()
                    .map(|(rank, &ms)| self.evaluate(target, pointer, rank, ms))
                    .collect()
            }
            #[cfg(not(feature = "parallel"))]
            {
                sizes
                    .iter()
                    .enumerate()
                    .map(|(rank, &ms)| self.evaluate(target, pointer, rank, ms))
                    .collect()
            }
        };

        let mut best: Option<Candidate<'_>> = None;
        for candidate in evaluated {
            let Some(candidate) = candidate? else { continue };
            let better = match &best {
                None => true,
                Some(b) => {
                    candidate.neighbor.distance < b.neighbor.distance
                        || (candidate.neighbor.distance == b.neighbor.distance
                            && candidate.rank < b.rank)
                }
            };
            if better {
                best = Some(candidate);
            }
        }
        let best = best.ok_or(Error::NoEligibleMatch { pointer })?;

        let matched = best.neighbor.window;
        Ok(CollageStep {
            pointer,
            window_ms: best.window_ms,
            advance: best.target_len - padding,
            distance: best.neighbor.distance,
            source_offset: matched.offset(),
            source_len: matched.len(),
            frames: self.timeline.frame_range(matched.offset(), matched.len()),
        })
    }

    fn evaluate(
        &self,
        target: &AudioSignal,
        pointer: usize,
        rank: usize,
        window_ms: u32,
    ) -> Result<Option<Candidate<'a>>> {
        let Some(tree) = self.index.get(window_ms).filter(|t| !t.is_empty()) else {
            log::warn!("no corpus windows of {window_ms} ms, skipping candidate");
            return Ok(None);
        };

        let target_len = window_length(window_ms, target.sample_rate());
        let mut chunk = AudioWindow::from_signal(target, pointer, target_len)?;
        self.extractor.extract(&mut chunk)?;

        match tree.query_nearest(&chunk) {
            Ok(neighbor) => Ok(Some(Candidate {
                rank,
                window_ms,
                target_len,
                neighbor,
            })),
            Err(Error::EmptyIndex) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
