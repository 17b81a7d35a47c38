use crate::assemble::CollagePlan;
use crate::segment::window_length;
use crate::signal::AudioSignal;
use crate::window::{DeclickFunction, apply_declick};
use crate::{Error, Result};

/// Render the audio of a collage plan from the corpus it was matched against.
///
/// Each step's corpus snippet is copied in order. With a nonzero padding the
/// first `padding` samples of every snippet are summed onto the tail of the
/// previous one; with a declick function both ends of every snippet are
/// faded over the padding length first.
///
/// # Errors
/// [`Error::InvalidWindow`] if a step points outside `corpus`.
///
/// # Example
/// ```
/// use audiocollage::assemble::{CollagePlan, CollageStep, FrameRange};
/// use audiocollage::render::render_audio;
/// use audiocollage::signal::AudioSignal;
///
/// let corpus = AudioSignal::new((0..8).map(|i| i as f32).collect(), 1000).unwrap();
/// let step = |offset| CollageStep {
///     pointer: 0,
///     window_ms: 2,
///     advance: 2,
///     distance: 0.0,
///     source_offset: offset,
///     source_len: 2,
///     frames: FrameRange { start: 0, end: 0 },
/// };
/// let plan = CollagePlan { steps: vec![step(6), step(0)], target_len: 4, padding_ms: 0 };
/// let audio = render_audio(&plan, &corpus, None).unwrap();
/// assert_eq!(audio.samples(), &[6.0, 7.0, 0.0, 1.0]);
/// ```
pub fn render_audio(
    plan: &CollagePlan,
    corpus: &AudioSignal,
    declick: Option<DeclickFunction>,
) -> Result<AudioSignal> {
    let overlap = window_length(plan.padding_ms, corpus.sample_rate());
    let mut out: Vec<f32> = Vec::with_capacity(plan.target_len);

    for step in plan.iter() {
        let end = step.source_offset + step.source_len;
        if step.source_len == 0 || end > corpus.len() {
            return Err(Error::InvalidWindow {
                offset: step.source_offset,
                len: step.source_len,
                reason: "snippet lies outside the corpus signal",
            });
        }
        let mut snippet = corpus.samples()[step.source_offset..end].to_vec();
        if let Some(function) = declick {
            apply_declick(&mut snippet, function, overlap);
        }

        let n = overlap.min(out.len()).min(snippet.len());
        let tail = out.len() - n;
        for (o, s) in out[tail..].iter_mut().zip(&snippet[..n]) {
            *o += s;
        }
        out.extend_from_slice(&snippet[n..]);
    }

    AudioSignal::new(out, corpus.sample_rate())
}
