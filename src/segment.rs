use crate::signal::{AudioSignal, AudioWindow};
use crate::{Error, Result};

/// Number of samples spanned by a window of `window_ms` milliseconds.
///
/// # Example
/// ```
/// use audiocollage::segment::window_length;
///
/// assert_eq!(window_length(500, 22050), 11025);
/// assert_eq!(window_length(1000, 1000), 1000);
/// ```
pub fn window_length(window_ms: u32, sample_rate: u32) -> usize {
    (window_ms as f64 / 1000.0 * sample_rate as f64).round() as usize
}

/// Hop between successive window starts: half a window, at least one sample.
pub fn hop_length(window_len: usize) -> usize {
    (window_len / 2).max(1)
}

/// Compute the start offsets of 50%-overlapping windows over a signal.
///
/// Windows are emitted until one reaches the end of the signal, so the last
/// window may be truncated. A signal shorter than one window yields a single
/// window at offset 0.
///
/// # Arguments
/// * `len` - Length of the signal in samples
/// * `window_len` - Nominal window length in samples
///
/// # Returns
/// Vector of starting indices, empty only when `len == 0`
///
/// # Example
/// ```
/// use audiocollage::segment::window_offsets;
///
/// let offsets = window_offsets(1000, 400).unwrap();
/// assert_eq!(offsets, vec![0, 200, 400, 600]);
/// ```
pub fn window_offsets(len: usize, window_len: usize) -> Result<Vec<usize>> {
    if window_len == 0 {
        return Err(Error::InvalidWindow {
            offset: 0,
            len: 0,
            reason: "window duration rounds to zero samples",
        });
    }
    if len == 0 {
        return Ok(Vec::new());
    }

    let hop = hop_length(window_len);
    let mut offsets = vec![0];
    let mut start = 0;
    while start + window_len < len {
        start += hop;
        offsets.push(start);
    }
    Ok(offsets)
}

/// Split a signal into 50%-overlapping windows of `window_ms` milliseconds.
///
/// Each window records its offset within `signal`; features are left empty.
///
/// # Errors
/// * [`Error::DegenerateSignal`] if the signal has no samples
/// * [`Error::InvalidWindow`] if `window_ms` rounds to zero samples
///
/// # Example
/// ```
/// use audiocollage::segment::segment;
/// use audiocollage::signal::AudioSignal;
///
/// let signal = AudioSignal::new(vec![0.0; 2500], 1000).unwrap();
/// let windows = segment(&signal, 1000).unwrap();
/// assert_eq!(windows.len(), 4);
/// assert_eq!(windows[3].offset(), 1500);
/// assert_eq!(windows[3].len(), 1000);
/// ```
pub fn segment(signal: &AudioSignal, window_ms: u32) -> Result<Vec<AudioWindow>> {
    signal.require_samples("signal")?;
    let window_len = window_length(window_ms, signal.sample_rate());
    window_offsets(signal.len(), window_len)?
        .into_iter()
        .map(|offset| AudioWindow::from_signal(signal, offset, window_len))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_length_rounds() {
        assert_eq!(window_length(1, 1500), 2);
        assert_eq!(window_length(0, 22050), 0);
        assert_eq!(window_length(1020, 22050), 22491);
    }

    #[test]
    fn test_offsets_exact_fit() {
        // L == W produces a single untruncated window
        assert_eq!(window_offsets(500, 500).unwrap(), vec![0]);
    }

    #[test]
    fn test_offsets_short_signal() {
        assert_eq!(window_offsets(100, 500).unwrap(), vec![0]);
    }

    #[test]
    fn test_offsets_zero_window() {
        assert!(window_offsets(100, 0).is_err());
    }

    #[test]
    fn test_single_sample_window_advances() {
        assert_eq!(window_offsets(3, 1).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_segment_truncates_last_window() {
        let signal = AudioSignal::new((0..1100).map(|i| i as f32).collect(), 1000).unwrap();
        let windows = segment(&signal, 400).unwrap();
        let last = windows.last().unwrap();
        assert_eq!(last.offset(), 800);
        assert_eq!(last.len(), 300);
        assert_eq!(last.samples()[0], 800.0);
        for w in &windows {
            assert!(w.offset() + w.len() <= signal.len());
            assert!(w.features().is_none());
        }
    }

    #[test]
    fn test_segment_empty_signal() {
        let signal = AudioSignal::new(Vec::new(), 1000).unwrap();
        assert!(matches!(
            segment(&signal, 500),
            Err(Error::DegenerateSignal(_))
        ));
    }
}
