use crate::fft::FftPlan;
use crate::window;
use ndarray::Array2;
use num_complex::Complex32;

/// Short-time Fourier transform settings.
#[derive(Debug, Clone)]
pub struct StftConfig {
    pub n_fft: usize,
    pub hop_length: usize,
    pub center: bool,
    pub window: Vec<f32>,
}

impl StftConfig {
    /// Hann-windowed configuration with the given FFT size and hop.
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        Self {
            n_fft,
            hop_length,
            center: true,
            window: window::hann(n_fft),
        }
    }
}

impl Default for StftConfig {
    fn default() -> Self {
        Self::new(2048, 512)
    }
}

fn pad_window(window: &[f32], n_fft: usize) -> Vec<f32> {
    if window.len() == n_fft {
        return window.to_vec();
    }
    let mut padded = vec![0.0f32; n_fft];
    let len = window.len().min(n_fft);
    let start = (n_fft - len) / 2;
    padded[start..start + len].copy_from_slice(&window[..len]);
    padded
}

/// Zero-pad `n_fft / 2` samples on both sides so frames are centered.
fn pad_center(y: &[f32], n_fft: usize, center: bool) -> Vec<f32> {
    if !center {
        return y.to_vec();
    }
    let pad = n_fft / 2;
    let mut out = vec![0.0f32; y.len() + 2 * pad];
    out[pad..pad + y.len()].copy_from_slice(y);
    out
}

#[inline]
fn compute_frame(
    frame: usize,
    padded: &[f32],
    window: &[f32],
    fft: &FftPlan,
    hop_length: usize,
    n_freq: usize,
) -> Vec<Complex32> {
    let start = frame * hop_length;
    let mut buffer = vec![Complex32::new(0.0, 0.0); fft.len()];
    for (i, bin) in buffer.iter_mut().enumerate() {
        let sample = padded.get(start + i).copied().unwrap_or(0.0);
        bin.re = sample * window[i];
    }
    fft.forward(&mut buffer);
    buffer.truncate(n_freq);
    buffer
}

/// Number of STFT frames for a signal of `len` samples.
///
/// With `center` enabled any non-empty signal yields at least one frame.
pub fn frame_count(len: usize, config: &StftConfig) -> usize {
    let padded_len = if config.center {
        len + 2 * (config.n_fft / 2)
    } else {
        len
    };
    if padded_len < config.n_fft || config.hop_length == 0 {
        0
    } else {
        (padded_len - config.n_fft) / config.hop_length + 1
    }
}

/// Compute the Short-Time Fourier Transform (STFT).
///
/// # Arguments
/// * `y` - Input audio signal
/// * `config` - STFT configuration (FFT size, hop length, window)
///
/// # Returns
/// Complex STFT matrix of shape (n_freq, n_frames) where n_freq = n_fft/2 + 1
///
/// # Errors
/// Returns an error if the audio is empty or non-finite, or if
/// n_fft/hop_length is zero.
pub fn stft(y: &[f32], config: &StftConfig) -> crate::Result<Array2<Complex32>> {
    if y.is_empty() {
        return Err(crate::Error::InvalidWindow {
            offset: 0,
            len: 0,
            reason: "cannot transform an empty signal",
        });
    }
    if !y.iter().all(|v| v.is_finite()) {
        return Err(crate::Error::NonFiniteAudio);
    }
    if config.n_fft == 0 {
        return Err(crate::Error::InvalidSize {
            name: "n_fft",
            value: 0,
            reason: "must be > 0",
        });
    }
    if config.hop_length == 0 {
        return Err(crate::Error::InvalidSize {
            name: "hop_length",
            value: 0,
            reason: "must be > 0",
        });
    }

    let window = pad_window(&config.window, config.n_fft);
    let padded = pad_center(y, config.n_fft, config.center);
    let n_frames = frame_count(y.len(), config);
    let n_freq = config.n_fft / 2 + 1;
    let fft = FftPlan::new(config.n_fft);

    let frame_results: Vec<Vec<Complex32>> = {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            (0..n_frames)
                .into_par_iter()
                .map(|frame| {
                    compute_frame(frame, &padded, &window, &fft, config.hop_length, n_freq)
                })
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            (0..n_frames)
                .map(|frame| {
                    compute_frame(frame, &padded, &window, &fft, config.hop_length, n_freq)
                })
                .collect()
        }
    };

    let mut stft_matrix = Array2::<Complex32>::zeros((n_freq, n_frames));
    for (frame, result) in frame_results.iter().enumerate() {
        for (f, &val) in result.iter().enumerate() {
            stft_matrix[(f, frame)] = val;
        }
    }

    Ok(stft_matrix)
}

/// Squared-magnitude spectrogram `|STFT|^2`, shape (n_freq, n_frames).
pub fn power_spectrogram(y: &[f32], config: &StftConfig) -> crate::Result<Array2<f32>> {
    let stft_matrix = stft(y, config)?;
    Ok(stft_matrix.mapv(|c| c.norm_sqr()))
}
