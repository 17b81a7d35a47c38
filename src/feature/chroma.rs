use super::FeatureExtractor;
use crate::Result;
use crate::signal::FeatureMatrix;
use crate::spectrum::{StftConfig, power_spectrogram};
use ndarray::Array2;

/// Convert frequencies (Hz) to fractional octave numbers.
/// A440 is at octave 4.0.
pub fn hz_to_octs(frequencies: &[f32], tuning: f32, bins_per_octave: usize) -> Vec<f32> {
    let a440 = 440.0 * 2.0_f32.powf(tuning / bins_per_octave as f32);
    let ref_freq = a440 / 16.0; // A0 = 27.5 Hz

    frequencies
        .iter()
        .map(|&f| {
            if f > 0.0 {
                (f / ref_freq).log2()
            } else {
                f32::NEG_INFINITY
            }
        })
        .collect()
}

/// Create a chroma filter bank.
///
/// Projects the `n_fft / 2 + 1` FFT bins onto `n_chroma` pitch classes with
/// Gaussian bumps, each column L2-normalized, weighted by a Gaussian over
/// octaves centered at octave 5 (width 2), starting at C.
///
/// # Arguments
/// * `sr` - Sample rate
/// * `n_fft` - FFT size
/// * `n_chroma` - Number of chroma bins
/// * `tuning` - Tuning deviation from A440 in fractional bins
pub fn chroma_filterbank(sr: u32, n_fft: usize, n_chroma: usize, tuning: f32) -> Array2<f32> {
    const CENTER_OCTAVE: f32 = 5.0;
    const OCTAVE_WIDTH: f32 = 2.0;

    let n_freq = n_fft / 2 + 1;
    let mut wts = Array2::<f32>::zeros((n_chroma, n_freq));

    if n_fft == 0 || n_chroma == 0 {
        return wts;
    }

    // FFT bin frequencies, excluding DC
    let frequencies: Vec<f32> = (1..n_fft)
        .map(|i| i as f32 * sr as f32 / n_fft as f32)
        .collect();

    let n_chroma_f = n_chroma as f32;
    let mut frqbins: Vec<f32> = hz_to_octs(&frequencies, tuning, n_chroma)
        .iter()
        .map(|&o| o * n_chroma_f)
        .collect();

    // DC sits 1.5 octaves below bin 1
    let dc_bin = frqbins.first().map_or(0.0, |&b| b - 1.5 * n_chroma_f);
    frqbins.insert(0, dc_bin);

    let binwidthbins: Vec<f32> = (0..frqbins.len())
        .map(|i| {
            frqbins
                .get(i + 1)
                .map_or(1.0, |next| (next - frqbins[i]).max(1.0))
        })
        .collect();

    let half = (n_chroma_f / 2.0).round();
    for chroma in 0..n_chroma {
        for fbin in 0..n_freq {
            // wrap the distance into [-n_chroma/2, n_chroma/2)
            let d = frqbins[fbin] - chroma as f32;
            let d = ((d + half + 10.0 * n_chroma_f) % n_chroma_f) - half;
            let width = binwidthbins[fbin];
            wts[(chroma, fbin)] = (-0.5 * (2.0 * d / width).powi(2)).exp();
        }
    }

    for (fbin, mut column) in wts.columns_mut().into_iter().enumerate() {
        let norm = column
            .iter()
            .map(|&w| (w as f64).powi(2))
            .sum::<f64>()
            .sqrt()
            .max(1e-10);
        let oct = frqbins[fbin] / n_chroma_f;
        let weight = (-0.5 * ((oct - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
        column.mapv_inplace(|w| (w as f64 / norm) as f32 * weight);
    }

    // Roll so that bin 0 is C rather than A
    let shift = 3 * (n_chroma / 12);
    if shift > 0 && shift < n_chroma {
        let mut rolled = Array2::<f32>::zeros((n_chroma, n_freq));
        for chroma in 0..n_chroma {
            let new_chroma = (chroma + n_chroma - shift) % n_chroma;
            rolled.row_mut(new_chroma).assign(&wts.row(chroma));
        }
        wts = rolled;
    }

    wts
}

/// Compute a chromagram from a waveform using STFT.
///
/// # Arguments
/// * `y` - Audio samples
/// * `sr` - Sample rate
/// * `config` - FFT size, hop, number of chroma bins and tuning
///
/// # Returns
/// Chromagram with shape (n_chroma, n_frames); each frame is scaled so its
/// largest bin is 1 (frames of silence stay zero)
///
/// # Example
/// ```
/// use audiocollage::feature::chroma::{ChromaConfig, chroma_stft};
/// use audiocollage::io;
///
/// let y = io::tone(440.0, 22050, 0.5);
/// let chroma = chroma_stft(&y, 22050, &ChromaConfig::default()).unwrap();
/// assert_eq!(chroma.shape()[0], 12);
/// ```
pub fn chroma_stft(y: &[f32], sr: u32, config: &ChromaConfig) -> Result<Array2<f32>> {
    config.validate()?;
    let stft_cfg = StftConfig::new(config.n_fft, config.hop_length);
    let power = power_spectrogram(y, &stft_cfg)?;

    let chromafb = chroma_filterbank(sr, config.n_fft, config.n_chroma, config.tuning);
    let mut chroma = chromafb.dot(&power);

    for mut column in chroma.columns_mut() {
        let max_val = column.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        if max_val > 1e-10 {
            column.mapv_inplace(|v| v / max_val);
        }
    }

    Ok(chroma)
}

/// Chroma analysis settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaConfig {
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_chroma: usize,
    /// Tuning deviation from A440 in fractional chroma bins.
    pub tuning: f32,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            n_chroma: 12,
            tuning: 0.0,
        }
    }
}

impl ChromaConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("n_fft", self.n_fft),
            ("hop_length", self.hop_length),
            ("n_chroma", self.n_chroma),
        ] {
            if value == 0 {
                return Err(crate::Error::InvalidSize {
                    name,
                    value,
                    reason: "must be > 0",
                });
            }
        }
        if !self.tuning.is_finite() {
            return Err(crate::Error::InvalidParameter {
                name: "tuning",
                value: self.tuning.to_string(),
                reason: "must be finite".into(),
            });
        }
        Ok(())
    }
}

/// Chroma feature extractor used for both corpus and target windows.
///
/// Windows shorter than `n_fft` are zero-padded by the centered STFT, so any
/// window of at least one sample produces at least one frame.
#[derive(Debug, Clone, Default)]
pub struct ChromaExtractor {
    config: ChromaConfig,
}

impl ChromaExtractor {
    pub fn new(config: ChromaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChromaConfig {
        &self.config
    }
}

impl FeatureExtractor for ChromaExtractor {
    fn compute(&self, samples: &[f32], sample_rate: u32) -> Result<FeatureMatrix> {
        chroma_stft(samples, sample_rate, &self.config)
    }
}
