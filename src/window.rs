/// Compute a periodic Hann (raised cosine) window.
///
/// Used as the STFT analysis window.
///
/// # Arguments
/// * `n` - Window length
///
/// # Returns
/// Hann window of length `n`
pub fn hann(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }
    let m = n as f32;
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / m).cos())
        .collect()
}

/// Steepness of the sigmoid fade over its normalized [0, 1] span.
const SIGMOID_STEEPNESS: f32 = 12.0;

/// Fade curve used to blend consecutive collage snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclickFunction {
    /// Logistic S-curve, short overlap.
    Sigmoid,
    /// Straight ramp, longer overlap.
    Linear,
}

impl DeclickFunction {
    /// Parse a fade name (`"sigmoid"` or `"linear"`, case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sigmoid" => Some(Self::Sigmoid),
            "linear" => Some(Self::Linear),
            _ => None,
        }
    }

    /// Overlap used when no explicit padding is configured.
    pub fn default_padding_ms(self) -> u32 {
        match self {
            Self::Sigmoid => 20,
            Self::Linear => 70,
        }
    }

    /// Gain at normalized position `x` in [0, 1], rising from 0 to 1.
    fn gain(self, x: f32) -> f32 {
        match self {
            Self::Linear => x,
            Self::Sigmoid => {
                let logistic = |t: f32| 1.0 / (1.0 + (-SIGMOID_STEEPNESS * (t - 0.5)).exp());
                let lo = logistic(0.0);
                let hi = logistic(1.0);
                (logistic(x) - lo) / (hi - lo)
            }
        }
    }
}

/// Rising gain envelope of length `n`.
///
/// `fade_in(f, n)[i] + fade_out(f, n)[i] == 1` for every `i`, so an
/// overlap-add of a fading-out tail and a fading-in head keeps unity gain.
///
/// # Example
/// ```
/// use audiocollage::window::{fade_in, fade_out, DeclickFunction};
///
/// let up = fade_in(DeclickFunction::Linear, 4);
/// let down = fade_out(DeclickFunction::Linear, 4);
/// assert_eq!(up, vec![0.0, 0.25, 0.5, 0.75]);
/// assert!(up.iter().zip(&down).all(|(a, b)| (a + b - 1.0).abs() < 1e-6));
/// ```
pub fn fade_in(function: DeclickFunction, n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| function.gain(i as f32 / n as f32))
        .collect()
}

/// Falling gain envelope of length `n`, the complement of [`fade_in`].
pub fn fade_out(function: DeclickFunction, n: usize) -> Vec<f32> {
    fade_in(function, n).into_iter().map(|g| 1.0 - g).collect()
}

/// Fade the first and last `overlap` samples of a snippet in place.
///
/// Overlaps longer than half the snippet are shortened so the two ramps
/// never cross.
pub fn apply_declick(snippet: &mut [f32], function: DeclickFunction, overlap: usize) {
    let n = overlap.min(snippet.len() / 2);
    if n == 0 {
        return;
    }
    let len = snippet.len();
    for (s, g) in snippet[..n].iter_mut().zip(fade_in(function, n)) {
        *s *= g;
    }
    for (s, g) in snippet[len - n..].iter_mut().zip(fade_out(function, n)) {
        *s *= g;
    }
}
