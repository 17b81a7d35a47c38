/// Crate-level error type for the audiocollage matching engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A nearest-neighbor query was issued against an index with no entries.
    #[error("nearest-neighbor index is empty")]
    EmptyIndex,

    /// Every candidate window size had an empty index at this step.
    #[error("no eligible match for any candidate window size at sample {pointer}")]
    NoEligibleMatch { pointer: usize },

    /// A window has no samples to analyze.
    #[error("invalid window at offset {offset} (length {len}): {reason}")]
    InvalidWindow {
        offset: usize,
        len: usize,
        reason: &'static str,
    },

    /// A corpus, target or video input has zero samples or frames.
    #[error("degenerate input: {0} is empty")]
    DegenerateSignal(&'static str),

    /// A window was indexed or compared before its features were extracted.
    #[error("window at offset {offset} has no extracted features")]
    MissingFeatures { offset: usize },

    /// Feature matrices do not share the same number of channels.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Invalid parameter value.
    #[error("invalid parameter `{name}`: got {value}, {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A required dimension is zero or invalid.
    #[error("invalid size for `{name}`: {value} ({reason})")]
    InvalidSize {
        name: &'static str,
        value: usize,
        reason: &'static str,
    },

    /// Audio data contains non-finite values (NaN or Inf).
    #[error("audio data contains non-finite values")]
    NonFiniteAudio,

    /// Audio I/O errors.
    #[error(transparent)]
    Audio(#[from] crate::io::AudioError),

    /// File I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for audiocollage operations.
pub type Result<T> = std::result::Result<T, Error>;
