//! Acoustic matching engine for audio-driven video collages.
//!
//! Audiocollage rebuilds a target audio track out of short snippets of a
//! sample video. The sample video's soundtrack is cut into overlapping
//! windows at several durations, each window is summarized by a chromagram,
//! and the windows are indexed in vantage-point trees under a dynamic time
//! warping distance. The assembler then walks the target track, picks the
//! closest corpus window at every position and maps it to a range of video
//! frames.
//!
//! # Quick Start
//!
//! ```rust
//! use audiocollage::assemble::{CollageAssembler, CollageConfig, VideoTimeline};
//! use audiocollage::distance::DtwDistance;
//! use audiocollage::feature::ChromaExtractor;
//! use audiocollage::index::WindowSizeIndex;
//! use audiocollage::{io, signal::AudioSignal};
//!
//! let sr = 8000;
//! let mut corpus = io::tone(440.0, sr, 1.0);
//! corpus.extend(io::tone(660.0, sr, 1.0));
//! let corpus = AudioSignal::new(corpus, sr).unwrap();
//! let target = AudioSignal::new(io::tone(660.0, sr, 1.0), sr).unwrap();
//!
//! let config = CollageConfig {
//!     window_sizes_ms: vec![500],
//!     ..CollageConfig::default()
//! };
//! let extractor = ChromaExtractor::default();
//! let index = WindowSizeIndex::build(
//!     &corpus,
//!     &config.effective_window_sizes_ms(),
//!     &extractor,
//!     DtwDistance::default(),
//! )
//! .unwrap();
//!
//! // 50 video frames alongside the 2 s corpus soundtrack
//! let timeline = VideoTimeline::new(50, 25.0, corpus.len()).unwrap();
//! let plan = CollageAssembler::new(&config, &index, &extractor, timeline)
//!     .assemble(&target)
//!     .unwrap();
//! assert_eq!(plan.len(), 2);
//! assert!(plan.iter().all(|step| step.source_offset >= 8000));
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`signal`] | Audio signals, windows and feature matrices |
//! | [`segment`] | Half-overlapping window segmentation |
//! | [`feature`] | Feature extraction (STFT chromagram) |
//! | [`distance`] | DTW sequence distance and frame metrics |
//! | [`vptree`] | Vantage-point tree nearest-neighbor index |
//! | [`index`] | One index per corpus window size |
//! | [`assemble`] | Greedy collage assembly and frame mapping |
//! | [`render`] | Overlap-add rendering of the collage audio |
//! | [`io`] | Decoding, resampling and WAV output |
//! | [`spectrum`] | Short-time Fourier transform |
//! | [`window`] | Analysis window and declick fades |
//! | [`fft`] | FFT planning |
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`], which is an alias for
//! `std::result::Result<T, Error>`.
//!
//! # Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `parallel` | Evaluate candidate window sizes and STFT frames with rayon |

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, Result};

pub mod assemble;
pub mod distance;
pub mod feature;
pub mod fft;
pub mod index;
pub mod io;
pub mod render;
pub mod segment;
pub mod signal;
pub mod spectrum;
pub mod vptree;
pub mod window;
