//! Degenerate inputs and error paths.

use audiocollage::assemble::{CollageAssembler, CollageConfig, VideoTimeline};
use audiocollage::distance::DtwDistance;
use audiocollage::feature::{ChromaConfig, ChromaExtractor, FeatureExtractor};
use audiocollage::index::WindowSizeIndex;
use audiocollage::segment::segment;
use audiocollage::signal::{AudioSignal, AudioWindow};
use audiocollage::vptree::VpTree;
use audiocollage::{Error, io};
use ndarray::Array2;

fn tone_signal(freq: f32, sr: u32, seconds: f32) -> AudioSignal {
    AudioSignal::new(io::tone(freq, sr, seconds), sr).unwrap()
}

fn chroma_index(corpus: &AudioSignal, sizes: &[u32]) -> WindowSizeIndex {
    WindowSizeIndex::build(corpus, sizes, &ChromaExtractor::default(), DtwDistance::default())
        .unwrap()
}

#[test]
fn empty_corpus_is_degenerate() {
    let corpus = AudioSignal::new(Vec::new(), 8000).unwrap();
    let result = WindowSizeIndex::build(
        &corpus,
        &[500],
        &ChromaExtractor::default(),
        DtwDistance::default(),
    );
    assert!(matches!(result, Err(Error::DegenerateSignal("corpus"))));
}

#[test]
fn empty_target_is_degenerate() {
    let corpus = tone_signal(440.0, 8000, 1.0);
    let config = CollageConfig::default();
    let index = chroma_index(&corpus, &config.effective_window_sizes_ms());
    let timeline = VideoTimeline::new(25, 25.0, corpus.len()).unwrap();
    let extractor = ChromaExtractor::default();

    let target = AudioSignal::new(Vec::new(), 8000).unwrap();
    let result = CollageAssembler::new(&config, &index, &extractor, timeline).assemble(&target);
    assert!(matches!(result, Err(Error::DegenerateSignal("target"))));
}

#[test]
fn zero_length_window_is_rejected() {
    let signal = tone_signal(440.0, 8000, 0.1);
    assert!(matches!(
        segment(&signal, 0),
        Err(Error::InvalidWindow { .. })
    ));

    let result = WindowSizeIndex::build(
        &signal,
        &[0],
        &ChromaExtractor::default(),
        DtwDistance::default(),
    );
    assert!(matches!(result, Err(Error::InvalidWindow { .. })));

    let mut empty = AudioWindow::new(Vec::new(), 8000, 0);
    assert!(matches!(
        ChromaExtractor::default().extract(&mut empty),
        Err(Error::InvalidWindow { .. })
    ));
}

#[test]
fn all_empty_indexes_yield_no_eligible_match() {
    let empty = || VpTree::build(Vec::new(), DtwDistance::default()).unwrap();
    let index = WindowSizeIndex::from_trees(vec![(1000, empty()), (500, empty())]);
    let config = CollageConfig::default();
    let timeline = VideoTimeline::new(10, 25.0, 8000).unwrap();
    let extractor = ChromaExtractor::default();

    let target = tone_signal(440.0, 8000, 1.0);
    let result = CollageAssembler::new(&config, &index, &extractor, timeline).assemble(&target);
    assert!(matches!(result, Err(Error::NoEligibleMatch { pointer: 0 })));
}

#[test]
fn querying_an_empty_tree_fails() {
    let tree = VpTree::build(Vec::new(), DtwDistance::default()).unwrap();
    let probe = AudioWindow::new(vec![0.0; 4], 8000, 0).with_features(Array2::zeros((12, 1)));
    assert!(matches!(tree.query_nearest(&probe), Err(Error::EmptyIndex)));
}

#[test]
fn invalid_collage_configs_are_rejected() {
    let corpus = tone_signal(440.0, 8000, 1.0);
    let index = chroma_index(&corpus, &[500]);
    let timeline = VideoTimeline::new(25, 25.0, corpus.len()).unwrap();
    let extractor = ChromaExtractor::default();
    let target = tone_signal(440.0, 8000, 0.5);

    let no_sizes = CollageConfig {
        window_sizes_ms: Vec::new(),
        ..CollageConfig::default()
    };
    let result = CollageAssembler::new(&no_sizes, &index, &extractor, timeline).assemble(&target);
    assert!(matches!(result, Err(Error::InvalidParameter { .. })));

    assert!(VideoTimeline::new(25, f64::NAN, corpus.len()).is_err());
    assert!(ChromaExtractor::new(ChromaConfig {
        n_chroma: 0,
        ..ChromaConfig::default()
    })
    .is_err());
}

#[test]
fn target_shorter_than_any_window() {
    let sr = 8000;
    let corpus = tone_signal(440.0, sr, 2.0);
    let config = CollageConfig::default();
    let index = chroma_index(&corpus, &config.effective_window_sizes_ms());
    let timeline = VideoTimeline::new(50, 25.0, corpus.len()).unwrap();
    let extractor = ChromaExtractor::default();

    // 100 samples, well under one STFT frame
    let target = AudioSignal::new(io::tone(440.0, sr, 1.0)[..100].to_vec(), sr).unwrap();
    let plan = CollageAssembler::new(&config, &index, &extractor, timeline)
        .assemble(&target)
        .unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.steps[0].pointer, 0);
    assert!(plan.steps[0].frames.end < 50);
}

#[test]
fn corpus_shorter_than_window_indexes_one_window() {
    let corpus = tone_signal(440.0, 8000, 0.25);
    let index = chroma_index(&corpus, &[1000]);
    let tree = index.get(1000).unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.items()[0].len(), corpus.len());
}

#[test]
fn single_frame_video_maps_everything_to_frame_zero() {
    let corpus = tone_signal(440.0, 8000, 1.0);
    let config = CollageConfig {
        window_sizes_ms: vec![500],
        ..CollageConfig::default()
    };
    let index = chroma_index(&corpus, &config.effective_window_sizes_ms());
    let timeline = VideoTimeline::new(1, 1.0, corpus.len()).unwrap();
    let extractor = ChromaExtractor::default();

    let plan = CollageAssembler::new(&config, &index, &extractor, timeline)
        .assemble(&tone_signal(440.0, 8000, 1.0))
        .unwrap();
    assert!(plan.iter().all(|s| s.frames.start == 0 && s.frames.end == 0));
}
