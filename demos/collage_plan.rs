//! Collage Planning Example
//!
//! This example rebuilds a short melody out of a synthetic "sample video":
//! - Generating a corpus soundtrack of four sustained notes
//! - Indexing the corpus at two window sizes
//! - Assembling a collage plan for a target melody
//! - Rendering the matched snippets back to audio
//!
//! Pass a path as the first argument to write the rendered collage as WAV.

use audiocollage::assemble::{CollageAssembler, CollageConfig, VideoTimeline};
use audiocollage::distance::DtwDistance;
use audiocollage::feature::ChromaExtractor;
use audiocollage::index::WindowSizeIndex;
use audiocollage::io;
use audiocollage::render::render_audio;
use audiocollage::signal::AudioSignal;
use audiocollage::window::DeclickFunction;
use log::info;

fn main() {
    env_logger::init();
    info!("Collage Planning Example");

    let sr = 22050;
    let fps = 25.0;

    // C4, E4, G4, B4, one second each
    let notes = [261.63, 329.63, 392.0, 493.88];
    let corpus: Vec<f32> = notes.iter().flat_map(|&f| io::tone(f, sr, 1.0)).collect();
    let corpus = AudioSignal::new(corpus, sr).unwrap();
    let frame_count = (corpus.duration() * fps).round() as usize;
    info!(
        "Corpus: {:.1} s, {} video frames at {} fps",
        corpus.duration(),
        frame_count,
        fps
    );

    // G4 B4 C4 E4 with a short C4 pickup
    let melody = [(392.0, 1.0), (493.88, 1.0), (261.63, 0.5), (329.63, 1.5)];
    let target: Vec<f32> = melody
        .iter()
        .flat_map(|&(f, secs)| io::tone(f, sr, secs))
        .collect();
    let target = AudioSignal::new(target, sr).unwrap();
    info!("Target: {:.1} s", target.duration());

    let config = CollageConfig {
        declick: Some(DeclickFunction::Sigmoid),
        ..CollageConfig::default()
    };
    info!(
        "Window sizes {:?} ms, declick padding {} ms",
        config.window_sizes_ms,
        config.padding_ms()
    );

    let extractor = ChromaExtractor::default();
    let index = WindowSizeIndex::build(
        &corpus,
        &config.effective_window_sizes_ms(),
        &extractor,
        DtwDistance::default(),
    )
    .unwrap();
    for (ms, tree) in index.iter() {
        info!("  - {} ms: {} windows, tree depth {}", ms, tree.len(), tree.depth());
    }

    let timeline = VideoTimeline::new(frame_count, fps, corpus.len()).unwrap();
    let plan = CollageAssembler::new(&config, &index, &extractor, timeline)
        .assemble(&target)
        .unwrap();

    info!("Collage plan ({} snippets):", plan.len());
    for step in plan.iter() {
        info!(
            "  - t={:.2}s  {} ms  corpus {:.2}s  frames {:?}  dtw {:.3}",
            step.pointer as f64 / sr as f64,
            step.window_ms,
            step.source_offset as f64 / sr as f64,
            step.frames.as_range(),
            step.distance
        );
    }

    let audio = render_audio(&plan, &corpus, config.declick).unwrap();
    info!("Rendered {:.2} s of collage audio", audio.duration());

    if let Some(path) = std::env::args().nth(1) {
        io::save_wav(&path, &audio).unwrap();
        info!("Saved to {}", path);
    }
}
