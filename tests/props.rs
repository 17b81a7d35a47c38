use audiocollage::assemble::{CollageAssembler, CollageConfig, VideoTimeline};
use audiocollage::distance::{DtwDistance, FrameMetric, SequenceDistance, dtw_cost};
use audiocollage::feature::FeatureExtractor;
use audiocollage::index::WindowSizeIndex;
use audiocollage::segment::{hop_length, segment, window_length, window_offsets};
use audiocollage::signal::{AudioSignal, FeatureMatrix};
use audiocollage::vptree::VpTree;
use ndarray::Array2;
use proptest::prelude::*;

/// Two frames: mean level and peak magnitude.
struct LevelExtractor;

impl FeatureExtractor for LevelExtractor {
    fn compute(&self, samples: &[f32], _sample_rate: u32) -> audiocollage::Result<FeatureMatrix> {
        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        let peak = samples.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        Ok(Array2::from_shape_vec((2, 2), vec![mean, mean, peak, peak]).unwrap())
    }
}

fn matrix(rows: usize, cols: usize, values: &[f32]) -> FeatureMatrix {
    Array2::from_shape_fn((rows, cols), |(r, c)| values[(r * cols + c) % values.len()])
}

proptest! {
    #[test]
    fn offsets_step_by_half_window(len in 1usize..20_000, window_len in 1usize..4_000) {
        let offsets = window_offsets(len, window_len).unwrap();
        let hop = hop_length(window_len);
        for pair in offsets.windows(2) {
            prop_assert_eq!(pair[1] - pair[0], hop);
        }
        let expected = if len <= window_len {
            1
        } else {
            (len - window_len).div_ceil(hop) + 1
        };
        prop_assert_eq!(offsets.len(), expected);
        // the last window reaches the end of the signal
        prop_assert!(offsets.last().unwrap() + window_len >= len);
    }

    #[test]
    fn segments_stay_inside_signal(len in 1usize..6_000, window_ms in 1u32..2_000) {
        let signal = AudioSignal::new(vec![0.25; len], 1000).unwrap();
        let windows = segment(&signal, window_ms).unwrap();
        let nominal = window_length(window_ms, 1000);
        for w in &windows {
            prop_assert!(w.offset() + w.len() <= len);
            prop_assert!(w.len() <= nominal);
        }
    }

    #[test]
    fn dtw_self_distance_is_zero(
        rows in 1usize..6,
        cols in 1usize..12,
        values in prop::collection::vec(-1.0f32..1.0, 1..64),
    ) {
        let a = matrix(rows, cols, &values);
        prop_assert_eq!(dtw_cost(&a, &a, FrameMetric::Manhattan).unwrap(), 0.0);
    }

    #[test]
    fn dtw_is_symmetric(
        rows in 1usize..6,
        cols_a in 1usize..12,
        cols_b in 1usize..12,
        values_a in prop::collection::vec(0.0f32..1.0, 1..64),
        values_b in prop::collection::vec(0.0f32..1.0, 1..64),
    ) {
        let a = matrix(rows, cols_a, &values_a);
        let b = matrix(rows, cols_b, &values_b);
        let distance = DtwDistance::default();
        let ab = distance.distance(&a, &b).unwrap();
        let ba = distance.distance(&b, &a).unwrap();
        prop_assert!(ab >= 0.0);
        prop_assert!((ab - ba).abs() <= 1e-5 * ab.max(1.0));
    }

    #[test]
    fn plan_ranges_in_bounds_and_terminates(
        target_len in 1usize..4_000,
        corpus in prop::collection::vec(-1.0f32..1.0, 600..3_000),
        frame_count in 1usize..400,
        padding_ms in 0u32..100,
    ) {
        let sr = 1000;
        let corpus = AudioSignal::new(corpus, sr).unwrap();
        let target: Vec<f32> = (0..target_len).map(|i| ((i as f32) * 0.37).sin()).collect();
        let target = AudioSignal::new(target, sr).unwrap();

        let config = CollageConfig {
            window_sizes_ms: vec![500, 200],
            declick_padding_ms: Some(padding_ms),
            ..CollageConfig::default()
        };
        let index = WindowSizeIndex::build(
            &corpus,
            &config.effective_window_sizes_ms(),
            &LevelExtractor,
            DtwDistance::default(),
        )
        .unwrap();
        let timeline = VideoTimeline::new(frame_count, 25.0, corpus.len()).unwrap();
        let plan = CollageAssembler::new(&config, &index, &LevelExtractor, timeline)
            .assemble(&target)
            .unwrap();

        for range in plan.frame_ranges() {
            prop_assert!(range.start <= range.end);
            prop_assert!(range.end < frame_count);
        }
        let min_advance = 200;
        prop_assert!(plan.len() <= target_len.div_ceil(min_advance));
        let pointers: Vec<usize> = plan.iter().map(|s| s.pointer).collect();
        prop_assert!(pointers.windows(2).all(|p| p[0] < p[1]));
        prop_assert!(pointers.iter().all(|&p| p < target_len));
    }

    #[test]
    fn rebuilding_is_idempotent(values in prop::collection::vec(0.0f32..10.0, 1..40), probe in 0.0f32..10.0) {
        let build = || {
            let windows = values
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    audiocollage::signal::AudioWindow::new(vec![v], 100, i)
                        .with_features(Array2::from_elem((1, 2), v))
                })
                .collect();
            VpTree::build(windows, DtwDistance::default()).unwrap()
        };
        let first = build();
        let second = build();
        prop_assert_eq!(first.nodes(), second.nodes());

        let probe = audiocollage::signal::AudioWindow::new(vec![probe], 100, 0)
            .with_features(Array2::from_elem((1, 2), probe));
        let a = first.query_nearest(&probe).unwrap();
        let b = second.query_nearest(&probe).unwrap();
        prop_assert_eq!(a.index, b.index);
        prop_assert_eq!(a.distance, b.distance);
    }
}
