use crate::signal::FeatureMatrix;
use crate::{Error, Result};
use ndarray::ArrayView1;

/// Local distance between two feature frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameMetric {
    /// L1 norm of the difference.
    #[default]
    Manhattan,
    /// L2 norm of the difference.
    Euclidean,
    /// One minus cosine similarity; 1.0 when either frame is all zeros.
    Cosine,
}

impl FrameMetric {
    /// Distance between two equally sized frames.
    pub fn frame_distance(self, x: ArrayView1<f32>, y: ArrayView1<f32>) -> f32 {
        let pairs = x.iter().zip(y.iter()).map(|(&a, &b)| (a as f64, b as f64));
        let d = match self {
            Self::Manhattan => pairs.map(|(a, b)| (a - b).abs()).sum::<f64>(),
            Self::Euclidean => pairs.map(|(a, b)| (a - b) * (a - b)).sum::<f64>().sqrt(),
            Self::Cosine => {
                let (mut dot, mut norm_x, mut norm_y) = (0.0f64, 0.0f64, 0.0f64);
                for (a, b) in pairs {
                    dot += a * b;
                    norm_x += a * a;
                    norm_y += b * b;
                }
                let norm_prod = (norm_x * norm_y).sqrt();
                if norm_prod > 1e-10 {
                    1.0 - dot / norm_prod
                } else {
                    1.0
                }
            }
        };
        d as f32
    }
}

/// Dissimilarity between two feature matrices of possibly different lengths.
///
/// Implementations need not satisfy the triangle inequality; the
/// vantage-point index treats it as an approximation.
pub trait SequenceDistance: Send + Sync {
    fn distance(&self, a: &FeatureMatrix, b: &FeatureMatrix) -> Result<f32>;
}

impl<F> SequenceDistance for F
where
    F: Fn(&FeatureMatrix, &FeatureMatrix) -> Result<f32> + Send + Sync,
{
    fn distance(&self, a: &FeatureMatrix, b: &FeatureMatrix) -> Result<f32> {
        self(a, b)
    }
}

/// Dynamic time warping cost under a frame metric (Manhattan by default).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DtwDistance {
    pub metric: FrameMetric,
}

impl DtwDistance {
    pub fn new(metric: FrameMetric) -> Self {
        Self { metric }
    }
}

impl SequenceDistance for DtwDistance {
    fn distance(&self, a: &FeatureMatrix, b: &FeatureMatrix) -> Result<f32> {
        dtw_cost(a, b, self.metric)
    }
}

/// Accumulated DTW alignment cost between two feature matrices.
///
/// Columns are time frames. The cost matrix follows
/// `cost[i][j] = local[i][j] + min(cost[i-1][j], cost[i][j-1], cost[i-1][j-1])`
/// with `cost[0][0] = local[0][0]`, and the result is the bottom-right cell,
/// not normalized by path length. Only two rows of the cost matrix are kept.
///
/// # Arguments
/// * `x` - First feature matrix (n_features x n_frames_x)
/// * `y` - Second feature matrix (n_features x n_frames_y)
/// * `metric` - Local frame distance
///
/// # Errors
/// * [`Error::ShapeMismatch`] if the feature counts differ
/// * [`Error::InvalidWindow`] if either matrix has no frames
///
/// # Example
/// ```
/// use audiocollage::distance::{FrameMetric, dtw_cost};
/// use ndarray::Array2;
///
/// let x = Array2::from_shape_vec((1, 3), vec![1.0, 2.0, 3.0]).unwrap();
/// let y = Array2::from_shape_vec((1, 4), vec![1.0, 2.0, 2.0, 3.0]).unwrap();
/// assert_eq!(dtw_cost(&x, &y, FrameMetric::Manhattan).unwrap(), 0.0);
/// ```
pub fn dtw_cost(x: &FeatureMatrix, y: &FeatureMatrix, metric: FrameMetric) -> Result<f32> {
    let n_features = x.nrows();
    if n_features != y.nrows() {
        return Err(Error::ShapeMismatch {
            expected: format!("{n_features} feature rows"),
            got: format!("{} feature rows", y.nrows()),
        });
    }
    let n_x = x.ncols();
    let n_y = y.ncols();
    if n_x == 0 || n_y == 0 {
        return Err(Error::InvalidWindow {
            offset: 0,
            len: 0,
            reason: "feature matrix has no frames",
        });
    }

    let local = |i: usize, j: usize| metric.frame_distance(x.column(i), y.column(j));

    let mut prev = vec![0.0f32; n_y];
    let mut curr = vec![0.0f32; n_y];

    prev[0] = local(0, 0);
    for j in 1..n_y {
        prev[j] = prev[j - 1] + local(0, j);
    }

    for i in 1..n_x {
        curr[0] = prev[0] + local(i, 0);
        for j in 1..n_y {
            let min_cost = prev[j].min(curr[j - 1]).min(prev[j - 1]);
            curr[j] = local(i, j) + min_cost;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    Ok(prev[n_y - 1])
}
