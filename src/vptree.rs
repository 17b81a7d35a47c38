//! Vantage-point tree over feature-bearing audio windows.
//!
//! Nodes live in a flat arena and both construction and search use explicit
//! worklists, so neither is bounded by the call stack on degenerate corpora.
//!
//! # Vantage-point selection
//!
//! The first item of a partition is its vantage point. When a partition is
//! split, the item farthest from the parent vantage point is moved to the
//! front of its side, so it becomes that child's vantage point. Building the
//! same items twice yields an identical tree.
//!
//! # Approximate search
//!
//! Pruning relies on the triangle inequality. DTW does not satisfy it in
//! general, so a query can occasionally miss the true nearest window. The
//! search is exact whenever the distance is a metric.

use crate::distance::{DtwDistance, SequenceDistance};
use crate::signal::AudioWindow;
use crate::{Error, Result};
use std::collections::VecDeque;

/// Range of distances from a vantage point to the items on one side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
}

impl Bounds {
    const EMPTY: Self = Self {
        min: f32::INFINITY,
        max: 0.0,
    };

    fn contains(&self, d: f32) -> bool {
        self.min <= d && d <= self.max
    }

    /// True if `d` is within `slack` of the range.
    fn reachable(&self, d: f32, slack: f32) -> bool {
        self.min - slack <= d && d <= self.max + slack
    }

    /// Lower bound on the distance from a probe at `d` to any item in range.
    fn gap(&self, d: f32) -> f32 {
        if d < self.min {
            self.min - d
        } else {
            (d - self.max).max(0.0)
        }
    }

    fn include(&mut self, d: f32) {
        self.min = self.min.min(d);
        self.max = self.max.max(d);
    }
}

/// Arena node. `vantage` indexes [`VpTree::items`]; children index the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct VpNode {
    pub vantage: usize,
    /// Median distance from the vantage point to the rest of the partition.
    pub threshold: f32,
    pub inner: Option<usize>,
    pub outer: Option<usize>,
    pub inner_bounds: Bounds,
    pub outer_bounds: Bounds,
}

impl VpNode {
    fn leaf(vantage: usize) -> Self {
        Self {
            vantage,
            threshold: 0.0,
            inner: None,
            outer: None,
            inner_bounds: Bounds::EMPTY,
            outer_bounds: Bounds::EMPTY,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.inner.is_none() && self.outer.is_none()
    }
}

/// A window returned by a query together with its distance to the probe.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub distance: f32,
    /// Position of the window in [`VpTree::items`].
    pub index: usize,
    pub window: &'a AudioWindow,
}

#[derive(Clone, Copy)]
enum Side {
    Inner,
    Outer,
}

/// Vantage-point tree answering nearest-neighbor queries under a
/// [`SequenceDistance`] between window features.
///
/// Read-only once built.
#[derive(Debug, Clone)]
pub struct VpTree<D = DtwDistance> {
    items: Vec<AudioWindow>,
    nodes: Vec<VpNode>,
    root: Option<usize>,
    distance: D,
}

impl<D: SequenceDistance> VpTree<D> {
    /// Build a tree over `items`. An empty item list builds an empty tree.
    ///
    /// # Errors
    /// * [`Error::MissingFeatures`] if any window has no extracted features
    /// * any error returned by `distance`
    ///
    /// # Example
    /// ```
    /// use audiocollage::distance::DtwDistance;
    /// use audiocollage::signal::AudioWindow;
    /// use audiocollage::vptree::VpTree;
    /// use ndarray::Array2;
    ///
    /// let windows: Vec<AudioWindow> = (0..5)
    ///     .map(|i| {
    ///         AudioWindow::new(vec![0.0; 4], 100, i * 4)
    ///             .with_features(Array2::from_elem((1, 2), i as f32))
    ///     })
    ///     .collect();
    /// let tree = VpTree::build(windows, DtwDistance::default()).unwrap();
    ///
    /// let probe = AudioWindow::new(vec![0.0; 4], 100, 0)
    ///     .with_features(Array2::from_elem((1, 2), 2.9));
    /// let nearest = tree.query_nearest(&probe).unwrap();
    /// assert_eq!(nearest.window.offset(), 12);
    /// ```
    pub fn build(items: Vec<AudioWindow>, distance: D) -> Result<Self> {
        for item in &items {
            item.require_features()?;
        }

        let mut tree = Self {
            items,
            nodes: Vec::new(),
            root: None,
            distance,
        };
        if tree.items.is_empty() {
            return Ok(tree);
        }

        let mut work: Vec<(Vec<usize>, Option<(usize, Side)>)> =
            vec![((0..tree.items.len()).collect(), None)];

        while let Some((points, parent)) = work.pop() {
            let node = tree.nodes.len();
            tree.nodes.push(VpNode::leaf(points[0]));
            match parent {
                None => tree.root = Some(node),
                Some((p, Side::Inner)) => tree.nodes[p].inner = Some(node),
                Some((p, Side::Outer)) => tree.nodes[p].outer = Some(node),
            }

            let rest = &points[1..];
            if rest.is_empty() {
                continue;
            }

            let vantage = &tree.items[points[0]];
            let distances = rest
                .iter()
                .map(|&p| tree.window_distance(vantage, &tree.items[p]))
                .collect::<Result<Vec<f32>>>()?;
            let threshold = median(&distances);

            let mut inner = VecDeque::new();
            let mut outer = VecDeque::new();
            let mut inner_bounds = Bounds::EMPTY;
            let mut outer_bounds = Bounds::EMPTY;
            for (&p, &d) in rest.iter().zip(&distances) {
                let (side, bounds) = if d < threshold {
                    (&mut inner, &mut inner_bounds)
                } else {
                    (&mut outer, &mut outer_bounds)
                };
                // farthest-so-far goes first and becomes the child's vantage point
                if d > bounds.max {
                    side.push_front(p);
                } else {
                    side.push_back(p);
                }
                bounds.include(d);
            }

            let n = &mut tree.nodes[node];
            n.threshold = threshold;
            n.inner_bounds = inner_bounds;
            n.outer_bounds = outer_bounds;

            if !outer.is_empty() {
                work.push((outer.into(), Some((node, Side::Outer))));
            }
            if !inner.is_empty() {
                work.push((inner.into(), Some((node, Side::Inner))));
            }
        }

        log::debug!(
            "built vp-tree over {} windows ({} nodes, depth {})",
            tree.items.len(),
            tree.nodes.len(),
            tree.depth()
        );
        Ok(tree)
    }

    fn window_distance(&self, a: &AudioWindow, b: &AudioWindow) -> Result<f32> {
        self.distance
            .distance(a.require_features()?, b.require_features()?)
    }

    /// Find the indexed window closest to `probe`.
    ///
    /// Among equally distant windows the first one visited wins.
    ///
    /// # Errors
    /// * [`Error::EmptyIndex`] if the tree holds no windows
    /// * [`Error::MissingFeatures`] if `probe` has no features
    pub fn query_nearest(&self, probe: &AudioWindow) -> Result<Neighbor<'_>> {
        self.query_k_nearest(probe, 1)?
            .into_iter()
            .next()
            .ok_or(Error::EmptyIndex)
    }

    /// Find up to `k` indexed windows closest to `probe`, nearest first.
    ///
    /// # Errors
    /// Same as [`query_nearest`](Self::query_nearest); `k == 0` is rejected.
    pub fn query_k_nearest(&self, probe: &AudioWindow, k: usize) -> Result<Vec<Neighbor<'_>>> {
        let Some(root) = self.root else {
            return Err(Error::EmptyIndex);
        };
        if k == 0 {
            return Err(Error::InvalidSize {
                name: "k",
                value: 0,
                reason: "must be > 0",
            });
        }
        let probe_features = probe.require_features()?;

        let mut neighbors: Vec<Neighbor<'_>> = Vec::with_capacity(k + 1);
        let mut tau = f32::INFINITY;
        let mut to_visit: VecDeque<(usize, f32)> = VecDeque::from([(root, 0.0)]);

        while let Some((node_idx, lower_bound)) = to_visit.pop_front() {
            if lower_bound > tau {
                continue;
            }
            let node = &self.nodes[node_idx];
            let window = &self.items[node.vantage];
            let d = self
                .distance
                .distance(probe_features, window.require_features()?)?;

            if d < tau {
                let pos = neighbors.partition_point(|n| n.distance <= d);
                neighbors.insert(
                    pos,
                    Neighbor {
                        distance: d,
                        index: node.vantage,
                        window,
                    },
                );
                neighbors.truncate(k);
                if neighbors.len() == k {
                    tau = neighbors[k - 1].distance;
                }
            }

            for (child, bounds) in [
                (node.inner, node.inner_bounds),
                (node.outer, node.outer_bounds),
            ] {
                let Some(child) = child else { continue };
                if bounds.contains(d) {
                    to_visit.push_front((child, 0.0));
                } else if bounds.reachable(d, tau) {
                    to_visit.push_back((child, bounds.gap(d)));
                }
            }
        }

        Ok(neighbors)
    }
}

impl<D> VpTree<D> {
    /// Number of indexed windows.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Indexed windows in insertion order.
    pub fn items(&self) -> &[AudioWindow] {
        &self.items
    }

    /// Arena of nodes; index 0 is the root when the tree is non-empty.
    pub fn nodes(&self) -> &[VpNode] {
        &self.nodes
    }

    pub fn root(&self) -> Option<&VpNode> {
        self.root.map(|r| &self.nodes[r])
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let Some(root) = self.root else { return 0 };
        let mut deepest = 0;
        let mut stack = vec![(root, 1usize)];
        while let Some((idx, level)) = stack.pop() {
            deepest = deepest.max(level);
            let node = &self.nodes[idx];
            stack.extend(node.inner.iter().chain(&node.outer).map(|&c| (c, level + 1)));
        }
        deepest
    }

    pub fn distance_fn(&self) -> &D {
        &self.distance
    }
}

/// Median of a non-empty slice; mean of the two middle values for even lengths.
fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
