//! Isolation Forest
//!
//! Random axis-aligned splits isolate outliers in fewer steps. Each tree is
//! grown on a sub-sample without replacement, depth-limited to
//! `ceil(log2(sub_sample))`. Score is `2^(-E[h(x)] / c(sub_sample))`.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::normalize::min_max;
use super::types::{BaseDetector, DetectorError};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful BST search over `n` points
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(x: &Array2<f64>, rows: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build(x, rows, 0, max_depth, rng);
        tree
    }

    fn build(
        &mut self,
        x: &Array2<f64>,
        rows: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });
        if depth >= max_depth || rows.len() <= 1 {
            return id;
        }

        // Features that still vary inside this node
        let candidates: Vec<(usize, f64, f64)> = (0..x.ncols())
            .filter_map(|f| {
                let column = x.column(f);
                let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                    (lo.min(column[r]), hi.max(column[r]))
                });
                (hi > lo).then_some((f, lo, hi))
            })
            .collect();
        if candidates.is_empty() {
            return id;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| x[[r, feature]] <= threshold);

        let left = self.build(x, left_rows, depth + 1, max_depth, rng);
        let right = self.build(x, right_rows, depth + 1, max_depth, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, point: ArrayView1<f64>) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if point[feature] <= threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    seed: u64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_samples: 256,
            seed: 42,
        }
    }
}

impl IsolationForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators.max(1);
        self
    }

    pub fn max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples.max(2);
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Raw anomaly score per row, in (0, 1]
    pub fn anomaly_scores(&self, x: &Array2<f64>) -> Vec<f64> {
        let n = x.nrows();
        let sub_sample = self.max_samples.min(n);
        let max_depth = (sub_sample as f64).log2().ceil().max(1.0) as usize;

        let trees: Vec<IsolationTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(t as u64));
                let rows = sample(&mut rng, n, sub_sample).into_vec();
                IsolationTree::grow(x, rows, max_depth, &mut rng)
            })
            .collect();

        let norm = average_path_length(sub_sample).max(f64::MIN_POSITIVE);
        (0..n)
            .into_par_iter()
            .map(|i| {
                let point = x.row(i);
                let mean_depth = trees.iter().map(|t| t.path_length(point)).sum::<f64>()
                    / trees.len() as f64;
                2f64.powf(-mean_depth / norm)
            })
            .collect()
    }
}

impl BaseDetector for IsolationForest {
    fn name(&self) -> &'static str {
        "isolation_forest"
    }

    fn fit_score(&self, x: &Array2<f64>) -> Result<Vec<f64>, DetectorError> {
        if x.nrows() < 2 {
            return Err(DetectorError::TooFewRows {
                detector: self.name(),
                needed: 2,
                rows: x.nrows(),
            });
        }
        min_max(&self.anomaly_scores(x), self.name())
    }
}
