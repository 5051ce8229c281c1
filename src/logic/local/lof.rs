//! Local Outlier Factor
//!
//! Ratio of the neighbours' local reachability density to the point's own.
//! Neighbourhoods exclude the point itself; ties break on row order.

use ndarray::Array2;
use rayon::prelude::*;

use super::normalize::min_max;
use super::types::{BaseDetector, DetectorError};

#[derive(Debug, Clone, Default)]
pub struct LocalOutlierFactor {
    n_neighbors: Option<usize>,
}

impl LocalOutlierFactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed neighbourhood size; by default `min(50, max(10, sqrt(n)))`
    pub fn n_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = Some(k.max(1));
        self
    }

    pub fn neighbors_for(n: usize) -> usize {
        ((n as f64).sqrt().floor() as usize).clamp(10, 50)
    }

    /// Outlier factor per row (about 1 for inliers, larger for outliers)
    pub fn outlier_factors(&self, x: &Array2<f64>) -> Vec<f64> {
        let n = x.nrows();
        let k = self
            .n_neighbors
            .unwrap_or_else(|| Self::neighbors_for(n))
            .min(n - 1);

        // k nearest (index, distance) per row
        let neighbors: Vec<Vec<(usize, f64)>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let xi = x.row(i);
                let mut dists: Vec<(usize, f64)> = (0..n)
                    .filter(|&j| j != i)
                    .map(|j| {
                        let d = xi
                            .iter()
                            .zip(x.row(j).iter())
                            .map(|(a, b)| (a - b) * (a - b))
                            .sum::<f64>()
                            .sqrt();
                        (j, d)
                    })
                    .collect();
                dists.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
                dists.truncate(k);
                dists
            })
            .collect();

        let k_distance: Vec<f64> = neighbors
            .iter()
            .map(|nb| nb.last().map(|(_, d)| *d).unwrap_or(0.0))
            .collect();

        let lrd: Vec<f64> = neighbors
            .iter()
            .map(|nb| {
                let reach: f64 = nb.iter().map(|&(j, d)| d.max(k_distance[j])).sum();
                1.0 / (reach / nb.len() as f64 + 1e-10)
            })
            .collect();

        neighbors
            .iter()
            .enumerate()
            .map(|(i, nb)| {
                let mean: f64 = nb.iter().map(|&(j, _)| lrd[j]).sum::<f64>() / nb.len() as f64;
                mean / lrd[i]
            })
            .collect()
    }
}

impl BaseDetector for LocalOutlierFactor {
    fn name(&self) -> &'static str {
        "local_outlier_factor"
    }

    fn fit_score(&self, x: &Array2<f64>) -> Result<Vec<f64>, DetectorError> {
        if x.nrows() < 2 {
            return Err(DetectorError::TooFewRows {
                detector: self.name(),
                needed: 2,
                rows: x.nrows(),
            });
        }
        min_max(&self.outlier_factors(x), self.name())
    }
}
