//! Local Detector Types

use ndarray::Array2;
use thiserror::Error;

/// Failure of one base detector on one peer group
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    #[error("{detector}: needs at least {needed} rows, got {rows}")]
    TooFewRows {
        detector: &'static str,
        needed: usize,
        rows: usize,
    },

    #[error("{detector}: produced non-finite scores")]
    NonFinite { detector: &'static str },
}

/// Unsupervised outlier detector fitted and scored on the same rows.
///
/// Scores come back min-max normalized to [0,1], higher = more anomalous.
pub trait BaseDetector: Send + Sync {
    fn name(&self) -> &'static str;

    fn fit_score(&self, x: &Array2<f64>) -> Result<Vec<f64>, DetectorError>;
}

/// Ensemble output for one peer group
#[derive(Debug, Clone, PartialEq)]
pub struct LocalDetection {
    pub scores: Vec<f64>,
    /// Names of detectors that failed and were left out
    pub failed: Vec<&'static str>,
}

impl LocalDetection {
    pub fn is_degraded(&self) -> bool {
        !self.failed.is_empty()
    }
}
