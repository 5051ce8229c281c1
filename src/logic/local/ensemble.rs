//! Local Ensemble
//!
//! Weighted average of the base detectors that succeeded on a group. Failed
//! detectors drop out and the remaining weights renormalize to 1.

use ndarray::Array2;

use super::isolation::IsolationForest;
use super::lof::LocalOutlierFactor;
use super::svm::OneClassSvm;
use super::types::{BaseDetector, DetectorError, LocalDetection};
use crate::logic::config::EngineConfig;

pub struct LocalEnsemble {
    members: Vec<(Box<dyn BaseDetector>, f64)>,
}

impl LocalEnsemble {
    /// Isolation forest, one-class SVM and LOF for a group of `n` rows
    pub fn for_group(n: usize, config: &EngineConfig, seed: u64) -> Self {
        let w = config.ensemble_weights;
        let isolation: Box<dyn BaseDetector> = Box::new(
            IsolationForest::new()
                .n_estimators(200)
                .max_samples(256)
                .random_seed(seed),
        );
        let one_class: Box<dyn BaseDetector> = Box::new(
            OneClassSvm::new()
                .nu(OneClassSvm::nu_for(config.local_contamination, n))
                .max_iter(1000),
        );
        let density: Box<dyn BaseDetector> = Box::new(LocalOutlierFactor::new());

        Self::new(vec![
            (isolation, w.isolation),
            (one_class, w.one_class),
            (density, w.density),
        ])
    }

    pub fn new(members: Vec<(Box<dyn BaseDetector>, f64)>) -> Self {
        Self { members }
    }

    /// Fit and score every member on `x`, then combine
    pub fn detect(&self, x: &Array2<f64>) -> LocalDetection {
        let outputs: Vec<(&'static str, Result<Vec<f64>, DetectorError>, f64)> = self
            .members
            .iter()
            .map(|(detector, weight)| (detector.name(), detector.fit_score(x), *weight))
            .collect();

        let mut failed = Vec::new();
        let mut ok = Vec::new();
        for (name, result, weight) in outputs {
            match result {
                Ok(scores) if scores.len() == x.nrows() => ok.push((scores, weight)),
                Ok(scores) => {
                    log::warn!(
                        "{} returned {} scores for {} rows - excluded",
                        name,
                        scores.len(),
                        x.nrows()
                    );
                    failed.push(name);
                }
                Err(e) => {
                    log::warn!("Local detector failed: {} - excluded", e);
                    failed.push(name);
                }
            }
        }

        LocalDetection {
            scores: combine(&ok, x.nrows()),
            failed,
        }
    }
}

/// Weighted mean over the surviving detectors, clamped to [0,1].
///
/// A detector whose scores are all zero carries no signal and is left out
/// of the average along with its weight.
pub fn combine(ok: &[(Vec<f64>, f64)], n: usize) -> Vec<f64> {
    let signalling: Vec<&(Vec<f64>, f64)> = ok
        .iter()
        .filter(|(scores, _)| scores.iter().sum::<f64>() > 0.0)
        .collect();

    match signalling.as_slice() {
        [] => ok.first().map(|(scores, _)| scores.clone()).unwrap_or_else(|| vec![0.0; n]),
        [(only, _)] => only.clone(),
        _ => {
            let total: f64 = signalling.iter().map(|(_, w)| w).sum();
            if total <= 0.0 {
                return signalling[0].0.clone();
            }
            (0..n)
                .map(|i| {
                    let s: f64 = signalling.iter().map(|(scores, w)| scores[i] * w / total).sum();
                    s.clamp(0.0, 1.0)
                })
                .collect()
        }
    }
}
