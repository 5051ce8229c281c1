//! Tests for the local ensemble detector

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::logic::config::EngineConfig;

/// Blob of `n` points near (0.5, 0.5) plus one far point as the last row
fn blob_with_outlier(n: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = Array2::zeros((n + 1, 2));
    for i in 0..n {
        x[[i, 0]] = 0.5 + rng.gen_range(-0.05..0.05);
        x[[i, 1]] = 0.5 + rng.gen_range(-0.05..0.05);
    }
    x[[n, 0]] = 0.98;
    x[[n, 1]] = 0.02;
    x
}

fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &s)| if s > bv { (i, s) } else { (bi, bv) })
        .0
}

struct Failing;

impl BaseDetector for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn fit_score(&self, x: &Array2<f64>) -> Result<Vec<f64>, DetectorError> {
        Err(DetectorError::TooFewRows {
            detector: "failing",
            needed: usize::MAX,
            rows: x.nrows(),
        })
    }
}

struct Fixed(Vec<f64>);

impl BaseDetector for Fixed {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn fit_score(&self, _x: &Array2<f64>) -> Result<Vec<f64>, DetectorError> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_isolation_forest_ranks_outlier_first() {
    let x = blob_with_outlier(60, 1);
    let scores = IsolationForest::new().random_seed(7).fit_score(&x).unwrap();
    assert_eq!(argmax(&scores), 60);
    assert!((scores[60] - 1.0).abs() < 1e-12);
}

#[test]
fn test_isolation_forest_is_deterministic() {
    let x = blob_with_outlier(40, 2);
    let forest = IsolationForest::new().n_estimators(50).random_seed(3);
    assert_eq!(forest.fit_score(&x).unwrap(), forest.fit_score(&x).unwrap());
}

#[test]
fn test_lof_ranks_outlier_first() {
    let x = blob_with_outlier(60, 3);
    let scores = LocalOutlierFactor::new().fit_score(&x).unwrap();
    assert_eq!(argmax(&scores), 60);
}

#[test]
fn test_lof_neighbourhood_size() {
    assert_eq!(LocalOutlierFactor::neighbors_for(20), 10);
    assert_eq!(LocalOutlierFactor::neighbors_for(400), 20);
    assert_eq!(LocalOutlierFactor::neighbors_for(10_000), 50);
}

#[test]
fn test_lof_caps_k_for_tiny_groups() {
    let x = blob_with_outlier(5, 4);
    let factors = LocalOutlierFactor::new().outlier_factors(&x);
    assert_eq!(factors.len(), 6);
    assert!(factors.iter().all(|f| f.is_finite()));
}

#[test]
fn test_one_class_svm_ranks_outlier_first() {
    let x = blob_with_outlier(50, 5);
    let scores = OneClassSvm::new().nu(0.2).gamma(50.0).fit_score(&x).unwrap();
    assert_eq!(argmax(&scores), 50);
}

#[test]
fn test_one_class_svm_nu() {
    assert_eq!(OneClassSvm::nu_for(0.01, 500), 0.01);
    assert_eq!(OneClassSvm::nu_for(0.05, 200), 0.02);
    assert_eq!(OneClassSvm::nu_for(0.05, 100_000), 0.05);
}

#[test]
fn test_constant_group_scores_zero() {
    let x = Array2::from_elem((12, 3), 0.4);
    for detector in [
        Box::new(IsolationForest::new()) as Box<dyn BaseDetector>,
        Box::new(OneClassSvm::new()) as Box<dyn BaseDetector>,
        Box::new(LocalOutlierFactor::new()) as Box<dyn BaseDetector>,
    ] {
        let scores = detector.fit_score(&x).unwrap();
        assert!(scores.iter().all(|s| *s == 0.0), "{}", detector.name());
    }
}

#[test]
fn test_combine_renormalizes_over_survivors() {
    let a = vec![1.0, 0.0];
    let b = vec![0.0, 1.0];
    let out = combine(&[(a, 0.35), (b, 0.30)], 2);
    assert!((out[0] - 0.35 / 0.65).abs() < 1e-12);
    assert!((out[1] - 0.30 / 0.65).abs() < 1e-12);
}

#[test]
fn test_combine_with_no_survivors_is_zero() {
    assert_eq!(combine(&[], 3), vec![0.0; 3]);
}

#[test]
fn test_two_failures_leave_third_exactly() {
    let third = vec![0.1, 0.7, 0.3, 1.0];
    let ensemble = LocalEnsemble::new(vec![
        (Box::new(Failing) as Box<dyn BaseDetector>, 0.35),
        (Box::new(Failing) as Box<dyn BaseDetector>, 0.35),
        (Box::new(Fixed(third.clone())) as Box<dyn BaseDetector>, 0.30),
    ]);
    let detection = ensemble.detect(&Array2::zeros((4, 2)));
    assert_eq!(detection.scores, third);
    assert_eq!(detection.failed.len(), 2);
    assert!(detection.is_degraded());
}

#[test]
fn test_all_zero_detector_does_not_dilute() {
    let signal = vec![0.0, 0.2, 0.4, 1.0];
    let ensemble = LocalEnsemble::new(vec![
        (Box::new(Fixed(vec![0.0; 4])) as Box<dyn BaseDetector>, 0.35),
        (Box::new(Fixed(signal.clone())) as Box<dyn BaseDetector>, 0.35),
        (Box::new(Fixed(signal.clone())) as Box<dyn BaseDetector>, 0.30),
    ]);
    let detection = ensemble.detect(&Array2::zeros((4, 2)));
    for (got, want) in detection.scores.iter().zip(signal.iter()) {
        assert!((got - want).abs() < 1e-12);
    }
    assert!(!detection.is_degraded());
}

#[test]
fn test_combine_all_zero_survivors_stay_zero() {
    let out = combine(&[(vec![0.0; 3], 0.35), (vec![0.0; 3], 0.30)], 3);
    assert_eq!(out, vec![0.0; 3]);
}

#[test]
fn test_wrong_length_output_is_excluded() {
    let ensemble = LocalEnsemble::new(vec![
        (Box::new(Fixed(vec![0.5])) as Box<dyn BaseDetector>, 0.5),
        (Box::new(Fixed(vec![0.2, 0.4])) as Box<dyn BaseDetector>, 0.5),
    ]);
    let detection = ensemble.detect(&Array2::zeros((2, 1)));
    assert_eq!(detection.scores, vec![0.2, 0.4]);
    assert_eq!(detection.failed, vec!["fixed"]);
}

#[test]
fn test_default_ensemble_scores_in_range() {
    let x = blob_with_outlier(40, 6);
    let detection = LocalEnsemble::for_group(x.nrows(), &EngineConfig::default(), 42).detect(&x);
    assert_eq!(detection.scores.len(), 41);
    assert!(detection.failed.is_empty());
    assert!(detection.scores.iter().all(|s| (0.0..=1.0).contains(s)));

    let mut sorted = detection.scores.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    assert!(detection.scores[40] > sorted[20]);
}
