//! Tests for the peer group partitioner

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::constants::NOISE_LABEL;
use crate::logic::config::EngineConfig;

/// Tight blobs around the given centres, `per_blob` points each
fn blobs(centres: &[(f64, f64)], per_blob: usize, spread: f64, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Array2::zeros((centres.len() * per_blob, 2));
    for (b, (cx, cy)) in centres.iter().enumerate() {
        for i in 0..per_blob {
            let row = b * per_blob + i;
            data[[row, 0]] = cx + rng.gen_range(-spread..spread);
            data[[row, 1]] = cy + rng.gen_range(-spread..spread);
        }
    }
    data
}

#[test]
fn test_params_scale_with_size() {
    let config = EngineConfig::default();
    let small = PartitionParams::for_size(200, &config);
    assert_eq!(small.min_cluster_size, 10);
    assert_eq!(small.min_samples, 5);

    let large = PartitionParams::for_size(100_000, &config);
    assert_eq!(large.min_cluster_size, 30);
    assert_eq!(large.min_samples, 10);

    let mid = PartitionParams::for_size(2_000, &config);
    assert_eq!(mid.min_cluster_size, 20);
    assert_eq!(mid.min_samples, 10);
}

#[test]
fn test_two_separated_blobs() {
    let data = blobs(&[(0.0, 0.0), (10.0, 10.0)], 30, 0.5, 1);
    let labels = Hdbscan::new()
        .min_cluster_size(10)
        .min_samples(5)
        .fit(&data)
        .unwrap();

    let first = labels[0];
    let second = labels[30];
    assert_ne!(first, NOISE_LABEL);
    assert_ne!(second, NOISE_LABEL);
    assert_ne!(first, second);

    let first_count = labels[..30].iter().filter(|l| **l == first).count();
    let second_count = labels[30..].iter().filter(|l| **l == second).count();
    assert!(first_count >= 25);
    assert!(second_count >= 25);
}

#[test]
fn test_far_point_is_noise() {
    let mut data = blobs(&[(0.0, 0.0), (5.0, 5.0)], 25, 0.3, 2);
    let last = data.nrows() - 1;
    data[[last, 0]] = 100.0;
    data[[last, 1]] = -100.0;

    let labels = Hdbscan::new()
        .min_cluster_size(10)
        .min_samples(5)
        .fit(&data)
        .unwrap();
    assert_eq!(labels[last], NOISE_LABEL);
}

#[test]
fn test_labels_are_dense() {
    let data = blobs(&[(0.0, 0.0), (8.0, 0.0), (0.0, 8.0)], 20, 0.4, 3);
    let assignment = ClusterAssignment {
        labels: Hdbscan::new()
            .min_cluster_size(10)
            .min_samples(5)
            .fit(&data)
            .unwrap(),
    };
    let groups = assignment.groups();
    let keys: Vec<i32> = groups.keys().copied().collect();
    let expected: Vec<i32> = (0..keys.len() as i32).collect();
    assert_eq!(keys, expected);
    assert!(assignment.n_clusters() >= 2);
}

#[test]
fn test_small_population_is_all_noise() {
    let data = blobs(&[(0.0, 0.0)], 6, 0.1, 4);
    let labels = Hdbscan::new().min_cluster_size(10).fit(&data).unwrap();
    assert!(labels.iter().all(|l| *l == NOISE_LABEL));
}

#[test]
fn test_empty_and_non_finite_rejected() {
    let empty = Array2::<f64>::zeros((0, 2));
    assert_eq!(Hdbscan::new().fit(&empty), Err(ClusterError::Empty));

    let mut data = blobs(&[(0.0, 0.0)], 12, 0.1, 5);
    data[[3, 1]] = f64::NAN;
    assert_eq!(
        Hdbscan::new().fit(&data),
        Err(ClusterError::NonFinite { row: 3 })
    );
}

#[test]
fn test_duplicate_points_do_not_break_selection() {
    let mut data = blobs(&[(0.0, 0.0), (6.0, 6.0)], 20, 0.2, 6);
    for i in 0..10 {
        data[[i, 0]] = 0.0;
        data[[i, 1]] = 0.0;
    }
    let labels = Hdbscan::new()
        .min_cluster_size(8)
        .min_samples(4)
        .fit(&data)
        .unwrap();
    assert_eq!(labels.len(), 40);
    assert!(labels.iter().all(|l| *l >= NOISE_LABEL));
}

#[test]
fn test_partition_uses_scaled_params() {
    let data = blobs(&[(0.0, 0.0), (10.0, 10.0)], 40, 0.5, 7);
    let assignment = partition(&data, &EngineConfig::default()).unwrap();
    assert_eq!(assignment.len(), 80);
    assert!(assignment.n_clusters() >= 2);
}
