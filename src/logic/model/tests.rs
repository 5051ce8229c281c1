//! Tests for the global scorer

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

use super::network::ConditionalAutoencoder;
use super::*;
use crate::logic::config::EngineConfig;
use crate::logic::error::PipelineError;
use crate::logic::features::FeatureMatrix;

/// Two correlated columns plus noise, one binary conditional column
fn synthetic_matrix(rows: usize, seed: u64) -> FeatureMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut main = Array2::zeros((rows, 4));
    let mut cond = Array2::zeros((rows, 1));
    for i in 0..rows {
        let base: f64 = rng.gen_range(0.2..0.8);
        main[[i, 0]] = base;
        main[[i, 1]] = 1.0 - base;
        main[[i, 2]] = rng.gen_range(0.4..0.6);
        main[[i, 3]] = (base * 0.5 + 0.25).clamp(0.0, 1.0);
        cond[[i, 0]] = if i % 2 == 0 { 1.0 } else { 0.0 };
    }
    FeatureMatrix::unnamed(main, cond).unwrap()
}

fn tiny_params() -> HyperParams {
    HyperParams {
        latent_dim: 2,
        hidden_dim: 8,
        learning_rate: 1e-2,
    }
}

#[test]
fn test_backward_matches_numeric_gradient() {
    let matrix = synthetic_matrix(12, 1);
    let mut rng = StdRng::seed_from_u64(7);
    let mut net = ConditionalAutoencoder::new(4, 1, &tiny_params(), &mut rng);

    let main = matrix.main().clone();
    let cond = matrix.conditional().clone();
    let pass = net.forward(main.view(), cond.view());
    let (_, grads) = net.backward(main.view(), &pass);

    let h = 1e-6;
    // first encoder layer and last decoder layer
    for (layer_idx, (r, c)) in [(0usize, (1usize, 2usize)), (6, (3, 1))] {
        let original = net.layers_mut().nth(layer_idx).unwrap().weights[[r, c]];

        net.layers_mut().nth(layer_idx).unwrap().weights[[r, c]] = original + h;
        let plus = net.loss(main.view(), cond.view());
        net.layers_mut().nth(layer_idx).unwrap().weights[[r, c]] = original - h;
        let minus = net.loss(main.view(), cond.view());
        net.layers_mut().nth(layer_idx).unwrap().weights[[r, c]] = original;

        let numeric = (plus - minus) / (2.0 * h);
        let analytic = grads[layer_idx].weights[[r, c]];
        assert!(
            (numeric - analytic).abs() < 1e-6 + 1e-3 * numeric.abs(),
            "layer {}: numeric {} vs analytic {}",
            layer_idx,
            numeric,
            analytic
        );
    }
}

#[test]
fn test_embedding_width_includes_conditional() {
    let matrix = synthetic_matrix(10, 2);
    let mut rng = StdRng::seed_from_u64(3);
    let net = ConditionalAutoencoder::new(4, 1, &tiny_params(), &mut rng);
    let latent = net.embed(matrix.main().view(), matrix.conditional().view());
    assert_eq!(latent.dim(), (10, 3));
    // conditional block is copied through
    assert_eq!(latent[[0, 2]], 1.0);
    assert_eq!(latent[[1, 2]], 0.0);
}

#[test]
fn test_fit_reduces_validation_loss() {
    let matrix = synthetic_matrix(120, 3);
    let mut rng = StdRng::seed_from_u64(42);
    let split = DataSplit::new(matrix.main(), matrix.conditional(), 0.2, &mut rng).unwrap();
    assert_eq!(split.val_main.nrows(), 24);

    let untrained = ConditionalAutoencoder::new(4, 1, &tiny_params(), &mut StdRng::seed_from_u64(5));
    let before = untrained.loss(split.val_main.view(), split.val_cond.view());

    let schedule = TrainSchedule {
        epochs: 30,
        batch_size: 16,
        patience: 30,
        plateau_patience: 5,
    };
    let outcome = training::fit(&split, &tiny_params(), &schedule, &mut rng).unwrap();
    assert!(outcome.epochs_run > 0);
    assert!(outcome.best_val_loss < before);
}

#[test]
fn test_split_needs_two_rows() {
    let matrix = synthetic_matrix(1, 4);
    let mut rng = StdRng::seed_from_u64(0);
    let result = DataSplit::new(matrix.main(), matrix.conditional(), 0.2, &mut rng);
    assert_eq!(result.unwrap_err(), ModelError::InsufficientData { rows: 1 });
}

#[test]
fn test_grid_order_varies_learning_rate_fastest() {
    let candidates = SearchGrid::default().candidates();
    assert_eq!(candidates.len(), 8);
    assert_eq!(
        candidates[0],
        HyperParams { latent_dim: 8, hidden_dim: 32, learning_rate: 1e-3 }
    );
    assert_eq!(candidates[1].learning_rate, 5e-4);
    assert_eq!(candidates[2].latent_dim, 16);
    assert_eq!(candidates[4].hidden_dim, 64);
}

#[test]
fn test_search_skips_failed_candidates() {
    let matrix = synthetic_matrix(40, 5);
    let grid = SearchGrid {
        hidden_dims: vec![8],
        latent_dims: vec![0, 2],
        learning_rates: vec![1e-2],
    };
    let outcome = search(&matrix, &grid, &EngineConfig::quick()).unwrap();
    assert_eq!(outcome.best.latent_dim, 2);
    assert!(outcome.candidates[0].error.is_some());
}

#[test]
fn test_search_all_failed_is_training_failure() {
    let matrix = synthetic_matrix(40, 5);
    let grid = SearchGrid {
        hidden_dims: vec![0],
        latent_dims: vec![2],
        learning_rates: vec![1e-2],
    };
    let result = search(&matrix, &grid, &EngineConfig::quick());
    assert!(matches!(result, Err(PipelineError::TrainingFailure(_))));
}

#[test]
fn test_train_and_score() {
    let matrix = synthetic_matrix(80, 6);
    let model = train(&matrix, Some(tiny_params()), &EngineConfig::quick()).unwrap();
    assert_eq!(model.layout.feature_count, 4);

    let scoring = score(&model, &matrix).unwrap();
    assert_eq!(scoring.errors.len(), 80);
    assert_eq!(scoring.latent.dim(), (80, 3));
    assert!(scoring.scores.iter().all(|s| *s > 0.0 && *s <= 1.0));
    assert!(scoring.scores.iter().any(|s| (*s - 1.0).abs() < 1e-12));
}

#[test]
fn test_score_rejects_different_layout() {
    let matrix = synthetic_matrix(30, 7);
    let model = train(&matrix, Some(tiny_params()), &EngineConfig::quick()).unwrap();

    let other = FeatureMatrix::new(
        matrix.main().clone(),
        matrix.conditional().clone(),
        vec!["a".into(), "b".into(), "c".into(), "d".into()],
    )
    .unwrap();
    assert!(matches!(
        score(&model, &other),
        Err(PipelineError::LayoutMismatch { .. })
    ));
}

#[test]
fn test_save_and_load_model() {
    let matrix = synthetic_matrix(30, 8);
    let model = train(&matrix, Some(tiny_params()), &EngineConfig::quick()).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("model.json");
    save_model(&model, &path).unwrap();

    let loaded = load_model(&path, matrix.main_columns()).unwrap();
    assert_eq!(loaded.model_id, model.model_id);

    let a = score(&model, &matrix).unwrap();
    let b = score(&loaded, &matrix).unwrap();
    for (x, y) in a.errors.iter().zip(b.errors.iter()) {
        assert!((x - y).abs() < 1e-12);
    }

    let wrong = vec!["x".to_string()];
    assert!(matches!(
        load_model(&path, &wrong),
        Err(PipelineError::LayoutMismatch { .. })
    ));
}
