//! Model Module - Global Scorer
//!
//! Conditional autoencoder trained on the whole population. Records the model
//! reconstructs poorly, given their conditional context, score high.
//!
//! `train` owns hyperparameter search and the final fit. `score` needs the
//! returned `TrainedModel` and a matrix with the same column layout.

pub mod network;
pub mod optimizer;
pub mod training;
pub mod search;
pub mod scoring;
pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::logic::config::EngineConfig;
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::{FeatureMatrix, LayoutInfo};

// Re-exports
pub use network::ConditionalAutoencoder;
pub use scoring::ecdf_scores;
pub use search::{search, CandidateResult, SearchGrid, SearchOutcome};
pub use storage::{get_default_model_path, load_model, save_model};
pub use training::{DataSplit, TrainSchedule};
pub use types::{GlobalScoring, HyperParams, ModelError, TrainedModel};

/// Train the global model.
///
/// Without explicit `hyperparams` the default grid is searched first.
pub fn train(
    matrix: &FeatureMatrix,
    hyperparams: Option<HyperParams>,
    config: &EngineConfig,
) -> PipelineResult<TrainedModel> {
    let params = match hyperparams {
        Some(p) => {
            log::info!("Using supplied hyperparameters: {}", p);
            p
        }
        None => search(matrix, &SearchGrid::default(), config)?.best,
    };

    let mut rng = StdRng::seed_from_u64(config.random_state);
    let split = DataSplit::new(
        matrix.main(),
        matrix.conditional(),
        training::VALIDATION_FRACTION,
        &mut rng,
    )
    .map_err(|e| PipelineError::TrainingFailure(e.to_string()))?;

    let schedule = TrainSchedule::final_fit(config);
    let outcome = training::fit(&split, &params, &schedule, &mut rng).map_err(|e| {
        PipelineError::TrainingFailure(format!("final fit with {} failed: {}", params, e))
    })?;

    log::info!(
        "Trained global model: {} epochs, val_loss={:.6}, lr={:e}",
        outcome.epochs_run,
        outcome.best_val_loss,
        outcome.final_learning_rate
    );

    Ok(TrainedModel {
        model_id: Uuid::new_v4(),
        trained_at: Utc::now(),
        hyperparams: params,
        layout: LayoutInfo::of(matrix.main_columns()),
        conditional_dim: matrix.conditional_dim(),
        best_val_loss: outcome.best_val_loss,
        epochs_run: outcome.epochs_run,
        network: outcome.network,
    })
}

/// Score every record: reconstruction error, ECDF score and latent embedding
pub fn score(model: &TrainedModel, matrix: &FeatureMatrix) -> PipelineResult<GlobalScoring> {
    model.layout.validate(matrix.main_columns())?;
    if model.conditional_dim != matrix.conditional_dim() {
        return Err(PipelineError::Configuration(format!(
            "model expects {} conditional columns, matrix has {}",
            model.conditional_dim,
            matrix.conditional_dim()
        )));
    }

    let main = matrix.main().view();
    let cond = matrix.conditional().view();

    let errors = model.network.reconstruction_errors(main, cond);
    if errors.iter().any(|e| !e.is_finite()) {
        return Err(PipelineError::TrainingFailure(
            "model produced non-finite reconstruction errors".to_string(),
        ));
    }

    let scores = ecdf_scores(&errors);
    let latent = model.network.embed(main, cond);

    log::info!(
        "Global scoring: {} records, latent width {}",
        errors.len(),
        latent.ncols()
    );

    Ok(GlobalScoring {
        errors,
        scores,
        latent,
    })
}
