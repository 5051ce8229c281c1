//! Hyperparameter search
//!
//! Exhaustive grid over (hidden, latent, learning rate). Every candidate is
//! trained on the same split with a short budget; lowest validation loss wins,
//! first candidate wins ties. A candidate that fails is logged and skipped.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::training::{fit, DataSplit, TrainSchedule, VALIDATION_FRACTION};
use super::types::HyperParams;
use crate::logic::config::EngineConfig;
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::FeatureMatrix;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchGrid {
    pub hidden_dims: Vec<usize>,
    pub latent_dims: Vec<usize>,
    pub learning_rates: Vec<f64>,
}

impl Default for SearchGrid {
    fn default() -> Self {
        Self {
            hidden_dims: vec![32, 64],
            latent_dims: vec![8, 16],
            learning_rates: vec![1e-3, 5e-4],
        }
    }
}

impl SearchGrid {
    /// Candidates in evaluation order (learning rate varies fastest)
    pub fn candidates(&self) -> Vec<HyperParams> {
        let mut out = Vec::new();
        for &hidden_dim in &self.hidden_dims {
            for &latent_dim in &self.latent_dims {
                for &learning_rate in &self.learning_rates {
                    out.push(HyperParams {
                        latent_dim,
                        hidden_dim,
                        learning_rate,
                    });
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: HyperParams,
    pub val_loss: Option<f64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: HyperParams,
    pub best_val_loss: f64,
    pub candidates: Vec<CandidateResult>,
}

/// Pick the candidate with the lowest validation loss
pub fn search(
    matrix: &FeatureMatrix,
    grid: &SearchGrid,
    config: &EngineConfig,
) -> PipelineResult<SearchOutcome> {
    let candidates = grid.candidates();
    if candidates.is_empty() {
        return Err(PipelineError::Configuration(
            "hyperparameter grid is empty".to_string(),
        ));
    }

    let mut split_rng = StdRng::seed_from_u64(config.random_state);
    let split = DataSplit::new(
        matrix.main(),
        matrix.conditional(),
        VALIDATION_FRACTION,
        &mut split_rng,
    )
    .map_err(|e| PipelineError::TrainingFailure(e.to_string()))?;

    let schedule = TrainSchedule::search(config);
    log::info!(
        "Hyperparameter search: {} candidates, {} epochs each",
        candidates.len(),
        schedule.epochs
    );

    let results: Vec<CandidateResult> = candidates
        .par_iter()
        .enumerate()
        .map(|(i, params)| {
            let mut rng = StdRng::seed_from_u64(config.random_state.wrapping_add(i as u64 + 1));
            match fit(&split, params, &schedule, &mut rng) {
                Ok(outcome) => {
                    log::debug!("Candidate {}: val_loss={:.6}", params, outcome.best_val_loss);
                    CandidateResult {
                        params: *params,
                        val_loss: Some(outcome.best_val_loss),
                        error: None,
                    }
                }
                Err(e) => {
                    log::warn!("Candidate {} failed: {}", params, e);
                    CandidateResult {
                        params: *params,
                        val_loss: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect();

    let mut best: Option<(HyperParams, f64)> = None;
    for result in &results {
        if let Some(loss) = result.val_loss {
            if best.map_or(true, |(_, b)| loss < b) {
                best = Some((result.params, loss));
            }
        }
    }

    match best {
        Some((params, loss)) => {
            log::info!("Best hyperparameters: {} (val_loss={:.6})", params, loss);
            Ok(SearchOutcome {
                best: params,
                best_val_loss: loss,
                candidates: results,
            })
        }
        None => Err(PipelineError::TrainingFailure(format!(
            "all {} hyperparameter candidates failed",
            results.len()
        ))),
    }
}
