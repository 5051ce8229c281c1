//! Training loop
//!
//! Mini-batch Adam on reconstruction MSE, with early stopping that restores
//! the best weights and a learning-rate halving schedule on plateau.

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::network::ConditionalAutoencoder;
use super::optimizer::Adam;
use super::types::{HyperParams, ModelError};
use crate::logic::config::EngineConfig;

/// Share of rows held out to monitor validation loss
pub const VALIDATION_FRACTION: f64 = 0.2;

const PLATEAU_FACTOR: f64 = 0.5;
const PLATEAU_MIN_DELTA: f64 = 1e-4;
const MIN_LEARNING_RATE: f64 = 1e-6;

// ============================================================================
// SPLIT
// ============================================================================

/// Shuffled train/validation split of a main/conditional pair
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub train_main: Array2<f64>,
    pub train_cond: Array2<f64>,
    pub val_main: Array2<f64>,
    pub val_cond: Array2<f64>,
}

impl DataSplit {
    pub fn new(
        main: &Array2<f64>,
        conditional: &Array2<f64>,
        validation_fraction: f64,
        rng: &mut StdRng,
    ) -> Result<Self, ModelError> {
        let n = main.nrows();
        if n < 2 {
            return Err(ModelError::InsufficientData { rows: n });
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let val_n = ((n as f64 * validation_fraction).ceil() as usize).clamp(1, n - 1);
        let (val_idx, train_idx) = order.split_at(val_n);

        Ok(Self {
            train_main: main.select(Axis(0), train_idx),
            train_cond: conditional.select(Axis(0), train_idx),
            val_main: main.select(Axis(0), val_idx),
            val_cond: conditional.select(Axis(0), val_idx),
        })
    }

    pub fn train_rows(&self) -> usize {
        self.train_main.nrows()
    }
}

// ============================================================================
// SCHEDULE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainSchedule {
    pub epochs: usize,
    pub batch_size: usize,
    /// Epochs without improvement before stopping
    pub patience: usize,
    /// Epochs without improvement before halving the learning rate
    pub plateau_patience: usize,
}

impl TrainSchedule {
    /// Full budget for the chosen hyperparameters
    pub fn final_fit(config: &EngineConfig) -> Self {
        Self {
            epochs: config.epochs,
            batch_size: config.batch_size,
            patience: config.patience,
            plateau_patience: 5,
        }
    }

    /// Short budget for one search candidate
    pub fn search(config: &EngineConfig) -> Self {
        Self {
            epochs: config.search_epochs,
            batch_size: config.batch_size,
            patience: config.search_patience,
            plateau_patience: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub network: ConditionalAutoencoder,
    pub best_val_loss: f64,
    pub epochs_run: usize,
    pub final_learning_rate: f64,
}

// ============================================================================
// FIT
// ============================================================================

/// Train a fresh network on `split`
pub fn fit(
    split: &DataSplit,
    params: &HyperParams,
    schedule: &TrainSchedule,
    rng: &mut StdRng,
) -> Result<FitOutcome, ModelError> {
    if params.latent_dim == 0 || params.hidden_dim == 0 {
        return Err(ModelError::InvalidParams(format!("{}", params)));
    }
    if !(params.learning_rate > 0.0 && params.learning_rate.is_finite()) {
        return Err(ModelError::InvalidParams(format!("{}", params)));
    }

    let mut network = ConditionalAutoencoder::new(
        split.train_main.ncols(),
        split.train_cond.ncols(),
        params,
        rng,
    );
    let mut optimizer = Adam::new(params.learning_rate);

    let mut best_loss = f64::INFINITY;
    let mut best_network = network.clone();
    let mut wait = 0;
    let mut plateau_best = f64::INFINITY;
    let mut plateau_wait = 0;
    let mut epochs_run = 0;

    let batch_size = schedule.batch_size.max(1);
    let mut order: Vec<usize> = (0..split.train_rows()).collect();

    for epoch in 0..schedule.epochs {
        order.shuffle(rng);

        let mut train_loss = 0.0;
        for batch in order.chunks(batch_size) {
            let xb = split.train_main.select(Axis(0), batch);
            let cb = split.train_cond.select(Axis(0), batch);

            let pass = network.forward(xb.view(), cb.view());
            let (loss, grads) = network.backward(xb.view(), &pass);
            if !loss.is_finite() {
                return Err(ModelError::NonFiniteLoss { epoch });
            }
            optimizer.step(&mut network, grads);
            train_loss += loss * batch.len() as f64;
        }
        train_loss /= split.train_rows() as f64;

        let val_loss = network.loss(split.val_main.view(), split.val_cond.view());
        if !val_loss.is_finite() {
            return Err(ModelError::NonFiniteLoss { epoch });
        }
        epochs_run = epoch + 1;

        log::debug!(
            "epoch {:>3}: loss={:.6} val_loss={:.6} lr={:e}",
            epochs_run,
            train_loss,
            val_loss,
            optimizer.learning_rate
        );

        // Early stopping
        if val_loss < best_loss {
            best_loss = val_loss;
            best_network = network.clone();
            wait = 0;
        } else {
            wait += 1;
            if wait >= schedule.patience {
                log::debug!("Early stop after {} epochs (best val_loss={:.6})", epochs_run, best_loss);
                break;
            }
        }

        // Plateau
        if val_loss < plateau_best - PLATEAU_MIN_DELTA {
            plateau_best = val_loss;
            plateau_wait = 0;
        } else {
            plateau_wait += 1;
            if plateau_wait >= schedule.plateau_patience {
                let reduced = (optimizer.learning_rate * PLATEAU_FACTOR).max(MIN_LEARNING_RATE);
                if reduced < optimizer.learning_rate {
                    log::debug!("Reducing learning rate to {:e}", reduced);
                    optimizer.learning_rate = reduced;
                }
                plateau_wait = 0;
            }
        }
    }

    Ok(FitOutcome {
        network: best_network,
        best_val_loss: best_loss,
        epochs_run,
        final_learning_rate: optimizer.learning_rate,
    })
}
