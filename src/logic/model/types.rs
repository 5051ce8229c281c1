//! Model Types
//!
//! Data structures only. Training and scoring logic live next door.

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::network::ConditionalAutoencoder;
use crate::logic::features::LayoutInfo;

// ============================================================================
// HYPERPARAMETERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperParams {
    /// Width of the encoder output (before the conditional block is appended)
    pub latent_dim: usize,
    /// Width of the first hidden layer; the second is half of it
    pub hidden_dim: usize,
    pub learning_rate: f64,
}

impl Default for HyperParams {
    fn default() -> Self {
        Self {
            latent_dim: 16,
            hidden_dim: 64,
            learning_rate: 1e-3,
        }
    }
}

impl std::fmt::Display for HyperParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "latent={} hidden={} lr={:e}",
            self.latent_dim, self.hidden_dim, self.learning_rate
        )
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Failure of one training attempt (one grid candidate or the final fit)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("non-finite loss at epoch {epoch}")]
    NonFiniteLoss { epoch: usize },

    #[error("not enough rows to train: {rows}")]
    InsufficientData { rows: usize },

    #[error("invalid hyperparameters: {0}")]
    InvalidParams(String),
}

// ============================================================================
// TRAINED MODEL
// ============================================================================

/// Everything needed to score a matrix with the same column layout.
///
/// Returned by `train`, passed explicitly to `score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub hyperparams: HyperParams,
    pub layout: LayoutInfo,
    pub conditional_dim: usize,
    pub best_val_loss: f64,
    pub epochs_run: usize,
    pub network: ConditionalAutoencoder,
}

/// Output of the global scoring phase
#[derive(Debug, Clone)]
pub struct GlobalScoring {
    /// Mean squared reconstruction error per record
    pub errors: Vec<f64>,
    /// ECDF of `errors`, in [0,1]
    pub scores: Vec<f64>,
    /// Encoder output concatenated with the conditional input
    pub latent: Array2<f64>,
}
