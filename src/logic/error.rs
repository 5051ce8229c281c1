//! Error handling
//!
//! Run-level failures. Detector and cluster level failures are absorbed
//! inside their phase and never reach this type.

use thiserror::Error;

use crate::logic::clustering::ClusterError;
use crate::logic::pipeline::RunPhase;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or unusable input, rejected before any computation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Every hyperparameter candidate (or the final fit) failed
    #[error("Model training failed: {0}")]
    TrainingFailure(String),

    #[error("Clustering failed: {0}")]
    ClusteringFailure(#[from] ClusterError),

    /// Persisted model does not match the supplied feature columns
    #[error("Feature layout mismatch: expected v{expected_version} ({expected_hash:08x}), got v{actual_version} ({actual_hash:08x})")]
    LayoutMismatch {
        expected_version: u8,
        expected_hash: u32,
        actual_version: u8,
        actual_hash: u32,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Phase a failure belongs to, for run-failure reporting
    pub fn phase(&self) -> RunPhase {
        match self {
            PipelineError::Configuration(_) => RunPhase::Init,
            PipelineError::TrainingFailure(_) | PipelineError::LayoutMismatch { .. } => {
                RunPhase::GlobalScoring
            }
            PipelineError::ClusteringFailure(_) => RunPhase::Clustering,
            PipelineError::Io(_) | PipelineError::Serialization(_) => RunPhase::Terminal,
        }
    }
}
