//! Engine Configuration
//!
//! One explicit value per run. Built at run start, passed by reference into
//! every phase, never mutated mid-run.

use serde::{Deserialize, Serialize};

use crate::constants::{self, env_f64, env_u64, env_usize};
use crate::logic::error::{PipelineError, PipelineResult};

/// Ensemble weights for the three local base detectors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub isolation: f64,
    pub one_class: f64,
    pub density: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            isolation: 0.35,
            one_class: 0.35,
            density: 0.30,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fraction of the population flagged by the global criterion
    pub global_contamination: f64,

    /// Fraction of each peer group flagged by the local criterion
    pub local_contamination: f64,

    /// Upper bounds for the size-scaled clustering parameters
    pub min_cluster_size: usize,
    pub min_samples: usize,

    /// Peer groups with this many members or fewer are skipped
    pub local_min_cluster_size: usize,

    /// Final training budget
    pub epochs: usize,
    pub batch_size: usize,
    pub patience: usize,

    /// Per-candidate budget during hyperparameter search
    pub search_epochs: usize,
    pub search_patience: usize,

    pub random_state: u64,

    pub ensemble_weights: EnsembleWeights,

    /// Combined score = global_weight * global + local_weight * local
    pub global_weight: f64,
    pub local_weight: f64,

    /// Fields attributed per record, and how many appear inline
    pub top_features: usize,
    pub inline_features: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            global_contamination: constants::DEFAULT_GLOBAL_CONTAMINATION,
            local_contamination: constants::DEFAULT_LOCAL_CONTAMINATION,
            min_cluster_size: constants::DEFAULT_MIN_CLUSTER_SIZE,
            min_samples: constants::DEFAULT_MIN_SAMPLES,
            local_min_cluster_size: constants::DEFAULT_LOCAL_MIN_CLUSTER_SIZE,
            epochs: constants::DEFAULT_EPOCHS,
            batch_size: constants::DEFAULT_BATCH_SIZE,
            patience: constants::DEFAULT_PATIENCE,
            search_epochs: constants::DEFAULT_SEARCH_EPOCHS,
            search_patience: constants::DEFAULT_SEARCH_PATIENCE,
            random_state: constants::DEFAULT_RANDOM_STATE,
            ensemble_weights: EnsembleWeights::default(),
            global_weight: 0.6,
            local_weight: 0.4,
            top_features: constants::DEFAULT_TOP_FEATURES,
            inline_features: constants::DEFAULT_INLINE_FEATURES,
        }
    }
}

impl EngineConfig {
    /// Load configuration from `CLAIMS_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            global_contamination: env_f64("CLAIMS_GLOBAL_CONTAMINATION", defaults.global_contamination),
            local_contamination: env_f64("CLAIMS_LOCAL_CONTAMINATION", defaults.local_contamination),
            min_cluster_size: env_usize("CLAIMS_MIN_CLUSTER_SIZE", defaults.min_cluster_size),
            min_samples: env_usize("CLAIMS_MIN_SAMPLES", defaults.min_samples),
            local_min_cluster_size: env_usize(
                "CLAIMS_LOCAL_MIN_CLUSTER_SIZE",
                defaults.local_min_cluster_size,
            ),
            epochs: env_usize("CLAIMS_EPOCHS", defaults.epochs),
            batch_size: env_usize("CLAIMS_BATCH_SIZE", defaults.batch_size),
            patience: env_usize("CLAIMS_PATIENCE", defaults.patience),
            search_epochs: env_usize("CLAIMS_SEARCH_EPOCHS", defaults.search_epochs),
            search_patience: env_usize("CLAIMS_SEARCH_PATIENCE", defaults.search_patience),
            random_state: env_u64("CLAIMS_RANDOM_STATE", defaults.random_state),
            ..defaults
        }
    }

    /// Fast preset for tests and smoke runs
    pub fn quick() -> Self {
        Self {
            epochs: 10,
            patience: 3,
            search_epochs: 3,
            search_patience: 2,
            ..Default::default()
        }
    }

    /// Reject values no run could honour
    pub fn validate(&self) -> PipelineResult<()> {
        let in_range = |v: f64| v > 0.0 && v <= 0.5;
        if !in_range(self.global_contamination) {
            return Err(PipelineError::Configuration(format!(
                "global_contamination must be in (0, 0.5], got {}",
                self.global_contamination
            )));
        }
        if !in_range(self.local_contamination) {
            return Err(PipelineError::Configuration(format!(
                "local_contamination must be in (0, 0.5], got {}",
                self.local_contamination
            )));
        }
        if self.epochs == 0 || self.batch_size == 0 {
            return Err(PipelineError::Configuration(
                "epochs and batch_size must be positive".to_string(),
            ));
        }
        if self.min_cluster_size < 2 || self.min_samples == 0 {
            return Err(PipelineError::Configuration(format!(
                "min_cluster_size must be >= 2 and min_samples >= 1, got {} / {}",
                self.min_cluster_size, self.min_samples
            )));
        }
        let w = self.ensemble_weights;
        if [w.isolation, w.one_class, w.density].iter().any(|x| !x.is_finite() || *x <= 0.0) {
            return Err(PipelineError::Configuration(
                "ensemble weights must be positive".to_string(),
            ));
        }
        if self.global_weight < 0.0 || self.local_weight < 0.0 {
            return Err(PipelineError::Configuration(
                "combined score weights must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
