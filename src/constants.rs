//! Central Configuration Constants
//!
//! Single source of truth for all engine defaults.
//! Environment overrides are read through the helpers at the bottom.

use std::path::PathBuf;

/// Expected fraction of globally anomalous claims
pub const DEFAULT_GLOBAL_CONTAMINATION: f64 = 0.01;

/// Expected fraction of anomalous claims inside one peer group
pub const DEFAULT_LOCAL_CONTAMINATION: f64 = 0.01;

/// Upper bound for the density clustering minimum group size
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 30;

/// Upper bound for the density clustering neighbourhood size
pub const DEFAULT_MIN_SAMPLES: usize = 10;

/// Peer groups at or below this size are never scored locally
pub const DEFAULT_LOCAL_MIN_CLUSTER_SIZE: usize = 5;

/// Autoencoder training budget
pub const DEFAULT_EPOCHS: usize = 100;
pub const DEFAULT_BATCH_SIZE: usize = 64;
pub const DEFAULT_PATIENCE: usize = 10;

/// Hyperparameter search budget (per candidate)
pub const DEFAULT_SEARCH_EPOCHS: usize = 15;
pub const DEFAULT_SEARCH_PATIENCE: usize = 5;

/// Seed for every random draw in a run
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Attributed fields per record (and how many are shown inline)
pub const DEFAULT_TOP_FEATURES: usize = 3;
pub const DEFAULT_INLINE_FEATURES: usize = 2;

/// Cluster label for records outside every peer group
pub const NOISE_LABEL: i32 = -1;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Claim Anomaly Engine";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Read a float from the environment or use default
pub fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Read an unsigned size from the environment or use default
pub fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Read a u64 from the environment or use default
pub fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Get the run output directory from environment or use the local data dir
pub fn get_output_dir() -> PathBuf {
    std::env::var("CLAIMS_OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("claim-anomaly")
                .join("runs")
        })
}
