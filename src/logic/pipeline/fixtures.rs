//! Shared synthetic inputs for run-level tests

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::logic::config::EngineConfig;
use crate::logic::features::{FeatureMapping, FeatureMatrix};
use crate::logic::model::HyperParams;

/// Two tight claim populations plus `outliers` far-off rows at the end
pub fn claims(per_group: usize, outliers: usize, seed: u64) -> (FeatureMatrix, FeatureMapping, Vec<String>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = per_group * 2 + outliers;
    let mut main = Array2::zeros((n, 4));
    let mut cond = Array2::zeros((n, 1));

    for i in 0..n {
        let centre: f64 = if i < per_group { 0.25 } else { 0.7 };
        for j in 0..4 {
            main[[i, j]] = (centre + rng.gen_range(-0.03..0.03)).clamp(0.0, 1.0);
        }
        cond[[i, 0]] = if i < per_group { 0.0 } else { 1.0 };
    }
    for i in per_group * 2..n {
        main[[i, 0]] = 0.98;
        main[[i, 2]] = 0.02;
    }

    let columns = vec![
        "Paid_amount".to_string(),
        "Provider_ID_freqenc".to_string(),
        "Provider_ID_emb0".to_string(),
        "Claim_Delay".to_string(),
    ];
    let matrix = FeatureMatrix::new(main, cond, columns).unwrap();
    let mapping = FeatureMapping::new()
        .with("Paid_amount", &["Paid_amount"])
        .with("Provider_ID", &["Provider_ID_freqenc", "Provider_ID_emb0"]);
    let ids = (0..n).map(|i| format!("CLM-{:04}", i)).collect();
    (matrix, mapping, ids)
}

/// Small fixed network so runs skip the grid search
pub fn small_params() -> HyperParams {
    HyperParams {
        latent_dim: 2,
        hidden_dim: 8,
        learning_rate: 1e-2,
    }
}

pub fn quick_config() -> EngineConfig {
    EngineConfig {
        global_contamination: 0.05,
        local_contamination: 0.05,
        ..EngineConfig::quick()
    }
}
