//! Clustering Module - Peer Group Partitioner
//!
//! Splits the latent embedding into density-based peer groups. Parameters
//! scale with population size, capped by the engine configuration.

pub mod hdbscan;
pub mod types;

#[cfg(test)]
mod tests;

use ndarray::Array2;

use crate::logic::config::EngineConfig;

pub use hdbscan::Hdbscan;
pub use types::{ClusterAssignment, ClusterError, PartitionParams};

/// Assign every latent row to a peer group or to noise
pub fn partition(latent: &Array2<f64>, config: &EngineConfig) -> Result<ClusterAssignment, ClusterError> {
    let params = PartitionParams::for_size(latent.nrows(), config);
    log::info!(
        "Partitioning {} records (min_cluster_size={}, min_samples={})",
        latent.nrows(),
        params.min_cluster_size,
        params.min_samples
    );

    let labels = Hdbscan::new()
        .min_cluster_size(params.min_cluster_size)
        .min_samples(params.min_samples)
        .fit(latent)?;

    let assignment = ClusterAssignment { labels };
    log::info!(
        "Found {} peer groups, {} noise records",
        assignment.n_clusters(),
        assignment.noise_count()
    );
    Ok(assignment)
}
