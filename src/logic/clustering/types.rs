//! Clustering Types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::NOISE_LABEL;
use crate::logic::config::EngineConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    #[error("embedding has no rows")]
    Empty,

    #[error("embedding row {row} contains a non-finite value")]
    NonFinite { row: usize },
}

/// Density parameters scaled to the population size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionParams {
    pub min_cluster_size: usize,
    pub min_samples: usize,
}

impl PartitionParams {
    /// `min(cap, max(floor, n / divisor))` for both parameters, caps from config
    pub fn for_size(n: usize, config: &EngineConfig) -> Self {
        Self {
            min_cluster_size: config.min_cluster_size.min((n / 100).max(10)).max(2),
            min_samples: config.min_samples.min((n / 200).max(5)).max(1),
        }
    }
}

/// One label per record; `NOISE_LABEL` for records outside every group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub labels: Vec<i32>,
}

impl ClusterAssignment {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, row: usize) -> i32 {
        self.labels[row]
    }

    /// Member rows of every non-noise group, ascending
    pub fn groups(&self) -> BTreeMap<i32, Vec<usize>> {
        let mut groups: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (row, &label) in self.labels.iter().enumerate() {
            if label != NOISE_LABEL {
                groups.entry(label).or_default().push(row);
            }
        }
        groups
    }

    pub fn n_clusters(&self) -> usize {
        self.groups().len()
    }

    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|l| **l == NOISE_LABEL).count()
    }
}
