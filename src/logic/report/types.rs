//! Report Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::explain::{FeatureAttribution, RecordExplanation};
use crate::logic::flagging::{AnomalyCategory, AnomalyRecord};
use crate::logic::model::HyperParams;

// ============================================================================
// FLAGGED TABLE
// ============================================================================

/// One row of the flagged table: the result row plus its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedRow {
    #[serde(flatten)]
    pub record: AnomalyRecord,
    pub global_explanation: String,
    pub local_explanation: String,
    pub global_features: Vec<FeatureAttribution>,
    pub local_features: Vec<FeatureAttribution>,
}

impl FlaggedRow {
    pub fn new(record: AnomalyRecord, explanation: Option<&RecordExplanation>) -> Self {
        match explanation {
            Some(e) => Self {
                record,
                global_explanation: e.global_text.clone(),
                local_explanation: e.local_text.clone(),
                global_features: e.global_features.clone(),
                local_features: e.local_features.clone(),
            },
            None => Self {
                record,
                global_explanation: String::new(),
                local_explanation: String::new(),
                global_features: Vec::new(),
                local_features: Vec::new(),
            },
        }
    }
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub both: usize,
    pub global: usize,
    pub local: usize,
    pub not_anomaly: usize,
}

impl CategoryCounts {
    pub fn tally(records: &[AnomalyRecord]) -> Self {
        let mut counts = Self::default();
        for r in records {
            match r.category {
                AnomalyCategory::Both => counts.both += 1,
                AnomalyCategory::Global => counts.global += 1,
                AnomalyCategory::Local => counts.local += 1,
                AnomalyCategory::NotAnomaly => counts.not_anomaly += 1,
            }
        }
        counts
    }

    pub fn flagged(&self) -> usize {
        self.both + self.global + self.local
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    pub total_records: usize,
    pub total_flagged: usize,
    /// total_flagged / total_records
    pub detection_rate: f64,
    pub categories: CategoryCounts,

    pub clusters_found: usize,
    pub noise_records: usize,
    pub clusters_scored: usize,
    pub clusters_skipped: usize,
    /// Detector failures absorbed across all scored clusters
    pub degraded_detectors: usize,

    pub model_id: Uuid,
    pub hyperparams: HyperParams,
    pub best_val_loss: f64,
    /// False when the model came from disk
    pub trained_this_run: bool,
}
