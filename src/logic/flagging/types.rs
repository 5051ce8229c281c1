//! Flagging Types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnomalyCategory {
    Both,
    Global,
    Local,
    #[serde(rename = "Not Anomaly")]
    NotAnomaly,
}

impl AnomalyCategory {
    pub fn from_flags(global: bool, local: bool) -> Self {
        match (global, local) {
            (true, true) => AnomalyCategory::Both,
            (true, false) => AnomalyCategory::Global,
            (false, true) => AnomalyCategory::Local,
            (false, false) => AnomalyCategory::NotAnomaly,
        }
    }

    pub fn is_anomaly(&self) -> bool {
        *self != AnomalyCategory::NotAnomaly
    }

    /// Record carries a global explanation
    pub fn has_global(&self) -> bool {
        matches!(self, AnomalyCategory::Both | AnomalyCategory::Global)
    }

    /// Record carries a local explanation
    pub fn has_local(&self) -> bool {
        matches!(self, AnomalyCategory::Both | AnomalyCategory::Local)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyCategory::Both => "Both",
            AnomalyCategory::Global => "Global",
            AnomalyCategory::Local => "Local",
            AnomalyCategory::NotAnomaly => "Not Anomaly",
        }
    }
}

impl std::fmt::Display for AnomalyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub row: usize,
    pub record_id: String,
    pub global_score: f64,
    /// Peer group label, -1 for noise
    pub cluster: i32,
    pub local_score: f64,
    pub category: AnomalyCategory,
    pub combined_score: f64,
    pub final_flag: bool,
}
