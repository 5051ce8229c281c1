use serde::{Deserialize, Serialize};

use crate::logic::flagging::AnomalyCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    /// Original field (display name)
    pub field: String,
    /// Largest |z| among the field's derived columns
    pub z_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordExplanation {
    pub row: usize,
    pub record_id: String,
    pub category: AnomalyCategory,
    pub combined_score: f64,
    /// `"<global score> (<field>: <z>, ...)"`, empty unless Global or Both
    pub global_text: String,
    /// Same shape for the local score, empty unless Local or Both
    pub local_text: String,
    pub global_features: Vec<FeatureAttribution>,
    pub local_features: Vec<FeatureAttribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDetail {
    pub record_id: String,
    pub score: f64,
}

/// Flagged records a field was attributed to, in first-seen order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDetails {
    pub field: String,
    pub records: Vec<FeatureDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplanationReport {
    pub explanations: Vec<RecordExplanation>,
    pub feature_details: Vec<FieldDetails>,
    pub root_cause: String,
}

impl ExplanationReport {
    pub fn is_empty(&self) -> bool {
        self.explanations.is_empty()
    }

    pub fn for_row(&self, row: usize) -> Option<&RecordExplanation> {
        self.explanations.iter().find(|e| e.row == row)
    }
}
