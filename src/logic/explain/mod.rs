//! Explain Module - Why a claim was flagged
//!
//! Every flagged record gets:
//! - global attribution: |z| against the whole population
//! - local attribution: |z| against its peer group, itself excluded
//!
//! Derived columns are folded back onto original fields before ranking. The
//! attributions then feed a per-field tally and a root-cause narrative.

pub mod attribution;
pub mod names;
pub mod narrative;
pub mod types;


use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::constants::NOISE_LABEL;
use crate::logic::clustering::ClusterAssignment;
use crate::logic::config::EngineConfig;
use crate::logic::features::{FeatureMapping, FeatureMatrix};
use crate::logic::flagging::AnomalyRecord;

pub use attribution::{attribute, inline_text, ColumnStats};
pub use names::{reverse_map, title_case};
pub use narrative::{root_cause, top_driver};
pub use types::{ExplanationReport, FeatureAttribution, FeatureDetail, FieldDetails, RecordExplanation};

/// Explain every flagged record in `records`
pub fn explain(
    records: &[AnomalyRecord],
    matrix: &FeatureMatrix,
    assignment: &ClusterAssignment,
    mapping: &FeatureMapping,
    config: &EngineConfig,
) -> ExplanationReport {
    let flagged: Vec<&AnomalyRecord> = records.iter().filter(|r| r.final_flag).collect();
    if flagged.is_empty() {
        return ExplanationReport::default();
    }

    let fields = reverse_map(matrix.main_columns(), mapping);
    let population = ColumnStats::of(matrix.main());
    let groups = assignment.groups();

    let explanations: Vec<RecordExplanation> = flagged
        .par_iter()
        .map(|record| {
            let row = matrix.main().row(record.row);

            let global_features = match (&population, record.category.has_global()) {
                (Some(stats), true) => attribute(&stats.z_scores(row), &fields, config.top_features),
                _ => Vec::new(),
            };

            let local_features = if record.category.has_local() && record.cluster != NOISE_LABEL {
                let peers: Vec<usize> = groups
                    .get(&record.cluster)
                    .map(|members| members.iter().copied().filter(|&i| i != record.row).collect())
                    .unwrap_or_default();
                match ColumnStats::of(&matrix.main_rows(&peers)) {
                    Some(stats) => attribute(&stats.z_scores(row), &fields, config.top_features),
                    None => Vec::new(),
                }
            } else {
                Vec::new()
            };

            let global_text = if record.category.has_global() {
                inline_text(record.global_score, &global_features, config.inline_features)
            } else {
                String::new()
            };
            let local_text = if record.category.has_local() {
                inline_text(record.local_score, &local_features, config.inline_features)
            } else {
                String::new()
            };

            RecordExplanation {
                row: record.row,
                record_id: record.record_id.clone(),
                category: record.category,
                combined_score: record.combined_score,
                global_text,
                local_text,
                global_features,
                local_features,
            }
        })
        .collect();

    let feature_details = tally(&explanations);
    let root_cause = root_cause(&feature_details, explanations.len());

    log::info!(
        "Explained {} flagged records across {} fields",
        explanations.len(),
        feature_details.len()
    );

    ExplanationReport {
        explanations,
        feature_details,
        root_cause,
    }
}

/// Per field, the flagged records it was attributed to (each record once)
fn tally(explanations: &[RecordExplanation]) -> Vec<FieldDetails> {
    let mut details: Vec<FieldDetails> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for e in explanations {
        let mut seen: HashSet<&str> = HashSet::new();
        for attr in e.global_features.iter().chain(e.local_features.iter()) {
            if !seen.insert(attr.field.as_str()) {
                continue;
            }
            let slot = *index.entry(attr.field.clone()).or_insert_with(|| {
                details.push(FieldDetails {
                    field: attr.field.clone(),
                    records: Vec::new(),
                });
                details.len() - 1
            });
            details[slot].records.push(FeatureDetail {
                record_id: e.record_id.clone(),
                score: e.combined_score,
            });
        }
    }
    details
}
