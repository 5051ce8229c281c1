//! Flagging Module - Thresholds, categories and combined score
//!
//! Exact-quantile cutoffs: the global cut is taken over the whole population,
//! the local cut inside each eligible peer group. Pure functions of the scores,
//! so re-running on unchanged input gives the same flags.

pub mod types;


use crate::logic::clustering::ClusterAssignment;
use crate::logic::config::EngineConfig;

pub use types::{AnomalyCategory, AnomalyRecord};

/// Linear-interpolation quantile, `q` in [0,1]
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Records at or above the `1 - contamination` quantile
pub fn global_flags(scores: &[f64], contamination: f64) -> Vec<bool> {
    let cut = quantile(scores, 1.0 - contamination);
    scores.iter().map(|s| *s >= cut).collect()
}

/// Whether a group is large enough for local scoring and flagging
pub fn is_eligible(size: usize, config: &EngineConfig) -> bool {
    size > config.local_min_cluster_size
}

/// Flags for one group's local scores (same order as `scores`)
pub fn group_flags(scores: &[f64], contamination: f64) -> Vec<bool> {
    let n = scores.len();
    let sum: f64 = scores.iter().sum();
    let first = scores.first().copied().unwrap_or(0.0);
    let varies = scores.iter().any(|s| *s != first);
    if sum <= 0.0 || !varies {
        return vec![false; n];
    }

    let cut = quantile(scores, 1.0 - contamination);
    let mut flags: Vec<bool> = scores.iter().map(|s| *s >= cut).collect();

    let min_flags = ((contamination * n as f64).ceil() as usize).max(1);
    if flags.iter().filter(|f| **f).count() < min_flags {
        // stable: equal scores keep row order
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        for &i in order.iter().take(min_flags) {
            flags[i] = true;
        }
    }
    flags
}

/// Local flags for the whole population; noise and small groups stay false
pub fn local_flags(
    scores: &[f64],
    assignment: &ClusterAssignment,
    config: &EngineConfig,
) -> Vec<bool> {
    let mut flags = vec![false; scores.len()];
    for (label, rows) in assignment.groups() {
        if !is_eligible(rows.len(), config) {
            log::debug!("Cluster {} has {} members - not flagged locally", label, rows.len());
            continue;
        }
        let group: Vec<f64> = rows.iter().map(|&r| scores[r]).collect();
        for (&row, flag) in rows.iter().zip(group_flags(&group, config.local_contamination)) {
            flags[row] = flag;
        }
    }
    flags
}

pub fn combined_score(global: f64, local: f64, config: &EngineConfig) -> f64 {
    config.global_weight * global + config.local_weight * local
}

/// Build the results table from the two score vectors
pub fn flag_records(
    global: &[f64],
    local: &[f64],
    assignment: &ClusterAssignment,
    record_ids: &[String],
    config: &EngineConfig,
) -> Vec<AnomalyRecord> {
    let g_flags = global_flags(global, config.global_contamination);
    let l_flags = local_flags(local, assignment, config);

    let records: Vec<AnomalyRecord> = (0..global.len())
        .map(|row| {
            let category = AnomalyCategory::from_flags(g_flags[row], l_flags[row]);
            AnomalyRecord {
                row,
                record_id: record_ids
                    .get(row)
                    .cloned()
                    .unwrap_or_else(|| row.to_string()),
                global_score: global[row],
                cluster: assignment.label(row),
                local_score: local[row],
                category,
                combined_score: combined_score(global[row], local[row], config),
                final_flag: category.is_anomaly(),
            }
        })
        .collect();

    log::info!(
        "Flagged {} of {} records ({} global, {} local)",
        records.iter().filter(|r| r.final_flag).count(),
        records.len(),
        g_flags.iter().filter(|f| **f).count(),
        l_flags.iter().filter(|f| **f).count()
    );
    records
}
