//! Pipeline - One anomaly-detection run
//!
//! Phases run strictly in order and each one finishes before the next reads
//! its output:
//!
//! ```text
//! Init → GlobalScoring → Clustering → LocalScoring → Flagging → Terminal
//! ```
//!
//! GlobalScoring and Clustering failures abort the run. A peer group whose
//! local scoring goes wrong keeps zero local scores and the run carries on.

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
mod tests;

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::NOISE_LABEL;
use crate::logic::clustering::{self, ClusterAssignment};
use crate::logic::config::EngineConfig;
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::explain::{self, ExplanationReport};
use crate::logic::features::{BundleParts, FeatureMapping, FeatureMatrix};
use crate::logic::flagging::{self, AnomalyRecord};
use crate::logic::local::LocalEnsemble;
use crate::logic::model::{self, HyperParams, TrainedModel};
use crate::logic::report::{CategoryCounts, FlaggedRow, RunSummary};

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Init,
    GlobalScoring,
    Clustering,
    LocalScoring,
    Flagging,
    Terminal,
}

/// Where the global model comes from
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Train this run; `None` searches the default grid first
    Train(Option<HyperParams>),
    /// Previously trained model, reused as-is
    Pretrained(TrainedModel),
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Every record, row order
    pub records: Vec<AnomalyRecord>,
    /// Flagged records, combined score descending
    pub flagged: Vec<FlaggedRow>,
    pub explanations: ExplanationReport,
    pub summary: RunSummary,
    pub model: TrainedModel,
}

/// Local scores for the whole population plus bookkeeping
#[derive(Debug, Clone)]
struct LocalPhase {
    scores: Vec<f64>,
    scored: usize,
    skipped: usize,
    degraded: usize,
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct AnomalyPipeline {
    config: EngineConfig,
    phase: RunPhase,
}

impl AnomalyPipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            phase: RunPhase::Init,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Run on a loaded feature bundle
    pub fn run_bundle(self, parts: &BundleParts, source: ModelSource) -> PipelineResult<RunOutput> {
        self.run(&parts.matrix, &parts.mapping, &parts.record_ids, source)
    }

    /// Execute every phase. Consumes the pipeline: a run is not re-entrant.
    pub fn run(
        mut self,
        matrix: &FeatureMatrix,
        mapping: &FeatureMapping,
        record_ids: &[String],
        source: ModelSource,
    ) -> PipelineResult<RunOutput> {
        let result = self.execute(matrix, mapping, record_ids, source);
        if let Err(e) = &result {
            log::error!("Run failed during {:?}: {}", e.phase(), e);
        }
        result
    }

    fn enter(&mut self, phase: RunPhase) {
        log::info!("Phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn execute(
        &mut self,
        matrix: &FeatureMatrix,
        mapping: &FeatureMapping,
        record_ids: &[String],
        source: ModelSource,
    ) -> PipelineResult<RunOutput> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        let n = matrix.n_rows();

        // === INIT ===
        self.config.validate()?;
        if record_ids.len() != n {
            return Err(PipelineError::Configuration(format!(
                "{} record ids for {} rows",
                record_ids.len(),
                n
            )));
        }
        log::info!(
            "Run {}: {} records, {} main / {} conditional columns",
            run_id,
            n,
            matrix.main_dim(),
            matrix.conditional_dim()
        );

        // === GLOBAL SCORING ===
        self.enter(RunPhase::GlobalScoring);
        let (trained, trained_this_run) = match source {
            ModelSource::Train(hyperparams) => (model::train(matrix, hyperparams, &self.config)?, true),
            ModelSource::Pretrained(m) => {
                log::info!("Reusing model {} ({})", m.model_id, m.hyperparams);
                (m, false)
            }
        };
        let global = model::score(&trained, matrix)?;

        // === CLUSTERING ===
        self.enter(RunPhase::Clustering);
        let assignment = clustering::partition(&global.latent, &self.config)?;

        // === LOCAL SCORING ===
        self.enter(RunPhase::LocalScoring);
        let local = score_locally(matrix, &assignment, &self.config);
        log::info!(
            "Local scoring: {} groups scored, {} skipped, {} detector failures",
            local.scored,
            local.skipped,
            local.degraded
        );

        // === FLAGGING ===
        self.enter(RunPhase::Flagging);
        let records = flagging::flag_records(
            &global.scores,
            &local.scores,
            &assignment,
            record_ids,
            &self.config,
        );

        // === TERMINAL ===
        self.enter(RunPhase::Terminal);
        let explanations = explain::explain(&records, matrix, &assignment, mapping, &self.config);
        let flagged = flagged_table(&records, &explanations);

        let categories = CategoryCounts::tally(&records);
        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            total_records: n,
            total_flagged: categories.flagged(),
            detection_rate: categories.flagged() as f64 / n as f64,
            categories,
            clusters_found: assignment.n_clusters(),
            noise_records: assignment.noise_count(),
            clusters_scored: local.scored,
            clusters_skipped: local.skipped,
            degraded_detectors: local.degraded,
            model_id: trained.model_id,
            hyperparams: trained.hyperparams,
            best_val_loss: trained.best_val_loss,
            trained_this_run,
        };

        log::info!(
            "Run {} complete: {}/{} flagged ({:.2}%) - both={} global={} local={}",
            run_id,
            summary.total_flagged,
            n,
            summary.detection_rate * 100.0,
            categories.both,
            categories.global,
            categories.local
        );

        Ok(RunOutput {
            records,
            flagged,
            explanations,
            summary,
            model: trained,
        })
    }
}

// ============================================================================
// PHASE HELPERS
// ============================================================================

/// Run the local ensemble on every eligible peer group.
///
/// Groups are independent and scored in parallel. Each group's scores are
/// written into the shared buffer under a single lock, so row ranges from
/// different groups never interleave.
fn score_locally(
    matrix: &FeatureMatrix,
    assignment: &ClusterAssignment,
    config: &EngineConfig,
) -> LocalPhase {
    let n = matrix.n_rows();
    let mut eligible: Vec<(i32, Vec<usize>)> = Vec::new();
    let mut skipped = 0;
    for (label, members) in assignment.groups() {
        if label == NOISE_LABEL {
            continue;
        }
        if flagging::is_eligible(members.len(), config) {
            eligible.push((label, members));
        } else {
            log::warn!(
                "Peer group {} has {} members - skipping local scoring",
                label,
                members.len()
            );
            skipped += 1;
        }
    }

    let buffer = Mutex::new(vec![0.0; n]);
    let degraded: usize = eligible
        .par_iter()
        .map(|(label, members)| {
            let rows = matrix.main_rows(members);
            let seed = config.random_state.wrapping_add(*label as u64);
            let detection = LocalEnsemble::for_group(members.len(), config, seed).detect(&rows);

            let valid = detection.scores.len() == members.len()
                && detection.scores.iter().all(|s| s.is_finite() && (0.0..=1.0).contains(s));
            if !valid {
                log::warn!("Peer group {} produced unusable local scores - keeping zeros", label);
                return detection.failed.len();
            }

            log::debug!(
                "Peer group {}: {} members, failed detectors {:?}",
                label,
                members.len(),
                detection.failed
            );

            let mut out = buffer.lock();
            for (row, score) in members.iter().zip(detection.scores.iter()) {
                out[*row] = *score;
            }
            detection.failed.len()
        })
        .sum();

    LocalPhase {
        scores: buffer.into_inner(),
        scored: eligible.len(),
        skipped,
        degraded,
    }
}

/// Flagged rows sorted by combined score, highest first
fn flagged_table(records: &[AnomalyRecord], explanations: &ExplanationReport) -> Vec<FlaggedRow> {
    let by_row: HashMap<usize, &explain::RecordExplanation> =
        explanations.explanations.iter().map(|e| (e.row, e)).collect();

    let mut flagged: Vec<&AnomalyRecord> = records.iter().filter(|r| r.final_flag).collect();
    flagged.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));

    flagged
        .into_iter()
        .map(|r| FlaggedRow::new(r.clone(), by_row.get(&r.row).copied()))
        .collect()
}
