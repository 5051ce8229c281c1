//! Run-level tests

use super::fixtures::{claims, quick_config, small_params};
use super::*;
use crate::logic::clustering::ClusterAssignment;
use crate::logic::flagging::AnomalyCategory;

fn run_once() -> (RunOutput, FeatureMatrix, FeatureMapping, Vec<String>) {
    let (matrix, mapping, ids) = claims(40, 4, 7);
    let output = AnomalyPipeline::new(quick_config())
        .run(&matrix, &mapping, &ids, ModelSource::Train(Some(small_params())))
        .unwrap();
    (output, matrix, mapping, ids)
}

#[test]
fn test_run_scores_every_record() {
    let (output, matrix, _, ids) = run_once();
    assert_eq!(output.records.len(), matrix.n_rows());

    for (i, r) in output.records.iter().enumerate() {
        assert_eq!(r.row, i);
        assert_eq!(r.record_id, ids[i]);
        assert!((0.0..=1.0).contains(&r.global_score));
        assert!((0.0..=1.0).contains(&r.local_score));
        assert!((r.combined_score - (0.6 * r.global_score + 0.4 * r.local_score)).abs() < 1e-12);
        assert_eq!(r.final_flag, r.category != AnomalyCategory::NotAnomaly);
    }
}

#[test]
fn test_flagged_table_sorted_and_explained() {
    let (output, _, _, _) = run_once();
    assert!(!output.flagged.is_empty());
    assert!(output
        .flagged
        .windows(2)
        .all(|w| w[0].record.combined_score >= w[1].record.combined_score));
    for row in &output.flagged {
        assert!(row.record.final_flag);
        if row.record.category.has_global() {
            assert!(!row.global_explanation.is_empty());
        } else {
            assert!(row.global_explanation.is_empty());
        }
    }
    assert!(output.explanations.root_cause.starts_with("1. AI analysis has identified"));
}

#[test]
fn test_summary_matches_records() {
    let (output, _, _, _) = run_once();
    let s = &output.summary;
    assert_eq!(s.total_records, output.records.len());
    assert_eq!(s.total_flagged, output.flagged.len());
    assert_eq!(
        s.categories.flagged() + s.categories.not_anomaly,
        s.total_records
    );
    assert!((s.detection_rate - s.total_flagged as f64 / s.total_records as f64).abs() < 1e-12);
    assert!(s.trained_this_run);
    assert_eq!(s.model_id, output.model.model_id);
}

#[test]
fn test_pretrained_model_reproduces_global_scores() {
    let (first, matrix, mapping, ids) = run_once();
    let second = AnomalyPipeline::new(quick_config())
        .run(&matrix, &mapping, &ids, ModelSource::Pretrained(first.model.clone()))
        .unwrap();

    assert!(!second.summary.trained_this_run);
    assert_eq!(second.summary.model_id, first.model.model_id);
    for (a, b) in first.records.iter().zip(second.records.iter()) {
        assert_eq!(a.global_score, b.global_score);
    }
}

#[test]
fn test_record_id_mismatch_fails_at_init() {
    let (matrix, mapping, mut ids) = claims(20, 0, 3);
    ids.pop();
    let err = AnomalyPipeline::new(quick_config())
        .run(&matrix, &mapping, &ids, ModelSource::Train(Some(small_params())))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)));
    assert_eq!(err.phase(), RunPhase::Init);
}

#[test]
fn test_invalid_config_fails_before_training() {
    let (matrix, mapping, ids) = claims(20, 0, 3);
    let config = EngineConfig {
        local_contamination: 0.9,
        ..quick_config()
    };
    let err = AnomalyPipeline::new(config)
        .run(&matrix, &mapping, &ids, ModelSource::Train(Some(small_params())))
        .unwrap_err();
    assert_eq!(err.phase(), RunPhase::Init);
}

#[test]
fn test_small_groups_keep_zero_local_scores() {
    let (matrix, _, _) = claims(20, 0, 5);
    let mut labels = vec![NOISE_LABEL; matrix.n_rows()];
    for label in labels.iter_mut().take(5) {
        *label = 0;
    }
    for label in labels.iter_mut().skip(20).take(12) {
        *label = 1;
    }
    let assignment = ClusterAssignment { labels };

    let local = score_locally(&matrix, &assignment, &quick_config());
    assert_eq!(local.scored, 1);
    assert_eq!(local.skipped, 1);
    assert!(local.scores[..20].iter().all(|s| *s == 0.0));
    assert!(local.scores[32..].iter().all(|s| *s == 0.0));
    assert!(local.scores[20..32].iter().any(|s| *s > 0.0));
}

#[test]
fn test_new_pipeline_starts_in_init() {
    let pipeline = AnomalyPipeline::new(EngineConfig::default());
    assert_eq!(pipeline.phase(), RunPhase::Init);
    assert_eq!(pipeline.config().global_contamination, 0.01);
}
