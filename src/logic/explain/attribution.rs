//! Z-score attribution
//!
//! |z| of every derived column against a reference population, folded per
//! original field by maximum, strongest fields first.

use ndarray::{Array2, ArrayView1, Axis};

use super::types::FeatureAttribution;

/// Column mean and sample standard deviation (zero std replaced by 1)
#[derive(Debug, Clone)]
pub struct ColumnStats {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl ColumnStats {
    /// `None` with fewer than two reference rows
    pub fn of(reference: &Array2<f64>) -> Option<Self> {
        if reference.nrows() < 2 {
            return None;
        }
        let mean: Vec<f64> = reference.mean_axis(Axis(0))?.to_vec();
        let std = reference
            .std_axis(Axis(0), 1.0)
            .iter()
            .map(|s| if *s > 0.0 && s.is_finite() { *s } else { 1.0 })
            .collect();
        Some(Self { mean, std })
    }

    pub fn z_scores(&self, row: ArrayView1<f64>) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(x, (m, s))| ((x - m) / s).abs())
            .collect()
    }
}

/// Fold per-column |z| into per-field attributions, top `top` by z
pub fn attribute(z_scores: &[f64], fields: &[String], top: usize) -> Vec<FeatureAttribution> {
    let mut per_field: Vec<FeatureAttribution> = Vec::new();
    for (z, field) in z_scores.iter().zip(fields.iter()) {
        if !z.is_finite() {
            continue;
        }
        match per_field.iter_mut().find(|a| &a.field == field) {
            Some(existing) => existing.z_score = existing.z_score.max(*z),
            None => per_field.push(FeatureAttribution {
                field: field.clone(),
                z_score: *z,
            }),
        }
    }

    // stable: equal z keeps first-seen field order
    per_field.sort_by(|a, b| b.z_score.total_cmp(&a.z_score));
    per_field.truncate(top);
    per_field
}

/// `"<score> (<field>: <z>, ...)"` with the first `inline` attributions
pub fn inline_text(score: f64, features: &[FeatureAttribution], inline: usize) -> String {
    let shown: Vec<String> = features
        .iter()
        .take(inline)
        .map(|f| format!("{}: {:.2}", f.field, f.z_score))
        .collect();
    format!("{:.3} ({})", score, shown.join(", "))
}
