//! Global scoring
//!
//! A record's global score is the fraction of the population whose
//! reconstruction error is at or below its own.

/// Empirical CDF of each error against the sorted population
pub fn ecdf_scores(errors: &[f64]) -> Vec<f64> {
    if errors.is_empty() {
        return Vec::new();
    }

    let mut sorted = errors.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len() as f64;

    errors
        .iter()
        .map(|e| sorted.partition_point(|x| x <= e) as f64 / n)
        .collect()
}
