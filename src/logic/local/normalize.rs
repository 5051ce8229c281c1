//! Score normalization shared by the base detectors

use super::types::DetectorError;

/// Rescale to [0,1]. A constant vector maps to all zeros.
pub fn min_max(values: &[f64], detector: &'static str) -> Result<Vec<f64>, DetectorError> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(DetectorError::NonFinite { detector });
    }

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if values.is_empty() || range <= 0.0 {
        return Ok(vec![0.0; values.len()]);
    }

    Ok(values
        .iter()
        .map(|v| ((v - min) / range).clamp(0.0, 1.0))
        .collect())
}

/// Rescale so that the smallest input maps to 1 and the largest to 0
pub fn inverted_min_max(values: &[f64], detector: &'static str) -> Result<Vec<f64>, DetectorError> {
    let negated: Vec<f64> = values.iter().map(|v| -v).collect();
    min_max(&negated, detector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max_range() {
        let out = min_max(&[2.0, 4.0, 3.0], "t").unwrap();
        assert_eq!(out, vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_constant_is_zero() {
        assert_eq!(min_max(&[0.7, 0.7], "t").unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_inverted() {
        let out = inverted_min_max(&[2.0, 4.0, 3.0], "t").unwrap();
        assert_eq!(out, vec![1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(min_max(&[1.0, f64::NAN], "t").is_err());
    }
}
