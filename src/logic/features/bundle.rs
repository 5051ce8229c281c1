//! Feature Bundle - On-disk handoff from the Feature Provider
//!
//! JSON document with the scaled matrices, the field mapping and the
//! presentation ids of the source records (same row order).

use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::mapping::FeatureMapping;
use super::matrix::FeatureMatrix;
use crate::logic::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureBundle {
    /// Main matrix, one inner vec per record
    pub main: Vec<Vec<f64>>,

    /// Conditional matrix; absent means "no conditional fields"
    #[serde(default)]
    pub conditional: Option<Vec<Vec<f64>>>,

    /// Names of the main columns (defaults to `f0..fn`)
    #[serde(default)]
    pub main_columns: Option<Vec<String>>,

    #[serde(default)]
    pub mapping: FeatureMapping,

    /// Record identifiers for presentation (defaults to row index)
    #[serde(default)]
    pub record_ids: Option<Vec<String>>,
}

/// Parts of a bundle ready for a run
#[derive(Debug, Clone)]
pub struct BundleParts {
    pub matrix: FeatureMatrix,
    pub mapping: FeatureMapping,
    pub record_ids: Vec<String>,
}

/// Load bundle from disk
pub fn load_bundle(path: &Path) -> PipelineResult<FeatureBundle> {
    if !path.exists() {
        return Err(PipelineError::Configuration(format!(
            "feature bundle not found: {}",
            path.display()
        )));
    }

    let data = fs::read(path)?;
    let bundle: FeatureBundle = serde_json::from_slice(&data)?;
    log::info!(
        "Loaded feature bundle: {} rows, {} mapped fields",
        bundle.main.len(),
        bundle.mapping.len()
    );
    Ok(bundle)
}

fn to_array(rows: &[Vec<f64>], what: &str) -> PipelineResult<Array2<f64>> {
    let n = rows.len();
    let width = rows.first().map(|r| r.len()).unwrap_or(0);
    if let Some(bad) = rows.iter().position(|r| r.len() != width) {
        return Err(PipelineError::Configuration(format!(
            "{} matrix row {} has {} values, expected {}",
            what,
            bad,
            rows[bad].len(),
            width
        )));
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((n, width), flat)
        .map_err(|e| PipelineError::Configuration(format!("{} matrix: {}", what, e)))
}

impl FeatureBundle {
    pub fn into_parts(self) -> PipelineResult<BundleParts> {
        let main = to_array(&self.main, "main")?;
        let rows = main.nrows();

        let conditional = match &self.conditional {
            Some(c) => to_array(c, "conditional")?,
            None => Array2::zeros((rows, 0)),
        };

        let columns = self
            .main_columns
            .unwrap_or_else(|| (0..main.ncols()).map(|i| format!("f{}", i)).collect());

        let matrix = FeatureMatrix::new(main, conditional, columns)?;

        let record_ids = match self.record_ids {
            Some(ids) if ids.len() == rows => ids,
            Some(ids) => {
                return Err(PipelineError::Configuration(format!(
                    "{} record ids for {} rows",
                    ids.len(),
                    rows
                )))
            }
            None => (0..rows).map(|i| i.to_string()).collect(),
        };

        Ok(BundleParts {
            matrix,
            mapping: self.mapping,
            record_ids,
        })
    }
}
