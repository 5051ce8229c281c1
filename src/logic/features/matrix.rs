//! Feature Matrix - Main/conditional pair for one run
//!
//! Immutable once built. Every row lines up with one source record.

use ndarray::{Array2, Axis};

use crate::logic::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    main: Array2<f64>,
    conditional: Array2<f64>,
    main_columns: Vec<String>,
}

impl FeatureMatrix {
    /// Validate and wrap the provider's matrices.
    ///
    /// An empty conditional matrix (zero columns) is replaced by a single
    /// all-zero column so the model always has a conditional input.
    pub fn new(
        main: Array2<f64>,
        conditional: Array2<f64>,
        main_columns: Vec<String>,
    ) -> PipelineResult<Self> {
        let (rows, cols) = main.dim();
        if rows == 0 {
            return Err(PipelineError::Configuration(
                "main feature matrix has no rows".to_string(),
            ));
        }
        if cols == 0 {
            return Err(PipelineError::Configuration(
                "no numeric main features found".to_string(),
            ));
        }
        if main_columns.len() != cols {
            return Err(PipelineError::Configuration(format!(
                "main matrix has {} columns but {} column names",
                cols,
                main_columns.len()
            )));
        }

        let conditional = if conditional.ncols() == 0 {
            log::info!("No conditional features supplied - using a zero column");
            Array2::zeros((rows, 1))
        } else {
            conditional
        };

        if conditional.nrows() != rows {
            return Err(PipelineError::Configuration(format!(
                "conditional matrix has {} rows, main has {}",
                conditional.nrows(),
                rows
            )));
        }

        if main.iter().chain(conditional.iter()).any(|v| !v.is_finite()) {
            return Err(PipelineError::Configuration(
                "feature matrices contain non-finite values".to_string(),
            ));
        }

        let out_of_range = main
            .iter()
            .chain(conditional.iter())
            .filter(|v| **v < 0.0 || **v > 1.0)
            .count();
        if out_of_range > 0 {
            log::warn!(
                "{} feature values fall outside [0, 1]; upstream scaling may be off",
                out_of_range
            );
        }

        Ok(Self {
            main,
            conditional,
            main_columns,
        })
    }

    /// Build with generated column names (`f0`, `f1`, ...)
    pub fn unnamed(main: Array2<f64>, conditional: Array2<f64>) -> PipelineResult<Self> {
        let columns = (0..main.ncols()).map(|i| format!("f{}", i)).collect();
        Self::new(main, conditional, columns)
    }

    pub fn n_rows(&self) -> usize {
        self.main.nrows()
    }

    pub fn main_dim(&self) -> usize {
        self.main.ncols()
    }

    pub fn conditional_dim(&self) -> usize {
        self.conditional.ncols()
    }

    pub fn main(&self) -> &Array2<f64> {
        &self.main
    }

    pub fn conditional(&self) -> &Array2<f64> {
        &self.conditional
    }

    pub fn main_columns(&self) -> &[String] {
        &self.main_columns
    }

    /// Copy out the main rows of one peer group
    pub fn main_rows(&self, rows: &[usize]) -> Array2<f64> {
        self.main.select(Axis(0), rows)
    }
}
