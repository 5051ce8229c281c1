//! Local Module - Peer Group Ensemble Detector
//!
//! Scores each record against its own peer group only. Three base detectors
//! sit behind `BaseDetector`; any of them may fail on a given group without
//! failing the run.

pub mod ensemble;
pub mod isolation;
pub mod lof;
pub mod normalize;
pub mod svm;
pub mod types;

#[cfg(test)]
mod tests;

pub use ensemble::{combine, LocalEnsemble};
pub use isolation::IsolationForest;
pub use lof::LocalOutlierFactor;
pub use svm::OneClassSvm;
pub use types::{BaseDetector, DetectorError, LocalDetection};
