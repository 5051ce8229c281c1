//! Logic Module - Detection Engines
//!
//! Each phase of a run lives in its own module:
//! - `features/` - Feature matrices, field mapping, column layout
//! - `model/` - Conditional autoencoder (train, search, score, storage)
//! - `clustering/` - Density-based peer groups over the latent space
//! - `local/` - Per-peer-group outlier ensemble
//! - `flagging/` - Exact-quantile flags and combined score
//! - `explain/` - Z-score attribution and root-cause narrative
//! - `report/` - Run output files

pub mod config;
pub mod error;

pub mod features;
pub mod model;
pub mod clustering;
pub mod local;
pub mod flagging;
pub mod explain;
pub mod report;

pub mod pipeline;
