//! Claim Anomaly Core
//!
//! Flags anomalous healthcare claims by combining a conditional autoencoder
//! (global signal) with per-peer-group outlier ensembles (local signal), and
//! explains every flag in terms of the original claim fields.
//!
//! ```text
//! features ──► model (train/score) ──► clustering ──► local ensemble
//!                    │                                      │
//!                    └──────────────► flagging ◄────────────┘
//!                                        │
//!                                     explain ──► report
//! ```

pub mod constants;
pub mod logic;

pub use logic::config::EngineConfig;
pub use logic::error::{PipelineError, PipelineResult};
pub use logic::features::{FeatureBundle, FeatureMapping, FeatureMatrix};
pub use logic::pipeline::{AnomalyPipeline, ModelSource, RunOutput, RunPhase};
