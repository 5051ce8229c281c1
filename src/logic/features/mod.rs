//! Features Module - Feature Provider contract
//!
//! The upstream provider hands over two row-aligned matrices scaled to [0,1]
//! and a field mapping. Nothing here encodes or scales; it only validates and
//! carries the data through a run.

pub mod layout;
pub mod matrix;
pub mod mapping;
pub mod bundle;


// Re-export common types
pub use bundle::{load_bundle, BundleParts, FeatureBundle};
pub use layout::{LayoutInfo, LAYOUT_VERSION};
pub use mapping::FeatureMapping;
pub use matrix::FeatureMatrix;
