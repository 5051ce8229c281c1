//! Feature Layout - Column schema fingerprint
//!
//! A trained model is only valid for the exact column list it was trained on.
//! The layout hash is stored with every persisted model and checked before
//! scoring.
//!
//! ## Rules:
//! 1. Add column → hash changes
//! 2. Change order → hash changes
//! 3. Rename column → hash changes

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::logic::error::{PipelineError, PipelineResult};

/// Current layout format version
/// MUST be incremented when the hashing scheme changes
pub const LAYOUT_VERSION: u8 = 1;

/// Compute CRC32 hash of an ordered column list
pub fn compute_layout_hash(columns: &[String]) -> u32 {
    let mut hasher = Hasher::new();

    // Include version in hash
    hasher.update(&[LAYOUT_VERSION]);

    for name in columns {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Layout information stored alongside a trained model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn of(columns: &[String]) -> Self {
        Self {
            version: LAYOUT_VERSION,
            hash: compute_layout_hash(columns),
            feature_count: columns.len(),
            feature_names: columns.to_vec(),
        }
    }

    /// Validate that incoming columns match this layout
    pub fn validate(&self, columns: &[String]) -> PipelineResult<()> {
        let actual_hash = compute_layout_hash(columns);
        if self.version != LAYOUT_VERSION || self.hash != actual_hash {
            return Err(PipelineError::LayoutMismatch {
                expected_version: self.version,
                expected_hash: self.hash,
                actual_version: LAYOUT_VERSION,
                actual_hash,
            });
        }
        Ok(())
    }
}
