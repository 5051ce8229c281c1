//! Feature Mapping - original field → derived numeric columns
//!
//! Built once by the provider, read-only for the run. Only the
//! explainability engine consumes it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMapping {
    fields: BTreeMap<String, Vec<String>>,
}

impl FeatureMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the derived columns an original field expanded into
    pub fn insert(&mut self, field: impl Into<String>, columns: Vec<String>) {
        self.fields.insert(field.into(), columns);
    }

    /// Builder form of `insert`
    pub fn with(mut self, field: &str, columns: &[&str]) -> Self {
        self.insert(field, columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
