//! Ordered class label set of a loaded classifier.

use crate::core::errors::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque identifier of a disease or condition category.
pub type ClassLabel = String;

/// The classifier's labels in output-index order.
///
/// The order is fixed when the model is loaded and maps output index `i` to
/// `labels[i]`. It is never re-sorted. A set is never empty and never holds
/// duplicate labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: Vec<ClassLabel>,
}

impl LabelSet {
    /// Validates and wraps an ordered label list.
    pub fn new(labels: Vec<ClassLabel>) -> AnalysisResult<Self> {
        if labels.is_empty() {
            return Err(AnalysisError::invalid_input("label set must not be empty"));
        }
        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if label.trim().is_empty() {
                return Err(AnalysisError::invalid_input("class label must not be blank"));
            }
            if !seen.insert(label.as_str()) {
                return Err(AnalysisError::invalid_input(format!(
                    "duplicate class label '{label}'"
                )));
            }
        }
        Ok(Self { labels })
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at output index 0.
    pub fn first(&self) -> &ClassLabel {
        &self.labels[0]
    }

    /// Label for an output index.
    pub fn get(&self, index: usize) -> Option<&ClassLabel> {
        self.labels.get(index)
    }

    /// Labels in output-index order.
    pub fn iter(&self) -> impl Iterator<Item = &ClassLabel> {
        self.labels.iter()
    }

    pub fn as_slice(&self) -> &[ClassLabel] {
        &self.labels
    }
}

impl<'de> Deserialize<'de> for LabelSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let labels = Vec::<ClassLabel>::deserialize(deserializer)?;
        LabelSet::new(labels).map_err(serde::de::Error::custom)
    }
}
