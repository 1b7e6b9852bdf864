//! Prediction result types.

use super::labels::ClassLabel;
use serde::{Deserialize, Serialize};

/// One class with its confidence, expressed as a percentage in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionEntry {
    pub label: ClassLabel,
    pub confidence: f64,
}

impl PredictionEntry {
    pub fn new(label: impl Into<ClassLabel>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Ranked classification of one image.
///
/// `ranked` holds every class, descending by confidence; equal confidences
/// keep the classifier's label order. The top fields repeat the first entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub top_label: ClassLabel,
    pub top_confidence: f64,
    pub ranked: Vec<PredictionEntry>,
}

impl PredictionResult {
    /// Sum of all confidences; 100 up to rounding for a valid result.
    pub fn total_confidence(&self) -> f64 {
        self.ranked.iter().map(|e| e.confidence).sum()
    }

    /// Confidence assigned to `label`, if the label is part of the result.
    pub fn confidence_of(&self, label: &str) -> Option<f64> {
        self.ranked
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.confidence)
    }
}
