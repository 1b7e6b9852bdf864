//! Probability vector to ranked prediction.

use crate::domain::{LabelSet, PredictionEntry, PredictionResult};
use std::cmp::Ordering;

/// Turns class probabilities into a [`PredictionResult`].
///
/// Every class is kept. Probabilities become percentages, entries are sorted
/// by descending confidence with a stable sort so equal confidences keep the
/// label-set order, and the first entry becomes the top prediction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker;

impl Ranker {
    pub fn new() -> Self {
        Self
    }

    /// Ranks `probabilities`, where index `i` belongs to `labels.get(i)`.
    ///
    /// Both sequences are expected to have the same length; the classifier
    /// checks this when the model is loaded.
    pub fn rank(&self, probabilities: &[f64], labels: &LabelSet) -> PredictionResult {
        debug_assert_eq!(probabilities.len(), labels.len());

        let mut ranked: Vec<PredictionEntry> = labels
            .iter()
            .zip(probabilities)
            .map(|(label, &p)| PredictionEntry::new(label.clone(), p * 100.0))
            .collect();

        // `sort_by` is stable: ties stay in label-set order.
        ranked.sort_by(|a, b| descending(a.confidence, b.confidence));

        let (top_label, top_confidence) = match ranked.first() {
            Some(top) => (top.label.clone(), top.confidence),
            None => (labels.first().clone(), 0.0),
        };

        PredictionResult {
            top_label,
            top_confidence,
            ranked,
        }
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
