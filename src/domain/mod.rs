//! Domain types: labels, predictions, and stored analyses.

pub mod analysis;
pub mod labels;
pub mod prediction;

pub use analysis::{AnalysisRecord, AnalysisStats};
pub use labels::{ClassLabel, LabelSet};
pub use prediction::{PredictionEntry, PredictionResult};
