//! The inference pipeline and the application context around it.

pub mod context;
pub mod metrics;
pub mod predictor;

pub use context::{AnalysisOutcome, AppContext, HealthReport};
pub use metrics::{InferenceMetrics, MetricsRecorder};
pub use predictor::DiagnosticPipeline;
