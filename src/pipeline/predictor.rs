//! Image-to-prediction pipeline.

use super::metrics::{InferenceMetrics, MetricsRecorder};
use crate::core::errors::AnalysisResult;
use crate::domain::{LabelSet, PredictionResult};
use crate::models::ClassifierEngine;
use crate::processors::{PixelBuffer, Preprocessor, Ranker, decode_payload};
use std::time::Instant;
use tracing::{debug, warn};

/// Decode, preprocess, classify, rank.
///
/// Holds the one loaded [`ClassifierEngine`]. Every stage is a pure function
/// of its input, so two calls with the same payload return the same result.
/// The pipeline is shared between request threads by reference.
#[derive(Debug)]
pub struct DiagnosticPipeline {
    engine: ClassifierEngine,
    preprocessor: Preprocessor,
    ranker: Ranker,
    metrics: MetricsRecorder,
}

impl DiagnosticPipeline {
    pub fn new(engine: ClassifierEngine) -> Self {
        Self {
            engine,
            preprocessor: Preprocessor::new(),
            ranker: Ranker::new(),
            metrics: MetricsRecorder::new(),
        }
    }

    /// Runs the full pipeline on a transport-encoded image.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::Decode`](crate::core::errors::AnalysisError::Decode)
    /// for a malformed payload, or an inference error from the classifier.
    pub fn predict(&self, payload: &str) -> AnalysisResult<PredictionResult> {
        let started = Instant::now();
        let outcome = decode_payload(payload).and_then(|image| self.classify(&image));
        self.observe(&outcome, started);
        outcome
    }

    /// Runs the pipeline on an already decoded image.
    pub fn predict_image(&self, image: &PixelBuffer) -> AnalysisResult<PredictionResult> {
        let started = Instant::now();
        let outcome = self.classify(image);
        self.observe(&outcome, started);
        outcome
    }

    fn classify(&self, image: &PixelBuffer) -> AnalysisResult<PredictionResult> {
        let input = self.preprocessor.preprocess(image);
        let probabilities = self.engine.forward(&input)?;
        Ok(self
            .ranker
            .rank(probabilities.as_slice(), self.engine.labels()))
    }

    fn observe(&self, outcome: &AnalysisResult<PredictionResult>, started: Instant) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match outcome {
            Ok(result) => {
                self.metrics.record_success(elapsed_ms);
                debug!(
                    top_label = %result.top_label,
                    confidence = result.top_confidence,
                    elapsed_ms,
                    "prediction complete"
                );
            }
            Err(e) => {
                self.metrics.record_failure();
                warn!(kind = e.kind(), error = %e.report(), "prediction failed");
            }
        }
    }

    pub fn engine(&self) -> &ClassifierEngine {
        &self.engine
    }

    pub fn labels(&self) -> &LabelSet {
        self.engine.labels()
    }

    /// Device the classifier runs on.
    pub fn device(&self) -> &str {
        self.engine.device()
    }

    pub fn metrics(&self) -> InferenceMetrics {
        self.metrics.snapshot()
    }
}
