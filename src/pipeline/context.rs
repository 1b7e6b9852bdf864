//! Application-scoped context shared by every request.

use super::metrics::InferenceMetrics;
use super::predictor::DiagnosticPipeline;
use crate::core::errors::{AnalysisError, AnalysisResult};
use crate::domain::{AnalysisRecord, AnalysisStats, PredictionResult};
use crate::store::{AnalysisHistory, AnalysisStore};
use crate::utils::black_probe_payload;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Result of one analyze request.
///
/// The prediction is always present. `saved` holds the stored identifier or
/// the reason the record could not be written, so callers can tell
/// "prediction failed" apart from "prediction succeeded but was not saved".
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub result: PredictionResult,
    pub saved: Result<Uuid, AnalysisError>,
}

impl AnalysisOutcome {
    pub fn analysis_id(&self) -> Option<Uuid> {
        self.saved.as_ref().ok().copied()
    }
}

/// What the health probe observed.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub device: String,
    pub probe: PredictionResult,
    pub metrics: InferenceMetrics,
}

/// The loaded model and the analysis store, built once at start-up.
///
/// Cloning is cheap and shares both.
#[derive(Debug, Clone)]
pub struct AppContext {
    pipeline: Arc<DiagnosticPipeline>,
    history: AnalysisHistory,
}

impl AppContext {
    pub fn new(pipeline: DiagnosticPipeline, store: Arc<dyn AnalysisStore>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            history: AnalysisHistory::new(store),
        }
    }

    /// Sets how many records a history query returns.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = self.history.with_limit(limit);
        self
    }

    pub fn pipeline(&self) -> &DiagnosticPipeline {
        &self.pipeline
    }

    pub fn history(&self) -> &AnalysisHistory {
        &self.history
    }

    /// Classifies `payload` and records the result for `user_id`.
    ///
    /// # Errors
    ///
    /// Only decode and inference failures are returned as `Err`. A store
    /// failure is reported through [`AnalysisOutcome::saved`].
    pub fn analyze(&self, payload: &str, user_id: &str, notes: &str) -> AnalysisResult<AnalysisOutcome> {
        let result = self.pipeline.predict(payload)?;
        let saved = self.history.record(user_id, notes, &result);
        match &saved {
            Ok(id) => info!(analysis_id = %id, user_id, top_label = %result.top_label, "analysis stored"),
            Err(e) => error!(user_id, error = %e.report(), "prediction not stored"),
        }
        Ok(AnalysisOutcome { result, saved })
    }

    /// Newest records of `user_id`.
    pub fn results_for(&self, user_id: &str) -> AnalysisResult<Vec<AnalysisRecord>> {
        self.history.list_for(user_id)
    }

    pub fn stats_for(&self, user_id: &str, now: DateTime<Utc>) -> AnalysisResult<AnalysisStats> {
        self.history.stats_for(user_id, now)
    }

    /// Pushes a synthetic black image through the whole pipeline.
    pub fn health(&self) -> AnalysisResult<HealthReport> {
        let payload = black_probe_payload()?;
        let probe = self.pipeline.predict(&payload)?;
        Ok(HealthReport {
            device: self.pipeline.device().to_string(),
            probe,
            metrics: self.pipeline.metrics(),
        })
    }
}
