//! Running counters for the inference path.
//!
//! `InferenceMetrics` is a snapshot of how many predictions the process has
//! served and how long they took; `MetricsRecorder` updates it from many
//! request threads at once.

use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Snapshot of the inference counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InferenceMetrics {
    /// Prediction attempts, failed ones included.
    pub total_predictions: u64,
    pub successful_predictions: u64,
    pub failed_predictions: u64,
    /// Mean wall time of successful predictions in milliseconds.
    pub average_latency_ms: f64,
}

impl InferenceMetrics {
    /// Share of successful attempts as a percentage (0.0 to 100.0).
    pub fn success_rate(&self) -> f64 {
        if self.total_predictions == 0 {
            0.0
        } else {
            (self.successful_predictions as f64 / self.total_predictions as f64) * 100.0
        }
    }

    /// Predictions per second at the average latency.
    pub fn throughput(&self) -> f64 {
        if self.average_latency_ms == 0.0 {
            0.0
        } else {
            1000.0 / self.average_latency_ms
        }
    }
}

impl fmt::Display for InferenceMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} predictions ({} ok, {} failed, {:.1}% success), {:.2} ms average",
            self.total_predictions,
            self.successful_predictions,
            self.failed_predictions,
            self.success_rate(),
            self.average_latency_ms
        )
    }
}

/// Thread-safe owner of an [`InferenceMetrics`].
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    metrics: Mutex<InferenceMetrics>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> InferenceMetrics {
        self.lock().clone()
    }

    /// Records one successful prediction that took `latency_ms`.
    pub fn record_success(&self, latency_ms: f64) {
        let mut metrics = self.lock();
        let previous = metrics.successful_predictions as f64;
        metrics.total_predictions += 1;
        metrics.successful_predictions += 1;
        metrics.average_latency_ms =
            (metrics.average_latency_ms * previous + latency_ms) / (previous + 1.0);
    }

    pub fn record_failure(&self) {
        let mut metrics = self.lock();
        metrics.total_predictions += 1;
        metrics.failed_predictions += 1;
    }

    pub fn reset(&self) {
        *self.lock() = InferenceMetrics::default();
    }

    // Counters stay meaningful even if a holder panicked mid-update.
    fn lock(&self) -> MutexGuard<'_, InferenceMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_handles_zero_predictions() {
        assert_eq!(InferenceMetrics::default().success_rate(), 0.0);
        assert_eq!(InferenceMetrics::default().throughput(), 0.0);
    }

    #[test]
    fn recorder_tracks_counts_and_average() {
        let recorder = MetricsRecorder::new();
        recorder.record_success(100.0);
        recorder.record_failure();
        recorder.record_success(200.0);

        let metrics = recorder.snapshot();
        assert_eq!(metrics.total_predictions, 3);
        assert_eq!(metrics.successful_predictions, 2);
        assert_eq!(metrics.failed_predictions, 1);
        assert!((metrics.average_latency_ms - 150.0).abs() < 1e-9);
        assert!((metrics.throughput() - 1000.0 / 150.0).abs() < 1e-9);
    }

    #[test]
    fn display_formats_metrics() {
        let metrics = InferenceMetrics {
            total_predictions: 10,
            successful_predictions: 8,
            failed_predictions: 2,
            average_latency_ms: 12.5,
        };
        assert_eq!(
            metrics.to_string(),
            "10 predictions (8 ok, 2 failed, 80.0% success), 12.50 ms average"
        );
    }

    #[test]
    fn recorder_resets() {
        let recorder = MetricsRecorder::new();
        recorder.record_success(5.0);
        recorder.reset();
        assert_eq!(recorder.snapshot(), InferenceMetrics::default());
    }
}
