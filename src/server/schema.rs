//! Request and response bodies of the HTTP API.

use crate::core::errors::{AnalysisError, AnalysisResult};
use crate::domain::{AnalysisRecord, AnalysisStats, PredictionResult};
use crate::pipeline::{AnalysisOutcome, InferenceMetrics};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64 image, optionally with a data-URL header.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// An [`AnalyzeRequest`] whose required fields are present.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidAnalyzeRequest {
    pub image: String,
    pub user_id: String,
    pub notes: String,
}

impl AnalyzeRequest {
    pub fn validate(self) -> AnalysisResult<ValidAnalyzeRequest> {
        let image = self
            .image
            .filter(|image| !image.trim().is_empty())
            .ok_or_else(|| AnalysisError::invalid_input("No image data provided"))?;
        let user_id = required_user(self.user_id)?;
        Ok(ValidAnalyzeRequest {
            image,
            user_id,
            notes: self.notes.unwrap_or_default(),
        })
    }
}

/// Query string of `GET /api/results`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultsQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

impl ResultsQuery {
    pub fn validate(self) -> AnalysisResult<String> {
        required_user(self.user_id)
    }
}

fn required_user(user_id: Option<String>) -> AnalysisResult<String> {
    user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AnalysisError::invalid_input("user_id is required"))
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// `null` when the prediction could not be stored.
    pub analysis_id: Option<Uuid>,
    pub result: PredictionResult,
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

impl From<AnalysisOutcome> for AnalyzeResponse {
    fn from(outcome: AnalysisOutcome) -> Self {
        let (analysis_id, persistence_error) = match outcome.saved {
            Ok(id) => (Some(id), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            analysis_id,
            saved: analysis_id.is_some(),
            result: outcome.result,
            persistence_error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub analyses: Vec<AnalysisRecord>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_analyses: u64,
    pub month_analyses: u64,
    pub week_analyses: u64,
}

impl From<AnalysisStats> for StatsResponse {
    fn from(stats: AnalysisStats) -> Self {
        Self {
            total_analyses: stats.total,
            month_analyses: stats.this_month,
            week_analyses: stats.this_week,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_prediction_status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<InferenceMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}
