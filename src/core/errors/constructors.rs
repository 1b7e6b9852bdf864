//! Error constructor helpers.
//!
//! These keep call sites short and make sure every error carries the same
//! context fields regardless of where it is raised.

use super::types::{AnalysisError, ProcessingStage, SimpleError};

impl AnalysisError {
    /// Creates a model loading error.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Bundle directory or model file that failed.
    /// * `reason` - What went wrong.
    /// * `suggestion` - Optional fix shown to the operator.
    /// * `source` - Optional underlying error.
    pub fn model_load_error(
        model_path: impl AsRef<std::path::Path>,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        let suggestion = suggestion
            .map(|s| format!("; suggested fix: {}", s))
            .unwrap_or_default();
        Self::ModelLoad {
            model_path: model_path.as_ref().display().to_string(),
            reason: reason.into(),
            suggestion,
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates a model loading error without an underlying cause.
    pub fn model_load_message(
        model_path: impl AsRef<std::path::Path>,
        reason: impl Into<String>,
        suggestion: Option<&str>,
    ) -> Self {
        Self::model_load_error(model_path, reason, suggestion, None::<SimpleError>)
    }

    /// Creates an inference error for the given stage.
    pub fn inference_error(
        stage: ProcessingStage,
        model_name: &str,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            stage,
            model_name: model_name.to_string(),
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a persistence error for the named store operation.
    pub fn persistence_error(
        operation: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Persistence {
            operation: operation.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
