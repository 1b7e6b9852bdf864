//! Forward-pass backends for the classifier.

use crate::core::errors::AnalysisResult;
use crate::core::inference::OrtInfer;
use crate::core::tensor::{Tensor2D, Tensor4D};

/// Executes the classifier graph.
///
/// Implementations hold read-only weights and must be safe to call from many
/// threads at once. `forward_batch` maps a `[batch, 3, 224, 224]` tensor to
/// `[batch, classes]` scores in evaluation mode.
pub trait ClassifierBackend: Send + Sync + std::fmt::Debug {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Device the computation runs on, e.g. `cpu` or `cuda`.
    fn device(&self) -> &str;

    /// Runs the forward pass.
    fn forward_batch(&self, batch: &Tensor4D) -> AnalysisResult<Tensor2D>;

    /// Input shape declared by the graph, if known. Dynamic dims are negative.
    fn declared_input_shape(&self) -> Option<Vec<i64>> {
        None
    }

    /// Output shape declared by the graph, if known. Dynamic dims are negative.
    fn declared_output_shape(&self) -> Option<Vec<i64>> {
        None
    }
}

impl ClassifierBackend for OrtInfer {
    fn name(&self) -> &str {
        self.model_name()
    }

    fn device(&self) -> &str {
        self.provider().device_label()
    }

    fn forward_batch(&self, batch: &Tensor4D) -> AnalysisResult<Tensor2D> {
        self.infer_2d(batch)
    }

    fn declared_input_shape(&self) -> Option<Vec<i64>> {
        self.primary_input_shape()
    }

    fn declared_output_shape(&self) -> Option<Vec<i64>> {
        self.primary_output_shape()
    }
}
