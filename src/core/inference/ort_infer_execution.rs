use super::*;
use crate::core::errors::{AnalysisError, AnalysisResult, ProcessingStage, SimpleError};
use crate::core::tensor::{Tensor2D, Tensor4D};
use ndarray::ArrayView2;
use ort::value::TensorRef;
use std::sync::atomic::Ordering;

impl OrtInfer {
    /// Runs the graph on a `[batch, channels, height, width]` tensor and
    /// returns the `[batch, classes]` output.
    ///
    /// No gradient state exists in an ONNX Runtime session; the exported graph
    /// is the evaluation-mode graph.
    pub fn infer_2d(&self, x: &Tensor4D) -> AnalysisResult<Tensor2D> {
        let batch_size = x.shape()[0];
        let input_shape = x.shape().to_vec();

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            AnalysisError::inference_error(
                ProcessingStage::Forward,
                &self.model_name,
                &format!("failed to convert input tensor with shape {:?}", input_shape),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let idx = self.next_idx.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session = self.sessions[idx].lock().map_err(|_| {
            AnalysisError::inference_error(
                ProcessingStage::Forward,
                &self.model_name,
                &format!("session {}/{} is poisoned", idx, self.sessions.len()),
                SimpleError::new("session lock acquisition failed"),
            )
        })?;

        let outputs = session.run(inputs).map_err(|e| {
            AnalysisError::inference_error(
                ProcessingStage::Forward,
                &self.model_name,
                &format!(
                    "ONNX Runtime run failed with input '{}' -> output '{}'",
                    self.input_name, self.output_name
                ),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                AnalysisError::inference_error(
                    ProcessingStage::Forward,
                    &self.model_name,
                    &format!("failed to extract output '{}' as f32", self.output_name),
                    e,
                )
            })?;

        if output_shape.len() != 2 || output_shape[0] as usize != batch_size {
            return Err(AnalysisError::inference_error(
                ProcessingStage::Forward,
                &self.model_name,
                &format!(
                    "expected output shape [{}, classes] for input {:?}, got {:?}",
                    batch_size, input_shape, output_shape
                ),
                SimpleError::new("unexpected output tensor shape"),
            ));
        }

        let num_classes = output_shape[1] as usize;
        let array = ArrayView2::from_shape((batch_size, num_classes), output_data)?;
        Ok(array.to_owned())
    }
}
