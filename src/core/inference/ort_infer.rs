//! ONNX Runtime inference engine with a small pool of sessions.

use crate::core::config::OrtExecutionProvider;
use ort::{session::Session, value::ValueType};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;

#[path = "ort_infer_builders.rs"]
mod ort_infer_builders;
#[path = "ort_infer_execution.rs"]
mod ort_infer_execution;
#[cfg(test)]
#[path = "ort_infer_tests.rs"]
mod ort_infer_tests;

/// Loaded ONNX graph plus the sessions that execute it.
///
/// The graph and its weights are immutable after load. `Session::run` needs
/// exclusive access to a session, so requests are spread round-robin over a
/// pool of sessions and only contend when the pool is exhausted.
pub struct OrtInfer {
    pub(super) sessions: Vec<Mutex<Session>>,
    pub(super) next_idx: AtomicUsize,
    pub(super) input_name: String,
    pub(super) output_name: String,
    pub(super) model_path: PathBuf,
    pub(super) model_name: String,
    pub(super) provider: OrtExecutionProvider,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("sessions", &self.sessions.len())
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .field("provider", &self.provider)
            .finish()
    }
}

impl OrtInfer {
    /// Declared shape of the primary input. Dynamic dimensions are `-1`.
    pub fn primary_input_shape(&self) -> Option<Vec<i64>> {
        let session = self.sessions.first()?.lock().ok()?;
        let input = session.inputs.iter().find(|i| i.name == self.input_name)?;
        match &input.input_type {
            ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect()),
            _ => None,
        }
    }

    /// Declared shape of the selected output. Dynamic dimensions are `-1`.
    pub fn primary_output_shape(&self) -> Option<Vec<i64>> {
        let session = self.sessions.first()?.lock().ok()?;
        let output = session.outputs.iter().find(|o| o.name == self.output_name)?;
        match &output.output_type {
            ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect()),
            _ => None,
        }
    }

    /// Execution provider the sessions were built for.
    pub fn provider(&self) -> &OrtExecutionProvider {
        &self.provider
    }

    /// Returns the model path associated with this inference engine.
    pub fn model_path(&self) -> &std::path::Path {
        &self.model_path
    }

    /// Returns the model name associated with this inference engine.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Number of sessions in the pool.
    pub fn pool_size(&self) -> usize {
        self.sessions.len()
    }
}
