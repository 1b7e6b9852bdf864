//! ONNX Runtime integration.

pub mod ort_infer;

pub use ort_infer::OrtInfer;
