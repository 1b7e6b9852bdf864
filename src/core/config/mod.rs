//! Configuration for the service and the ONNX Runtime sessions.

pub mod onnx;
pub mod service;

pub use onnx::{OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig};
pub use service::ServiceConfig;
