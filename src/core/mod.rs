//! Core building blocks of the service.
//!
//! This module contains:
//! - Configuration for the service and ONNX Runtime sessions
//! - Constants that form the model's preprocessing contract
//! - The error taxonomy
//! - The ONNX Runtime inference engine
//! - Tensor aliases shared between stages

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;
pub mod tensor;

pub use config::{OrtExecutionProvider, OrtSessionConfig, ServiceConfig};
pub use constants::*;
pub use errors::{AnalysisError, AnalysisResult, DecodeFailure, ErrorClass, ProcessingStage};
pub use inference::OrtInfer;
pub use tensor::{Tensor1D, Tensor2D, Tensor3D, Tensor4D};

/// Initializes the tracing subscriber for logging.
///
/// Sets up the subscriber with an environment filter (`RUST_LOG`) and a
/// formatting layer. Call once at the start of the process.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
