//! # Blood smear analysis
//!
//! Classifies blood smear microscopy images and keeps a per-user history of
//! the results.
//!
//! An image goes through four stages:
//!
//! 1. **Decode** - base64 payload (optionally a data URL) to an RGB buffer
//! 2. **Preprocess** - resize to 224x224 and normalize with the ImageNet
//!    channel statistics
//! 3. **Classify** - EfficientNet-B0 with a custom head on ONNX Runtime,
//!    softmax over the classes
//! 4. **Rank** - percentages sorted by descending confidence
//!
//! The result is then stored as an [`AnalysisRecord`](domain::AnalysisRecord)
//! and counted into total, monthly and weekly statistics.
//!
//! ## Modules
//!
//! * [`core`] - configuration, errors, constants, and the ONNX Runtime session pool
//! * [`domain`] - labels, predictions, and stored records
//! * [`processors`] - decoding, preprocessing, and ranking
//! * [`models`] - the model bundle and the classifier engine
//! * [`store`] - analysis history backends and calendar windows
//! * [`pipeline`] - the end-to-end pipeline and the application context
//! * [`server`] - the HTTP API
//! * [`utils`] - image helpers and model bundle download
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bloodsmear::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = ClassifierEngine::load("backend/models", &OrtSessionConfig::default())?;
//! let pipeline = DiagnosticPipeline::new(engine);
//!
//! let image = load_image(Path::new("smear.jpg"))?;
//! let result = pipeline.predict_image(&image)?;
//! println!("{} ({:.1}%)", result.top_label, result.top_confidence);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod server;
pub mod store;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use bloodsmear::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{AnalysisError, AnalysisResult, OrtSessionConfig, ServiceConfig};
    pub use crate::domain::{AnalysisRecord, AnalysisStats, LabelSet, PredictionResult};
    pub use crate::models::ClassifierEngine;
    pub use crate::pipeline::{AppContext, DiagnosticPipeline};
    pub use crate::store::{AnalysisHistory, AnalysisStore, MemoryStore, SqliteStore};
    pub use crate::utils::load_image;
}
