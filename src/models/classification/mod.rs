//! Blood smear classifier.
//!
//! * [`bundle`] - on-disk model bundle and its manifest
//! * [`backend`] - forward-pass backends
//! * [`engine`] - the loaded classifier used by the pipeline

pub mod backend;
pub mod bundle;
pub mod engine;

pub use backend::ClassifierBackend;
pub use bundle::{Architecture, BundleManifest, ModelBundle, OutputKind, bundle_present};
pub use engine::{ClassifierEngine, ProbabilityVector, renormalize, softmax};
