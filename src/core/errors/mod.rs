//! Error types for the analysis service.
//!
//! The taxonomy separates the failures a caller has to tell apart:
//!
//! * [`AnalysisError::Decode`] - the client sent a malformed image.
//! * [`AnalysisError::ModelLoad`] - the bundle is missing or inconsistent; fatal at start-up.
//! * [`AnalysisError::Inference`] - preprocessing or the forward pass failed.
//! * [`AnalysisError::Persistence`] - the store could not be written or read.
//!
//! ```rust
//! use bloodsmear::core::errors::{AnalysisError, ErrorClass};
//!
//! let err = AnalysisError::invalid_input("image is required");
//! assert_eq!(err.class(), ErrorClass::Client);
//! ```

pub mod constructors;
pub mod types;

pub use types::{AnalysisError, DecodeFailure, ErrorClass, ProcessingStage, SimpleError};

/// Convenient result alias for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;
