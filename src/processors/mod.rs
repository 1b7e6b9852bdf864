//! Image and score processors that make up the inference pipeline.
//!
//! * [`decode`] - transport payload to RGB pixel buffer
//! * [`preprocess`] - resize and normalize into the classifier input tensor
//! * [`normalization`] - per-channel standardization
//! * [`ranking`] - probabilities to ranked predictions

pub mod decode;
pub mod normalization;
pub mod preprocess;
pub mod ranking;

pub use decode::{PixelBuffer, decode_bytes, decode_payload};
pub use normalization::NormalizeImage;
pub use preprocess::Preprocessor;
pub use ranking::Ranker;
