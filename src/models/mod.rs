//! Models served by the analysis service.

pub mod classification;

pub use classification::*;
