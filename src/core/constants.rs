//! Constants shared across the pipeline.
//!
//! The preprocessing constants are part of the trained model's contract.
//! Changing any of them silently corrupts predictions, so they are not
//! exposed through configuration.

/// Side length of the square classifier input, in pixels.
pub const INPUT_SIZE: u32 = 224;

/// Number of color channels the classifier consumes.
pub const INPUT_CHANNELS: usize = 3;

/// Scale applied to 8-bit intensities before normalization.
pub const PIXEL_SCALE: f32 = 1.0 / 255.0;

/// Per-channel mean (RGB) used at training time.
pub const NORMALIZE_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel standard deviation (RGB) used at training time.
pub const NORMALIZE_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Width of the hidden layer in the classification head.
pub const HEAD_HIDDEN_DIM: usize = 512;

/// Default number of records returned by a history query.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// File name of the ONNX graph inside a model bundle.
pub const MODEL_FILE_NAME: &str = "model.onnx";

/// File name of the bundle manifest inside a model bundle.
pub const MANIFEST_FILE_NAME: &str = "bundle.json";
