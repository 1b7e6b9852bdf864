//! Pixel buffer to classifier input.

use super::normalization::NormalizeImage;
use crate::core::constants::{INPUT_CHANNELS, INPUT_SIZE};
use crate::core::tensor::Tensor3D;
use image::RgbImage;
use image::imageops::{self, FilterType};

/// Resizes and normalizes images into the exact form the classifier expects.
///
/// The resize is a fixed bilinear (`Triangle`) filter to `224x224`, the same
/// algorithm class the model was trained with. Aspect ratio is not kept.
/// Output is a `[3, 224, 224]` tensor. The transform is pure and
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    normalizer: NormalizeImage,
}

impl Preprocessor {
    /// Interpolation filter used for every resize.
    pub const RESIZE_FILTER: FilterType = FilterType::Triangle;

    pub fn new() -> Self {
        Self::default()
    }

    /// Shape of the tensors this preprocessor produces.
    pub fn output_shape(&self) -> [usize; 3] {
        [INPUT_CHANNELS, INPUT_SIZE as usize, INPUT_SIZE as usize]
    }

    /// Resizes `image` to the model input size and normalizes it.
    pub fn preprocess(&self, image: &RgbImage) -> Tensor3D {
        let resized;
        let input = if image.dimensions() == (INPUT_SIZE, INPUT_SIZE) {
            image
        } else {
            resized = imageops::resize(image, INPUT_SIZE, INPUT_SIZE, Self::RESIZE_FILTER);
            &resized
        };
        self.normalizer.normalize_to(input)
    }
}
