//! Per-channel image normalization.
//!
//! Pixels are scaled to `[0, 1]` and then standardized per channel:
//! `(p * scale - mean) / std`, folded into `p * alpha + beta` so each value
//! costs one multiply-add.

use crate::core::constants::{NORMALIZE_MEAN, NORMALIZE_STD, PIXEL_SCALE};
use crate::core::errors::{AnalysisError, AnalysisResult};
use crate::core::tensor::Tensor3D;
use image::RgbImage;

/// Normalizes RGB images into channel-first tensors.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeImage {
    /// Scaling factors for each channel (alpha = scale / std)
    alpha: [f32; 3],
    /// Offset values for each channel (beta = -mean / std)
    beta: [f32; 3],
}

impl NormalizeImage {
    /// The normalization the classifier was trained with.
    pub fn imagenet() -> Self {
        // The constants are valid by construction.
        Self::fold(PIXEL_SCALE, NORMALIZE_MEAN, NORMALIZE_STD)
    }

    /// Creates a normalizer from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the scale or any standard deviation
    /// is not a positive finite number, or if any mean is not finite.
    pub fn new(scale: f32, mean: [f32; 3], std: [f32; 3]) -> AnalysisResult<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(AnalysisError::config_error(
                "Scale must be greater than 0",
            ));
        }
        for (i, &s) in std.iter().enumerate() {
            if !(s.is_finite() && s > 0.0) {
                return Err(AnalysisError::config_error(format!(
                    "Standard deviation at index {i} must be greater than 0, got {s}"
                )));
            }
        }
        if let Some(m) = mean.iter().find(|m| !m.is_finite()) {
            return Err(AnalysisError::config_error(format!(
                "Mean values must be finite, got {m}"
            )));
        }
        Ok(Self::fold(scale, mean, std))
    }

    fn fold(scale: f32, mean: [f32; 3], std: [f32; 3]) -> Self {
        let alpha = [scale / std[0], scale / std[1], scale / std[2]];
        let beta = [-mean[0] / std[0], -mean[1] / std[1], -mean[2] / std[2]];
        Self { alpha, beta }
    }

    /// Smallest and largest value a channel can take for 8-bit input.
    pub fn channel_bounds(&self, channel: usize) -> (f32, f32) {
        let lo = self.beta[channel];
        let hi = 255.0 * self.alpha[channel] + self.beta[channel];
        (lo.min(hi), lo.max(hi))
    }

    /// Normalizes an RGB image into a `[3, height, width]` tensor.
    pub fn normalize_to(&self, img: &RgbImage) -> Tensor3D {
        let (width, height) = img.dimensions();
        Tensor3D::from_shape_fn((3, height as usize, width as usize), |(c, y, x)| {
            let value = img.get_pixel(x as u32, y as u32)[c] as f32;
            value * self.alpha[c] + self.beta[c]
        })
    }
}

impl Default for NormalizeImage {
    fn default() -> Self {
        Self::imagenet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_imagenet_values() {
        let norm = NormalizeImage::imagenet();
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 0, 128]));
        let tensor = norm.normalize_to(&img);

        assert_eq!(tensor.shape(), &[3, 1, 1]);
        let r = (1.0 - 0.485) / 0.229;
        let g = (0.0 - 0.456) / 0.224;
        let b = (128.0 / 255.0 - 0.406) / 0.225;
        assert!((tensor[[0, 0, 0]] - r).abs() < 1e-5);
        assert!((tensor[[1, 0, 0]] - g).abs() < 1e-5);
        assert!((tensor[[2, 0, 0]] - b).abs() < 1e-5);
    }

    #[test]
    fn test_channel_first_layout() {
        let norm = NormalizeImage::new(1.0, [0.0; 3], [1.0; 3]).unwrap();
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([1, 2, 3]));
        img.put_pixel(1, 0, Rgb([4, 5, 6]));

        let tensor = norm.normalize_to(&img);
        assert_eq!(tensor.shape(), &[3, 1, 2]);
        assert_eq!(tensor[[0, 0, 0]], 1.0);
        assert_eq!(tensor[[0, 0, 1]], 4.0);
        assert_eq!(tensor[[2, 0, 1]], 6.0);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(NormalizeImage::new(0.0, [0.0; 3], [1.0; 3]).is_err());
        assert!(NormalizeImage::new(1.0, [0.0; 3], [1.0, 0.0, 1.0]).is_err());
        assert!(NormalizeImage::new(1.0, [f32::NAN, 0.0, 0.0], [1.0; 3]).is_err());
    }

    #[test]
    fn test_channel_bounds() {
        let norm = NormalizeImage::imagenet();
        let (lo, hi) = norm.channel_bounds(0);
        assert!((lo - (-0.485 / 0.229)).abs() < 1e-5);
        assert!((hi - ((1.0 - 0.485) / 0.229)).abs() < 1e-5);
    }
}
