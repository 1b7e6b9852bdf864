//! Image helpers for loading files and building transport payloads.

use crate::core::constants::INPUT_SIZE;
use crate::core::errors::{AnalysisError, AnalysisResult};
use crate::processors::decode::{PixelBuffer, decode_bytes};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::path::Path;

/// Loads an image file into an RGB pixel buffer.
///
/// The bytes go through the same decoder as request payloads, so a file and
/// an uploaded image of identical content produce identical pixels.
///
/// # Errors
///
/// [`AnalysisError::Io`] if the file cannot be read and
/// [`AnalysisError::Decode`] if it is not an image.
pub fn load_image(path: &Path) -> AnalysisResult<PixelBuffer> {
    let bytes = std::fs::read(path)?;
    decode_bytes(&bytes)
}

/// Encodes `image` as a baseline JPEG.
pub fn encode_jpeg(image: &RgbImage) -> AnalysisResult<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new(&mut buffer)
        .encode_image(image)
        .map_err(|e| AnalysisError::Io(std::io::Error::other(e)))?;
    Ok(buffer)
}

/// Base64 text of `bytes`, the encoding request payloads use.
pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Base64 JPEG of an all-black image at the model's input size.
///
/// Fed through the full pipeline by the health probe.
pub fn black_probe_payload() -> AnalysisResult<String> {
    let image = RgbImage::new(INPUT_SIZE, INPUT_SIZE);
    Ok(encode_payload(&encode_jpeg(&image)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::decode::decode_payload;

    #[test]
    fn test_probe_payload_decodes_to_black_image() {
        let payload = black_probe_payload().unwrap();
        let image = decode_payload(&payload).unwrap();
        assert_eq!(image.dimensions(), (INPUT_SIZE, INPUT_SIZE));
        // JPEG is lossy, but black stays (nearly) black.
        assert!(image.pixels().all(|p| p.0.iter().all(|&c| c < 8)));
    }

    #[test]
    fn test_load_image_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(matches!(load_image(&missing), Err(AnalysisError::Io(_))));

        let junk = dir.path().join("junk.png");
        std::fs::write(&junk, b"definitely not a png").unwrap();
        assert!(matches!(load_image(&junk), Err(AnalysisError::Decode(_))));
    }

    #[test]
    fn test_load_image_reads_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cell.png");
        RgbImage::from_pixel(7, 5, image::Rgb([200, 10, 30]))
            .save(&path)
            .unwrap();
        let image = load_image(&path).unwrap();
        assert_eq!(image.dimensions(), (7, 5));
        assert_eq!(image.get_pixel(3, 3).0, [200, 10, 30]);
    }
}
