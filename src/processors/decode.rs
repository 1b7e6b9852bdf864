//! Transport payload decoding.
//!
//! Clients send images as base64 text, optionally wrapped in a data-URL
//! header such as `data:image/jpeg;base64,`. Everything up to and including
//! the first `,` is treated as that header and discarded.

use crate::core::errors::{AnalysisResult, DecodeFailure};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbImage;

/// Canonical in-memory image: 8-bit RGB, row-major.
pub type PixelBuffer = RgbImage;

/// Separator between a media-type header and the encoded data.
const HEADER_SEPARATOR: char = ',';

/// Decodes a transport-encoded image into an RGB pixel buffer.
///
/// # Errors
///
/// Returns [`AnalysisError::Decode`](crate::core::errors::AnalysisError::Decode)
/// when the payload is empty, is not base64, or does not hold an image.
pub fn decode_payload(payload: &str) -> AnalysisResult<PixelBuffer> {
    let data = strip_media_header(payload);
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(DecodeFailure::Empty.into());
    }
    let bytes = STANDARD.decode(compact.as_bytes()).map_err(DecodeFailure::from)?;
    decode_bytes(&bytes)
}

/// Decodes raw image file bytes into an RGB pixel buffer.
///
/// Grayscale, alpha, palette and 16-bit sources are all converted to 8-bit RGB.
pub fn decode_bytes(bytes: &[u8]) -> AnalysisResult<PixelBuffer> {
    if bytes.is_empty() {
        return Err(DecodeFailure::Empty.into());
    }
    let image = image::load_from_memory(bytes).map_err(DecodeFailure::from)?;
    Ok(image.to_rgb8())
}

/// Returns the encoded part of a payload, without any media-type header.
pub fn strip_media_header(payload: &str) -> &str {
    match payload.split_once(HEADER_SEPARATOR) {
        Some((_, data)) => data.trim(),
        None => payload.trim(),
    }
}
