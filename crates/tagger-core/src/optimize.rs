//! Image payload preparation
//!
//! Decodes an image, constrains it to a bounding resolution, and re-encodes
//! it as JPEG for transmission to the inference service. Vision models work
//! from small inputs, so the default bound is 256x256.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while preparing an image payload
#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// Decode the image at `path`, fit it within `max_resolution` on both axes
/// (aspect ratio preserved, never upscaled), and re-encode it as JPEG.
pub fn optimize_image(path: &Path, max_resolution: u32) -> Result<Vec<u8>, OptimizeError> {
    let img = image::open(path).map_err(|e| OptimizeError::Decode(e.to_string()))?;

    let bounded = if img.width() > max_resolution || img.height() > max_resolution {
        img.thumbnail(max_resolution, max_resolution)
    } else {
        img
    };

    // JPEG cannot carry an alpha channel
    let rgb = DynamicImage::ImageRgb8(bounded.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| OptimizeError::Encode(e.to_string()))?;

    Ok(buffer.into_inner())
}
