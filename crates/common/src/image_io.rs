//! Image loading for analysis input
//!
//! Every raster the `image` crate can decode is normalized to 8-bit RGB.
//! Grayscale sources are expanded channel-wise, so brightness statistics
//! taken on the RGB buffer match those of the original.

use image::RgbImage;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading an image
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to read image file: {0}")]
    ReadError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Image has no pixels ({0}x{1})")]
    EmptyImage(u32, u32),
}

/// Load an image from a file path, detecting the format from its content
///
/// # Example
/// ```no_run
/// use login_detect_common::load_image;
/// let img = load_image("screenshot.png")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<RgbImage, ImageError> {
    let path = path.as_ref();

    let data = fs::read(path)
        .map_err(|e| ImageError::ReadError(format!("{}: {e}", path.display())))?;

    let img = image::load_from_memory(&data)
        .map_err(|e| ImageError::DecodeError(format!("{}: {e}", path.display())))?
        .to_rgb8();

    if img.width() == 0 || img.height() == 0 {
        return Err(ImageError::EmptyImage(img.width(), img.height()));
    }

    Ok(img)
}
