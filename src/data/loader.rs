//! Trait-based image decoding.
//!
//! The session never touches a decoder library directly; it asks an
//! [`ImageDecoder`] for pixels and treats any failure as "skip this file".
//!
//! ## Usage
//!
//! ```rust,ignore
//! use croptag::data::{ImageCrateDecoder, ImageDecoder};
//!
//! let image = ImageCrateDecoder.decode(Path::new("photo.jpg"))?;
//! ```

use std::path::Path;

use image::DynamicImage;

use crate::constants::IMAGE_EXTENSIONS;
use crate::error::DecodeError;

/// Trait for image decoders.
pub trait ImageDecoder {
    /// Unique identifier for this decoder (e.g., "image").
    fn id(&self) -> &'static str;

    /// File extensions this decoder handles (lowercase, without dots).
    fn extensions(&self) -> &'static [&'static str];

    /// Decode the file at `path` into pixels.
    fn decode(&self, path: &Path) -> Result<DynamicImage, DecodeError>;

    /// Check if a path has an extension this decoder handles.
    fn is_supported_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions().iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }
}

/// Decoder for standard image formats backed by the `image` crate.
///
/// Supports PNG, JPEG, GIF, BMP, WebP and TIFF.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn id(&self) -> &'static str {
        "image"
    }

    fn extensions(&self) -> &'static [&'static str] {
        IMAGE_EXTENSIONS
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, DecodeError> {
        let img = image::open(path).map_err(|e| DecodeError::from_image(path, e))?;

        log::trace!(
            "{}: decoded {:?} ({}x{})",
            self.id(),
            path,
            img.width(),
            img.height()
        );

        Ok(img)
    }
}
