//! Image decoding and image sources.
//!
//! This module provides:
//! - `ImageDecoder`: decoding collaborator, with `ImageCrateDecoder` as the default
//! - `ImageSource`: lazy, forward-only sequence of candidate paths
//!
//! ## Adding New Decoders
//!
//! ```rust,ignore
//! use croptag::data::ImageDecoder;
//!
//! pub struct RawDecoder;
//!
//! impl ImageDecoder for RawDecoder {
//!     fn id(&self) -> &'static str { "raw" }
//!     fn extensions(&self) -> &'static [&'static str] { &["raw"] }
//!     fn decode(&self, path: &Path) -> Result<DynamicImage, DecodeError> { /* ... */ }
//! }
//! ```

mod loader;
mod source;

pub use loader::{ImageCrateDecoder, ImageDecoder};
pub use source::ImageSource;
