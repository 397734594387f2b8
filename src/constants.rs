//! Global constants for croptag

/// Detection window size `[width, height]` in pixels (64x128 as in the HOG paper).
pub const DEFAULT_WINDOW_SIZE: [u32; 2] = [64, 128];

/// Fractional margin `(horizontal, top)` the detection window keeps around the subject.
/// 16px out of 64x128 in the HOG paper.
pub const DEFAULT_MARGIN: [f32; 2] = [0.25, 0.125];

/// Directory that processed source images are archived into.
pub const DEFAULT_COMPLETED_DIR: &str = "tagged";

/// Minimum extent (in pixels) a sized box must reach to be kept.
pub const MIN_BOX_SIZE: f32 = 1.0;

/// Supported image file extensions for directory listings.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff", "tif"];
