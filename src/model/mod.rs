//! Data models for croptag.

mod annotation;
mod palette;

pub use annotation::{AnnotationBox, BoxId, PixelRect, hit_test};
pub use palette::{ClassColor, ClassEntry, ClassPalette, CycleDirection};
