//! croptag - image region tagger
//!
//! Walks a folder of images one at a time. The operator draws boxes over
//! regions of interest, gives each box a class color and commits; every box
//! is cropped into the directory of its class and the source image is moved
//! to a completed folder.
//!
//! The crate is split into:
//! - [`model`]: boxes, class colors and the class palette
//! - [`session`]: boxes of the current image and the commit / advance protocol
//! - [`controller`]: the pointer and key state machine
//! - [`app`]: the event loop tying the above to a [`render::RenderSink`]

pub mod app;
pub mod config;
pub mod constants;
pub mod controller;
pub mod data;
pub mod error;
pub mod event;
pub mod keybindings;
pub mod model;
pub mod render;
pub mod replay;
pub mod session;

pub use app::{RunEnd, RunSummary, TaggerApp};
pub use config::{TaggerConfig, TaggerMode};
pub use controller::{InteractionController, SizingMode};
pub use error::{Exhausted, SetupError};
pub use session::AnnotationSession;

#[cfg(test)]
mod tests;
