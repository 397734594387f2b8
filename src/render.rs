//! Rendering seam.
//!
//! The core never draws. After every event that changes what the operator
//! should see, the app hands a [`Frame`] to a [`RenderSink`].

use std::path::Path;

use crate::controller::{InteractionState, SizingGuide};
use crate::model::AnnotationBox;

/// Everything needed to draw the current image and its overlays.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub image_path: &'a Path,
    /// `(width, height)` in pixels
    pub image_size: (u32, u32),
    /// Boxes in insertion order; draw later boxes on top
    pub boxes: &'a [AnnotationBox],
    pub state: InteractionState,
    pub guide: Option<SizingGuide>,
    pub status: Option<&'a str>,
}

impl Frame<'_> {
    /// Outline color of a box.
    pub fn box_rgb(b: &AnnotationBox) -> [u8; 3] {
        b.color.rgb()
    }
}

/// Receives frames to present.
pub trait RenderSink {
    /// Present a frame. Called once per change; the frame borrows session
    /// state and must not be kept.
    fn redraw(&mut self, frame: &Frame<'_>);
}

/// Sink that writes each frame to the log.
#[derive(Debug, Default)]
pub struct LogRenderSink {
    frames: usize,
    last_status: Option<String>,
}

impl LogRenderSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames presented so far.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl RenderSink for LogRenderSink {
    fn redraw(&mut self, frame: &Frame<'_>) {
        self.frames += 1;
        let (width, height) = frame.image_size;
        log::debug!(
            "🖼 {:?} {}x{}: {} box(es), {:?}",
            frame.image_path,
            width,
            height,
            frame.boxes.len(),
            frame.state
        );
        for b in frame.boxes {
            let [r, g, bl] = Frame::box_rgb(b);
            log::trace!(
                "  box {} ({:.0}, {:.0}) {:.0}x{:.0} {} #{:02x}{:02x}{:02x}",
                b.id,
                b.x,
                b.y,
                b.width,
                b.height,
                b.color,
                r,
                g,
                bl
            );
        }
        if let Some(guide) = frame.guide {
            log::trace!(
                "  guide r={:.1} at ({:.0}, {:.0}) to y={:.0}",
                guide.radius,
                guide.center.x,
                guide.center.y,
                guide.line_end.y
            );
        }
        // Status is logged once per change
        if frame.status != self.last_status.as_deref() {
            if let Some(status) = frame.status {
                log::info!("{}", status);
            }
            self.last_status = frame.status.map(str::to_owned);
        }
    }
}
