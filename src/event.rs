//! Normalized input events consumed by the interaction controller.
//!
//! Pointer positions are already in image pixel coordinates. Positions
//! outside the image are delivered as-is and dropped by the controller.

use crate::keybindings::KeyCode;

/// A position in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePoint {
    pub x: f32,
    pub y: f32,
}

impl ImagePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether the point lies on an image of the given size.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.x < width as f32 && self.y < height as f32
    }
}

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button: create, drag and size boxes
    Primary,
    /// Right button: delete boxes
    Secondary,
    Middle,
}

/// Scroll wheel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Events the tagger responds to.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer button pressed.
    Press {
        button: PointerButton,
        position: ImagePoint,
    },
    /// Pointer button released.
    Release {
        button: PointerButton,
        position: ImagePoint,
    },
    /// Pointer moved.
    Motion { position: ImagePoint },
    /// Wheel scrolled.
    Scroll {
        direction: ScrollDirection,
        position: ImagePoint,
    },
    /// Key pressed.
    Key { key: KeyCode },
}

impl InputEvent {
    pub fn press(button: PointerButton, x: f32, y: f32) -> Self {
        Self::Press {
            button,
            position: ImagePoint::new(x, y),
        }
    }

    pub fn release(button: PointerButton, x: f32, y: f32) -> Self {
        Self::Release {
            button,
            position: ImagePoint::new(x, y),
        }
    }

    pub fn motion(x: f32, y: f32) -> Self {
        Self::Motion {
            position: ImagePoint::new(x, y),
        }
    }

    pub fn scroll(direction: ScrollDirection, x: f32, y: f32) -> Self {
        Self::Scroll {
            direction,
            position: ImagePoint::new(x, y),
        }
    }

    pub fn key(key: KeyCode) -> Self {
        Self::Key { key }
    }

    /// Pointer position carried by the event, if any.
    pub fn position(&self) -> Option<ImagePoint> {
        match self {
            InputEvent::Press { position, .. }
            | InputEvent::Release { position, .. }
            | InputEvent::Motion { position }
            | InputEvent::Scroll { position, .. } => Some(*position),
            InputEvent::Key { .. } => None,
        }
    }
}
