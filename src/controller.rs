//! Interaction state machine: turns input events into session mutations.
//!
//! One gesture at a time. The controller only remembers the id of the box
//! it is manipulating; the box itself always lives in the session.
//!
//! ```text
//! Idle --press on box--> DraggingBox --release--> Idle
//! Idle --press on empty (drag mode)--> SizingNewBox --release--> Idle
//! ```

use std::path::PathBuf;

use crate::constants::MIN_BOX_SIZE;
use crate::data::ImageDecoder;
use crate::error::Exhausted;
use crate::event::{ImagePoint, InputEvent, PointerButton, ScrollDirection};
use crate::keybindings::{KeyAction, KeyBindings, KeyCode};
use crate::model::{AnnotationBox, BoxId, CycleDirection};
use crate::session::AnnotationSession;

/// How a primary press on empty space creates a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingMode {
    /// Drop a box of fixed size centered on the press point.
    FixedSize { width: f32, height: f32 },
    /// Drag vertically to size a box whose width follows from its height.
    AspectDrag {
        /// Width over height.
        aspect_ratio: f32,
        /// Fractional `[horizontal, top]` margin around the subject.
        margin: [f32; 2],
    },
    /// No boxes; class keys file the whole image.
    Whole,
}

/// The gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    DraggingBox {
        id: BoxId,
    },
    SizingNewBox {
        id: BoxId,
        /// Where the press happened.
        anchor: ImagePoint,
        /// Last pointer position seen during the gesture.
        pointer: ImagePoint,
    },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    /// Box being manipulated by the current gesture.
    pub fn active_box(&self) -> Option<BoxId> {
        match self {
            InteractionState::Idle => None,
            InteractionState::DraggingBox { id } | InteractionState::SizingNewBox { id, .. } => {
                Some(*id)
            }
        }
    }
}

/// What the caller should do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// Nothing changed.
    Ignored,
    /// Boxes or status changed; redraw the current image.
    Redraw,
    /// A new image is current.
    ImageChanged(PathBuf),
}

/// Circle-and-line aid drawn while sizing a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingGuide {
    pub center: ImagePoint,
    pub radius: f32,
    pub line_start: ImagePoint,
    pub line_end: ImagePoint,
}

/// Geometry `(x, y, width, height)` of a box sized from `anchor` to `pointer`.
///
/// The height follows the pointer and includes the top margin; the width is
/// `round(|height| * aspect_ratio)`, centered on the anchor's x. The height
/// is negative when dragging upward.
pub fn sized_box_geometry(
    anchor: ImagePoint,
    pointer: ImagePoint,
    aspect_ratio: f32,
    top_margin: f32,
) -> (f32, f32, f32, f32) {
    let height = (pointer.y - anchor.y) / (1.0 - top_margin);
    let width = (height.abs() * aspect_ratio).round();
    let x = anchor.x - width / 2.0;
    let y = anchor.y - top_margin * height;
    (x, y, width, height)
}

/// Event-driven controller for one session.
#[derive(Debug, Clone)]
pub struct InteractionController {
    mode: SizingMode,
    keys: KeyBindings,
    state: InteractionState,
}

impl InteractionController {
    pub fn new(mode: SizingMode, keys: KeyBindings) -> Self {
        Self {
            mode,
            keys,
            state: InteractionState::Idle,
        }
    }

    pub fn mode(&self) -> SizingMode {
        self.mode
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Interpret one event in the current state.
    ///
    /// Pointer events outside the image and unknown keys are ignored. The
    /// only error is [`Exhausted`], when a key moved past the last image.
    pub fn handle_event<D: ImageDecoder>(
        &mut self,
        session: &mut AnnotationSession<D>,
        event: &InputEvent,
    ) -> Result<EventOutcome, Exhausted> {
        let Some((width, height)) = session.image_size() else {
            log::trace!("No image loaded, ignoring {:?}", event);
            return Ok(EventOutcome::Ignored);
        };
        if let Some(position) = event.position() {
            if !position.is_within(width, height) {
                log::trace!("Pointer outside image, ignoring {:?}", event);
                return Ok(EventOutcome::Ignored);
            }
            if self.mode == SizingMode::Whole {
                return Ok(EventOutcome::Ignored);
            }
        }

        let outcome = match *event {
            InputEvent::Press {
                button: PointerButton::Primary,
                position,
            } => self.on_primary_press(session, position),
            InputEvent::Press {
                button: PointerButton::Secondary,
                position,
            } => self.on_secondary_press(session, position),
            InputEvent::Release {
                button: PointerButton::Primary,
                ..
            } => self.on_primary_release(session),
            InputEvent::Motion { position } => self.on_motion(session, position),
            InputEvent::Scroll {
                direction,
                position,
            } => self.on_scroll(session, direction, position),
            InputEvent::Key { key } => return self.on_key(session, key),
            InputEvent::Press { .. } | InputEvent::Release { .. } => EventOutcome::Ignored,
        };
        Ok(outcome)
    }

    /// Guide to draw for the box being sized, if any.
    pub fn sizing_guide<D: ImageDecoder>(
        &self,
        session: &AnnotationSession<D>,
    ) -> Option<SizingGuide> {
        let InteractionState::SizingNewBox {
            id,
            anchor,
            pointer,
        } = self.state
        else {
            return None;
        };
        let SizingMode::AspectDrag { margin, .. } = self.mode else {
            return None;
        };
        let b = session.get_box(id)?;
        let radius = b.width * margin[0] / 2.0;
        let top_offset = margin[1] * b.height;
        Some(SizingGuide {
            center: ImagePoint::new(anchor.x, anchor.y + radius),
            radius,
            line_start: ImagePoint::new(anchor.x, anchor.y + 2.0 * radius),
            line_end: ImagePoint::new(anchor.x, pointer.y - top_offset),
        })
    }

    fn on_primary_press<D: ImageDecoder>(
        &mut self,
        session: &mut AnnotationSession<D>,
        position: ImagePoint,
    ) -> EventOutcome {
        if !self.state.is_idle() {
            return EventOutcome::Ignored;
        }

        if let Some(id) = session.hit_test(position.x, position.y) {
            log::debug!("Dragging box {}", id);
            self.state = InteractionState::DraggingBox { id };
            return EventOutcome::Redraw;
        }

        match self.mode {
            SizingMode::FixedSize { width, height } => {
                let Some((image_width, image_height)) = session.image_size() else {
                    return EventOutcome::Ignored;
                };
                let b = AnnotationBox::centered_at(
                    0,
                    position.x,
                    position.y,
                    width,
                    height,
                    session.palette().default_color(),
                )
                .fitted_to_bounds(image_width, image_height);
                match session.add_box(b.x, b.y, b.width, b.height) {
                    Some(_) => EventOutcome::Redraw,
                    None => EventOutcome::Ignored,
                }
            }
            SizingMode::AspectDrag { .. } => {
                match session.add_box(position.x, position.y, 0.0, 0.0) {
                    Some(id) => {
                        log::debug!(
                            "Sizing new box {} from ({:.0}, {:.0})",
                            id,
                            position.x,
                            position.y
                        );
                        self.state = InteractionState::SizingNewBox {
                            id,
                            anchor: position,
                            pointer: position,
                        };
                        EventOutcome::Redraw
                    }
                    None => EventOutcome::Ignored,
                }
            }
            SizingMode::Whole => EventOutcome::Ignored,
        }
    }

    fn on_secondary_press<D: ImageDecoder>(
        &mut self,
        session: &mut AnnotationSession<D>,
        position: ImagePoint,
    ) -> EventOutcome {
        // While dragging, don't register any clicks except releasing the primary button
        if !self.state.is_idle() {
            return EventOutcome::Ignored;
        }
        match session.hit_test(position.x, position.y) {
            Some(id) if session.remove_box(id) => EventOutcome::Redraw,
            _ => EventOutcome::Ignored,
        }
    }

    fn on_primary_release<D: ImageDecoder>(
        &mut self,
        session: &mut AnnotationSession<D>,
    ) -> EventOutcome {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => EventOutcome::Ignored,
            InteractionState::DraggingBox { id } => {
                log::debug!("Dropped box {}", id);
                EventOutcome::Redraw
            }
            InteractionState::SizingNewBox { id, .. } => {
                if session.finalize_box(id, MIN_BOX_SIZE) {
                    if let Some(b) = session.get_box(id) {
                        log::debug!(
                            "Sized box {} to ({:.0}, {:.0}) {:.0}x{:.0}",
                            id,
                            b.x,
                            b.y,
                            b.width,
                            b.height
                        );
                    }
                }
                EventOutcome::Redraw
            }
        }
    }

    fn on_motion<D: ImageDecoder>(
        &mut self,
        session: &mut AnnotationSession<D>,
        position: ImagePoint,
    ) -> EventOutcome {
        match &mut self.state {
            InteractionState::Idle => EventOutcome::Ignored,
            InteractionState::DraggingBox { id } => {
                if session.move_box(*id, position.x, position.y) {
                    EventOutcome::Redraw
                } else {
                    self.state = InteractionState::Idle;
                    EventOutcome::Ignored
                }
            }
            InteractionState::SizingNewBox {
                id,
                anchor,
                pointer,
            } => {
                let SizingMode::AspectDrag {
                    aspect_ratio,
                    margin,
                } = self.mode
                else {
                    return EventOutcome::Ignored;
                };
                *pointer = position;
                let (x, y, width, height) =
                    sized_box_geometry(*anchor, position, aspect_ratio, margin[1]);
                match session.box_mut(*id) {
                    Some(b) => {
                        b.x = x;
                        b.y = y;
                        b.width = width;
                        b.height = height;
                        EventOutcome::Redraw
                    }
                    None => {
                        self.state = InteractionState::Idle;
                        EventOutcome::Ignored
                    }
                }
            }
        }
    }

    fn on_scroll<D: ImageDecoder>(
        &mut self,
        session: &mut AnnotationSession<D>,
        direction: ScrollDirection,
        position: ImagePoint,
    ) -> EventOutcome {
        let target = self
            .state
            .active_box()
            .or_else(|| session.hit_test(position.x, position.y));
        let Some(id) = target else {
            return EventOutcome::Ignored;
        };
        let direction = match direction {
            ScrollDirection::Up => CycleDirection::Forward,
            ScrollDirection::Down => CycleDirection::Backward,
        };
        match session.cycle_color(id, direction) {
            Some(_) => EventOutcome::Redraw,
            None => EventOutcome::Ignored,
        }
    }

    fn on_key<D: ImageDecoder>(
        &mut self,
        session: &mut AnnotationSession<D>,
        key: KeyCode,
    ) -> Result<EventOutcome, Exhausted> {
        if !self.state.is_idle() {
            log::debug!("Ignoring {} during a gesture", key);
            return Ok(EventOutcome::Ignored);
        }

        match self.keys.action_for_key(key) {
            Some(KeyAction::Commit) if self.mode != SizingMode::Whole => {
                if let Err(e) = session.commit() {
                    log::error!("Commit failed: {}", e);
                    session.set_status(e.to_string());
                }
                self.advance(session)
            }
            Some(KeyAction::Skip) => {
                session.set_status("Skipped");
                self.advance(session)
            }
            Some(KeyAction::Delete) => {
                match session.delete_current_image() {
                    Ok(()) => {}
                    // Already on the status line
                    Err(e) => log::debug!("Advancing past undeleted image: {}", e),
                }
                self.advance(session)
            }
            Some(KeyAction::Commit) | None => {
                if self.mode == SizingMode::Whole {
                    if let Some(index) = session.palette().class_for_key(key) {
                        match session.classify_current(index) {
                            Ok(to) => log::debug!("Filed image as {:?}", to),
                            Err(e) => log::debug!("Advancing past unfiled image: {}", e),
                        }
                        return self.advance(session);
                    }
                }
                log::trace!("Unbound key {}", key);
                Ok(EventOutcome::Ignored)
            }
        }
    }

    fn advance<D: ImageDecoder>(
        &mut self,
        session: &mut AnnotationSession<D>,
    ) -> Result<EventOutcome, Exhausted> {
        self.state = InteractionState::Idle;
        let path = session.advance()?.to_path_buf();
        Ok(EventOutcome::ImageChanged(path))
    }
}
