//! Tagger application: wires a session, a controller and a render sink
//! into one event loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use web_time::Instant;

use crate::controller::{EventOutcome, InteractionController};
use crate::data::ImageDecoder;
use crate::error::Exhausted;
use crate::event::InputEvent;
use crate::render::{Frame, RenderSink};
use crate::session::AnnotationSession;

/// How an event loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// Every image was handled.
    Exhausted,
    /// The event source ran dry with an image still open.
    EventsEnded,
}

/// What happened during [`TaggerApp::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub end: RunEnd,
    pub events: usize,
    pub images_visited: usize,
    pub elapsed: Duration,
}

/// The tagger: session + controller + render sink.
pub struct TaggerApp<D: ImageDecoder, S: RenderSink> {
    session: AnnotationSession<D>,
    controller: InteractionController,
    sink: S,
    images_visited: usize,
    finished: bool,
}

impl<D: ImageDecoder, S: RenderSink> TaggerApp<D, S> {
    pub fn new(session: AnnotationSession<D>, controller: InteractionController, sink: S) -> Self {
        Self {
            session,
            controller,
            sink,
            images_visited: 0,
            finished: false,
        }
    }

    pub fn session(&self) -> &AnnotationSession<D> {
        &self.session
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Whether the image source has been used up.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Load the first image and draw it.
    pub fn start(&mut self) -> Result<PathBuf, Exhausted> {
        log::info!("🚀 Starting in {:?} mode", self.controller.mode());
        match self.session.advance() {
            Ok(path) => {
                let path = path.to_path_buf();
                self.on_image_changed(&path);
                Ok(path)
            }
            Err(e) => {
                self.shutdown();
                Err(e)
            }
        }
    }

    /// Feed one event through the controller and redraw if needed.
    pub fn handle(&mut self, event: &InputEvent) -> Result<EventOutcome, Exhausted> {
        if self.finished {
            return Err(Exhausted);
        }
        log::trace!("Event {:?}", event);

        match self.controller.handle_event(&mut self.session, event) {
            Ok(EventOutcome::Ignored) => Ok(EventOutcome::Ignored),
            Ok(EventOutcome::Redraw) => {
                self.redraw();
                Ok(EventOutcome::Redraw)
            }
            Ok(EventOutcome::ImageChanged(path)) => {
                self.on_image_changed(&path);
                Ok(EventOutcome::ImageChanged(path))
            }
            Err(e) => {
                self.shutdown();
                Err(e)
            }
        }
    }

    /// Start, then handle events until the images or the events run out.
    pub fn run(&mut self, events: impl IntoIterator<Item = InputEvent>) -> RunSummary {
        let started = Instant::now();
        let mut count = 0;

        let mut end = match self.start() {
            Ok(_) => RunEnd::EventsEnded,
            Err(Exhausted) => RunEnd::Exhausted,
        };

        if end == RunEnd::EventsEnded {
            for event in events {
                count += 1;
                if self.handle(&event).is_err() {
                    end = RunEnd::Exhausted;
                    break;
                }
            }
        }

        if end == RunEnd::EventsEnded {
            log::info!(
                "Event source closed with {:?} still open; it stays in place",
                self.session.current_path()
            );
        }

        RunSummary {
            end,
            events: count,
            images_visited: self.images_visited,
            elapsed: started.elapsed(),
        }
    }

    fn on_image_changed(&mut self, path: &Path) {
        self.images_visited += 1;
        log::info!("📷 Image {}: {:?}", self.images_visited, path);
        self.redraw();
    }

    fn redraw(&mut self) {
        let (Some(image_path), Some(image_size)) =
            (self.session.current_path(), self.session.image_size())
        else {
            return;
        };
        let frame = Frame {
            image_path,
            image_size,
            boxes: self.session.boxes(),
            state: *self.controller.state(),
            guide: self.controller.sizing_guide(&self.session),
            status: self.session.status_message(),
        };
        self.sink.redraw(&frame);
    }

    fn shutdown(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(status) = self.session.status_message() {
            log::info!("{}", status);
        }
        log::info!("✅ No more images after {} visited", self.images_visited);
    }
}
