//! Textual event scripts.
//!
//! One event per line, coordinates in image pixels:
//!
//! ```text
//! # tap a box, make it the next class, commit
//! press left 100 100
//! release left 100 100
//! scroll up 100 100
//! move 120 140
//! key enter
//! ```
//!
//! Buttons are `left`, `right` and `middle`. Blank lines and lines starting
//! with `#` are skipped.

use std::io::BufRead;

use thiserror::Error;

use crate::event::{InputEvent, PointerButton, ScrollDirection};
use crate::keybindings::{KeyCode, UnknownKey};

/// A script line that is not an event.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("unknown button '{0}'")]
    UnknownButton(String),

    #[error("unknown scroll direction '{0}'")]
    UnknownDirection(String),

    #[error("invalid coordinate '{0}'")]
    InvalidCoordinate(String),

    #[error("expected {expected} argument(s), got {got}")]
    WrongArity { expected: usize, got: usize },

    #[error(transparent)]
    UnknownKey(#[from] UnknownKey),
}

/// Parse one script line. Blank lines and comments give `Ok(None)`.
pub fn parse_event_line(line: &str) -> Result<Option<InputEvent>, ScriptError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let event = match verb.to_lowercase().as_str() {
        "press" => {
            let [button, x, y] = arity::<3>(&args)?;
            InputEvent::press(parse_button(button)?, coordinate(x)?, coordinate(y)?)
        }
        "release" => {
            let [button, x, y] = arity::<3>(&args)?;
            InputEvent::release(parse_button(button)?, coordinate(x)?, coordinate(y)?)
        }
        "move" | "motion" => {
            let [x, y] = arity::<2>(&args)?;
            InputEvent::motion(coordinate(x)?, coordinate(y)?)
        }
        "scroll" => {
            let [direction, x, y] = arity::<3>(&args)?;
            let direction = match direction.to_lowercase().as_str() {
                "up" => ScrollDirection::Up,
                "down" => ScrollDirection::Down,
                _ => return Err(ScriptError::UnknownDirection(direction.to_string())),
            };
            InputEvent::scroll(direction, coordinate(x)?, coordinate(y)?)
        }
        "key" => {
            let [key] = arity::<1>(&args)?;
            InputEvent::key(key.parse::<KeyCode>()?)
        }
        _ => return Err(ScriptError::UnknownEvent(verb.to_string())),
    };
    Ok(Some(event))
}

fn arity<'a, const N: usize>(args: &[&'a str]) -> Result<[&'a str; N], ScriptError> {
    <[&str; N]>::try_from(args).map_err(|_| ScriptError::WrongArity {
        expected: N,
        got: args.len(),
    })
}

fn parse_button(word: &str) -> Result<PointerButton, ScriptError> {
    match word.to_lowercase().as_str() {
        "left" | "primary" | "1" => Ok(PointerButton::Primary),
        "right" | "secondary" | "3" => Ok(PointerButton::Secondary),
        "middle" | "2" => Ok(PointerButton::Middle),
        _ => Err(ScriptError::UnknownButton(word.to_string())),
    }
}

fn coordinate(word: &str) -> Result<f32, ScriptError> {
    word.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ScriptError::InvalidCoordinate(word.to_string()))
}

/// Events read lazily from a script.
///
/// Malformed lines are logged and skipped; a read error ends the script.
pub struct EventScript<R> {
    reader: R,
    line_number: usize,
    buffer: String,
}

impl<R: BufRead> EventScript<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for EventScript<R> {
    type Item = InputEvent;

    fn next(&mut self) -> Option<InputEvent> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    log::error!("Failed to read event script: {}", e);
                    return None;
                }
            }
            self.line_number += 1;

            match parse_event_line(&self.buffer) {
                Ok(Some(event)) => return Some(event),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping event script line {}: {}", self.line_number, e),
            }
        }
    }
}
