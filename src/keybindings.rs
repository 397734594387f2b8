//! Keybindings for committing, skipping and deleting images.
//!
//! Class keys (used by whole-image mode) live on the class palette; this
//! module only defines their defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keys the tagger understands. Anything else arrives as `Char` or is dropped
/// by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyCode {
    Enter,
    Space,
    Delete,
    Backspace,
    Escape,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Char(char),
}

impl KeyCode {
    /// Lowercase name, as accepted by [`KeyCode::from_str`].
    pub fn name(&self) -> String {
        match self {
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Space => "space".to_string(),
            KeyCode::Delete => "delete".to_string(),
            KeyCode::Backspace => "backspace".to_string(),
            KeyCode::Escape => "escape".to_string(),
            KeyCode::PageUp => "pageup".to_string(),
            KeyCode::PageDown => "pagedown".to_string(),
            KeyCode::Up => "up".to_string(),
            KeyCode::Down => "down".to_string(),
            KeyCode::Left => "left".to_string(),
            KeyCode::Right => "right".to_string(),
            KeyCode::Char(c) => c.to_string(),
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Error for key names that don't map to a [`KeyCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key '{0}'")]
pub struct UnknownKey(pub String);

impl FromStr for KeyCode {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let key = match lower.as_str() {
            "enter" | "return" => KeyCode::Enter,
            "space" | " " => KeyCode::Space,
            "delete" | "del" => KeyCode::Delete,
            "backspace" => KeyCode::Backspace,
            "escape" | "esc" => KeyCode::Escape,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return Err(UnknownKey(s.to_string())),
                }
            }
        };
        Ok(key)
    }
}

/// Class keys in palette order: entry `i` of a palette built from a
/// directory list is filed by key `i`.
pub const DEFAULT_CLASS_KEYS: &[KeyCode] = &[
    KeyCode::Right,
    KeyCode::Left,
    KeyCode::Up,
    KeyCode::Down,
    KeyCode::Char('x'),
    KeyCode::Char('y'),
    KeyCode::Char('z'),
];

/// What a bound key asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Write crops for every box, then move on
    Commit,
    /// Move on without writing anything
    Skip,
    /// Remove the source file, then move on
    Delete,
}

/// Keybinding configuration for the tagger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    /// Hotkey for committing the boxes of the current image
    #[serde(default = "default_commit")]
    pub commit: KeyCode,
    /// Hotkeys for skipping the current image
    #[serde(default = "default_skip")]
    pub skip: Vec<KeyCode>,
    /// Hotkey for deleting the current image
    #[serde(default = "default_delete")]
    pub delete: KeyCode,
    /// Keys that file the whole image into class `i` in whole mode
    #[serde(default = "default_class_keys")]
    pub class_keys: Vec<KeyCode>,
}

fn default_commit() -> KeyCode {
    KeyCode::Enter
}

fn default_skip() -> Vec<KeyCode> {
    vec![KeyCode::Space, KeyCode::PageDown]
}

fn default_delete() -> KeyCode {
    KeyCode::Delete
}

fn default_class_keys() -> Vec<KeyCode> {
    DEFAULT_CLASS_KEYS.to_vec()
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            commit: default_commit(),
            skip: default_skip(),
            delete: default_delete(),
            class_keys: default_class_keys(),
        }
    }
}

impl KeyBindings {
    /// Get the action bound to a key, if any.
    pub fn action_for_key(&self, key: KeyCode) -> Option<KeyAction> {
        if key == self.commit {
            Some(KeyAction::Commit)
        } else if self.skip.contains(&key) {
            Some(KeyAction::Skip)
        } else if key == self.delete {
            Some(KeyAction::Delete)
        } else {
            None
        }
    }

    /// Keys bound to both an action and a class, if any.
    pub fn conflicts_with<'a>(
        &self,
        class_keys: impl IntoIterator<Item = &'a KeyCode>,
    ) -> Vec<KeyCode> {
        class_keys
            .into_iter()
            .filter(|key| self.action_for_key(**key).is_some())
            .copied()
            .collect()
    }
}
