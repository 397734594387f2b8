//! Class colors and the color-to-directory palette.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::keybindings::{DEFAULT_CLASS_KEYS, KeyCode};

/// Fixed set of colors a box can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassColor {
    Blue,
    Purple,
    Red,
    Green,
    Yellow,
    Cyan,
    Teal,
}

impl ClassColor {
    /// All colors, in the order classes are assigned them.
    pub fn all() -> &'static [ClassColor] {
        &[
            ClassColor::Blue,
            ClassColor::Purple,
            ClassColor::Red,
            ClassColor::Green,
            ClassColor::Yellow,
            ClassColor::Cyan,
            ClassColor::Teal,
        ]
    }

    /// Lowercase name, as used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            ClassColor::Blue => "blue",
            ClassColor::Purple => "purple",
            ClassColor::Red => "red",
            ClassColor::Green => "green",
            ClassColor::Yellow => "yellow",
            ClassColor::Cyan => "cyan",
            ClassColor::Teal => "teal",
        }
    }

    /// RGB value for drawing box outlines.
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            ClassColor::Blue => [0, 0, 255],
            ClassColor::Purple => [128, 0, 128],
            ClassColor::Red => [255, 0, 0],
            ClassColor::Green => [0, 128, 0],
            ClassColor::Yellow => [191, 191, 0],
            ClassColor::Cyan => [0, 191, 191],
            ClassColor::Teal => [0, 128, 128],
        }
    }
}

impl fmt::Display for ClassColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One class: the color boxes of this class carry and where their crops go.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntry {
    pub color: ClassColor,
    /// Key that files a whole image under this class (whole-image mode).
    pub key: Option<KeyCode>,
    pub output_dir: PathBuf,
}

impl ClassEntry {
    pub fn new(color: ClassColor, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            color,
            key: None,
            output_dir: output_dir.into(),
        }
    }

    pub fn with_key(mut self, key: KeyCode) -> Self {
        self.key = Some(key);
        self
    }
}

/// Direction to step through the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Forward,
    Backward,
}

/// Ordered mapping from class colors to output directories.
///
/// Never empty, at most one entry per [`ClassColor`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPalette {
    entries: Vec<ClassEntry>,
}

impl ClassPalette {
    /// Build a palette from explicit entries.
    ///
    /// Returns `None` if `entries` is empty or repeats a color.
    pub fn new(entries: Vec<ClassEntry>) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        let repeated = entries
            .iter()
            .enumerate()
            .any(|(i, e)| entries[..i].iter().any(|prev| prev.color == e.color));
        if repeated {
            return None;
        }
        Some(Self { entries })
    }

    /// Build a palette from an ordered list of directories.
    ///
    /// Entry `i` gets the `i`-th color and the `i`-th default class key.
    /// Returns `None` for an empty list or more directories than colors.
    pub fn from_dirs<P: AsRef<Path>>(dirs: &[P]) -> Option<Self> {
        Self::from_dirs_with_keys(dirs, DEFAULT_CLASS_KEYS)
    }

    /// Like [`ClassPalette::from_dirs`] with explicit class keys.
    ///
    /// Directories beyond the end of `keys` get no key.
    pub fn from_dirs_with_keys<P: AsRef<Path>>(dirs: &[P], keys: &[KeyCode]) -> Option<Self> {
        if dirs.len() > ClassColor::all().len() {
            return None;
        }
        let entries = dirs
            .iter()
            .zip(ClassColor::all())
            .enumerate()
            .map(|(i, (dir, color))| {
                let entry = ClassEntry::new(*color, dir.as_ref());
                match keys.get(i) {
                    Some(key) => entry.with_key(*key),
                    None => entry,
                }
            })
            .collect();
        Self::new(entries)
    }

    pub fn entries(&self) -> &[ClassEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Color given to newly created boxes.
    pub fn default_color(&self) -> ClassColor {
        self.entries[0].color
    }

    /// Output directory for a color, if the color is part of the palette.
    pub fn dir_for(&self, color: ClassColor) -> Option<&Path> {
        self.entries
            .iter()
            .find(|e| e.color == color)
            .map(|e| e.output_dir.as_path())
    }

    /// Index of the class bound to `key`, if any.
    pub fn class_for_key(&self, key: KeyCode) -> Option<usize> {
        self.entries.iter().position(|e| e.key == Some(key))
    }

    /// The color after (or before) `color`, wrapping around the palette.
    ///
    /// A color outside the palette steps from the first entry.
    pub fn cycle(&self, color: ClassColor, direction: CycleDirection) -> ClassColor {
        let len = self.entries.len();
        let index = self
            .entries
            .iter()
            .position(|e| e.color == color)
            .unwrap_or(0);
        let next = match direction {
            CycleDirection::Forward => (index + 1) % len,
            CycleDirection::Backward => (index + len - 1) % len,
        };
        self.entries[next].color
    }
}
