//! Configuration file support for croptag.
//!
//! Settings that rarely change between runs (window geometry, archive
//! directory, keybindings, log level) live in a JSON file. Class directories
//! come from the command line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::{DEFAULT_COMPLETED_DIR, DEFAULT_MARGIN, DEFAULT_WINDOW_SIZE};
use crate::controller::SizingMode;
use crate::keybindings::KeyBindings;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// How boxes are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TaggerMode {
    /// Drag a box whose width follows its height
    Drag,
    /// Click to drop a fixed-size box
    Tap,
    /// Classify whole images with a keypress
    Whole,
}

impl TaggerMode {
    pub fn name(&self) -> &'static str {
        match self {
            TaggerMode::Drag => "drag",
            TaggerMode::Tap => "tap",
            TaggerMode::Whole => "whole",
        }
    }
}

impl fmt::Display for TaggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaggerMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drag" => Ok(TaggerMode::Drag),
            "tap" => Ok(TaggerMode::Tap),
            "whole" => Ok(TaggerMode::Whole),
            other => Err(ConfigError::Invalid(format!(
                "unknown mode '{other}' (expected drag, tap or whole)"
            ))),
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Where committed and skipped source images are moved
    #[serde(default = "default_completed_dir")]
    pub completed_dir: PathBuf,

    /// Detection window `[width, height]`; fixes the tap size and the drag aspect ratio
    #[serde(default = "default_window_size")]
    pub window_size: [u32; 2],

    /// Fractional `[horizontal, top]` margin around the subject while dragging
    #[serde(default = "default_margin")]
    pub margin: [f32; 2],

    /// Keybinding configuration
    #[serde(default)]
    pub keybindings: KeyBindings,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_completed_dir() -> PathBuf {
    PathBuf::from(DEFAULT_COMPLETED_DIR)
}

fn default_window_size() -> [u32; 2] {
    DEFAULT_WINDOW_SIZE
}

fn default_margin() -> [f32; 2] {
    DEFAULT_MARGIN
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            completed_dir: default_completed_dir(),
            window_size: default_window_size(),
            margin: default_margin(),
            keybindings: KeyBindings::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TaggerConfig {
    /// Deserialize and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that would break the sizing math.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [width, height] = self.window_size;
        if width == 0 || height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be positive, got {width}x{height}"
            )));
        }
        if self.margin.iter().any(|m| !(0.0..1.0).contains(m)) {
            return Err(ConfigError::Invalid(format!(
                "margins must lie in [0, 1), got {:?}",
                self.margin
            )));
        }
        Ok(())
    }

    /// Width over height of the detection window.
    pub fn aspect_ratio(&self) -> f32 {
        self.window_size[0] as f32 / self.window_size[1] as f32
    }

    /// The sizing capability for a tagger mode.
    pub fn sizing_mode(&self, mode: TaggerMode) -> SizingMode {
        match mode {
            TaggerMode::Drag => SizingMode::AspectDrag {
                aspect_ratio: self.aspect_ratio(),
                margin: self.margin,
            },
            TaggerMode::Tap => SizingMode::FixedSize {
                width: self.window_size[0] as f32,
                height: self.window_size[1] as f32,
            },
            TaggerMode::Whole => SizingMode::Whole,
        }
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("croptag").join("config.json"))
        } else {
            dirs::home_dir().map(|home| home.join(".config").join("croptag").join("config.json"))
        }
    }

    /// Load configuration from a file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load from `path` if given, else from the default path if a file
    /// exists there, else defaults.
    ///
    /// An explicitly given file must exist and parse; a broken file at the
    /// default path is reported and ignored.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        let Some(path) = Self::default_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Ok(Self::default());
        }

        match Self::load_from_file(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                log::warn!("Ignoring config file {:?}: {}", path, e);
                Ok(Self::default())
            }
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// Values that parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
