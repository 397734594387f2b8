//! Error types for tagging operations.
//!
//! Only [`Exhausted`] ends a session. Every other error is caught where it
//! happens and turned into a status message for the operator.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::model::ClassColor;

/// An image could not be opened or decoded. The image is skipped.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The file could not be read
    #[error("unable to read {path:?}: {source}")]
    Io {
        /// Path of the unreadable file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not a decodable image
    #[error("unable to decode {path:?}: {source}")]
    Image {
        /// Path of the undecodable file
        path: PathBuf,
        /// Underlying decoder error
        #[source]
        source: image::ImageError,
    },
}

impl DecodeError {
    /// Wrap an `image` error for the given path, keeping I/O failures distinct.
    pub fn from_image(path: impl Into<PathBuf>, error: image::ImageError) -> Self {
        let path = path.into();
        match error {
            image::ImageError::IoError(source) => Self::Io { path, source },
            source => Self::Image { path, source },
        }
    }
}

/// A crop could not be produced or written.
#[derive(Error, Debug)]
pub enum PersistError {
    /// Commit requested while no image is loaded
    #[error("no image is loaded")]
    NoCurrentImage,

    /// The box color has no output directory in the class palette
    #[error("no output directory for class color '{color}'")]
    UnknownClass {
        /// The unmapped color
        color: ClassColor,
    },

    /// The source file name has no extension usable as an output format
    #[error("cannot derive an output format from {path:?}")]
    UnsupportedExtension {
        /// Source image path
        path: PathBuf,
    },

    /// The box does not cover any pixel of the image
    #[error("box {ordinal} does not overlap the image")]
    EmptyRegion {
        /// Ordinal of the box in the commit
        ordinal: usize,
    },

    /// Encoding or writing the crop failed
    #[error("unable to write {path:?}: {source}")]
    Write {
        /// Output path that failed
        path: PathBuf,
        /// Underlying encoder error
        #[source]
        source: image::ImageError,
    },
}

/// A delete, move or directory operation failed.
#[derive(Error, Debug)]
pub enum FileSystemError {
    /// Removing a file failed
    #[error("unable to delete {path:?}: {source}")]
    Remove {
        /// File that could not be removed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Moving a file failed
    #[error("unable to move {from:?} to {to:?}: {source}")]
    Rename {
        /// Original location
        from: PathBuf,
        /// Intended destination
        to: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Creating a directory failed
    #[error("unable to create directory {path:?}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A path that must be a directory exists as something else
    #[error("{path:?} exists and is not a directory")]
    NotADirectory {
        /// The offending path
        path: PathBuf,
    },

    /// An operation needed a current image but none is loaded
    #[error("no image is loaded")]
    NoCurrentImage,

    /// Class index outside the palette
    #[error("no class with index {index}")]
    UnknownClass {
        /// The requested class index
        index: usize,
    },
}

impl FileSystemError {
    /// Create a rename error.
    pub fn rename(
        from: impl Into<PathBuf>,
        to: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Rename {
            from: from.into(),
            to: to.into(),
            source,
        }
    }
}

/// The image source has no more images. Terminal for the session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no more images")]
pub struct Exhausted;

/// Fatal problems detected before the first image is shown.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Bad command line
    #[error("{0}")]
    Usage(String),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An output or archive directory could not be prepared
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    /// Reading the image or event source failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SetupError {
    /// Create a usage error with a message.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}
