//! Forward-only sources of candidate image paths.

use std::fmt;
use std::path::{Path, PathBuf};

use super::loader::ImageDecoder;

/// Lazy, forward-only, non-restartable sequence of image paths.
pub struct ImageSource {
    paths: Box<dyn Iterator<Item = PathBuf>>,
}

impl ImageSource {
    /// Wrap any iterator of paths.
    pub fn new(paths: impl Iterator<Item = PathBuf> + 'static) -> Self {
        Self {
            paths: Box::new(paths),
        }
    }

    /// Source over explicitly given paths, in the given order.
    pub fn from_paths<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        Self::new(paths.into_iter())
    }

    /// Source over the image files of a directory, sorted by name.
    ///
    /// Only regular files with an extension `decoder` handles are listed.
    pub fn from_directory<D: ImageDecoder>(dir: &Path, decoder: &D) -> std::io::Result<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && decoder.is_supported_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        log::info!("📂 Found {} images in {:?}", paths.len(), dir);
        Ok(Self::new(paths.into_iter()))
    }

    /// Pull the next candidate, or `None` once drained.
    pub fn next_path(&mut self) -> Option<PathBuf> {
        self.paths.next()
    }
}

impl Iterator for ImageSource {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        self.next_path()
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSource").finish_non_exhaustive()
    }
}
