//! Per-image annotation state and the commit / advance protocol.
//!
//! The session owns the boxes of the current image and the cursor over the
//! image source. Boxes never outlive their image: every way of leaving an
//! image goes through [`AnnotationSession::advance`], which clears them.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};

use crate::data::{ImageDecoder, ImageSource};
use crate::error::{Exhausted, FileSystemError, PersistError};
use crate::model::{AnnotationBox, BoxId, ClassColor, ClassPalette, CycleDirection, hit_test};

/// The image currently shown to the operator.
#[derive(Debug)]
struct CurrentImage {
    path: PathBuf,
    pixels: DynamicImage,
    /// Cleared once the file was deleted or filed elsewhere.
    archive_on_leave: bool,
}

/// A box whose crop could not be written.
#[derive(Debug)]
pub struct BoxFailure {
    /// Position of the box in the commit (same ordinal the filename would use).
    pub ordinal: usize,
    pub id: BoxId,
    pub error: PersistError,
}

/// Outcome of a commit. Boxes are independent: failures never undo writes.
#[derive(Debug, Default)]
pub struct CommitReport {
    /// Files written, in box order.
    pub written: Vec<PathBuf>,
    pub failures: Vec<BoxFailure>,
}

impl CommitReport {
    /// Whether every box was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line summary for the status message.
    pub fn summary(&self) -> String {
        let names: Vec<String> = self
            .written
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        if self.failures.is_empty() {
            format!("Saved {names:?}")
        } else {
            let errors: Vec<String> = self
                .failures
                .iter()
                .map(|f| format!("box {}: {}", f.ordinal, f.error))
                .collect();
            format!("Saved {names:?}; failed {}", errors.join("; "))
        }
    }
}

/// Live annotation state for the current image plus the cursor over the source.
#[derive(Debug)]
pub struct AnnotationSession<D: ImageDecoder> {
    palette: ClassPalette,
    source: ImageSource,
    decoder: D,
    completed_dir: PathBuf,
    current: Option<CurrentImage>,
    /// Insertion order is hit-test priority.
    boxes: Vec<AnnotationBox>,
    next_id: BoxId,
    status_message: Option<String>,
}

impl<D: ImageDecoder> AnnotationSession<D> {
    /// Create a session. No image is loaded until the first [`advance`](Self::advance).
    pub fn new(
        palette: ClassPalette,
        source: ImageSource,
        decoder: D,
        completed_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            palette,
            source,
            decoder,
            completed_dir: completed_dir.into(),
            current: None,
            boxes: Vec::new(),
            next_id: 1,
            status_message: None,
        }
    }

    pub fn palette(&self) -> &ClassPalette {
        &self.palette
    }

    pub fn completed_dir(&self) -> &Path {
        &self.completed_dir
    }

    /// Path of the current image.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|c| c.path.as_path())
    }

    /// Decoded pixels of the current image.
    pub fn image(&self) -> Option<&DynamicImage> {
        self.current.as_ref().map(|c| &c.pixels)
    }

    /// `(width, height)` of the current image.
    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image().map(|img| (img.width(), img.height()))
    }

    pub fn boxes(&self) -> &[AnnotationBox] {
        &self.boxes
    }

    pub fn get_box(&self, id: BoxId) -> Option<&AnnotationBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    pub fn box_mut(&mut self, id: BoxId) -> Option<&mut AnnotationBox> {
        self.boxes.iter_mut().find(|b| b.id == id)
    }

    /// First box, in insertion order, containing the point.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<BoxId> {
        hit_test(&self.boxes, x, y).map(|b| b.id)
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Replace the operator-visible status line.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    // ========================================================================
    // Box mutators
    // ========================================================================

    /// Add a box with the palette's default color.
    ///
    /// Returns `None` when no image is loaded; boxes only exist on an image.
    pub fn add_box(&mut self, x: f32, y: f32, width: f32, height: f32) -> Option<BoxId> {
        self.current.as_ref()?;
        let id = self.next_id;
        self.next_id += 1;
        let color = self.palette.default_color();
        self.boxes.push(AnnotationBox::new(id, x, y, width, height, color));
        log::debug!("Added box {} at ({:.0}, {:.0}) {:.0}x{:.0}", id, x, y, width, height);
        Some(id)
    }

    /// Remove a box. Removing an unknown id is a no-op that returns `false`.
    pub fn remove_box(&mut self, id: BoxId) -> bool {
        let before = self.boxes.len();
        self.boxes.retain(|b| b.id != id);
        let removed = self.boxes.len() != before;
        if removed {
            log::debug!("Removed box {}", id);
        }
        removed
    }

    /// Set a box's class color. Fails (returns `false`) for unknown ids and
    /// colors outside the palette.
    pub fn recolor_box(&mut self, id: BoxId, color: ClassColor) -> bool {
        if self.palette.dir_for(color).is_none() {
            return false;
        }
        match self.box_mut(id) {
            Some(b) => {
                b.color = color;
                true
            }
            None => false,
        }
    }

    /// Step a box's color through the palette, wrapping. Returns the new color.
    pub fn cycle_color(&mut self, id: BoxId, direction: CycleDirection) -> Option<ClassColor> {
        let current = self.get_box(id)?.color;
        let next = self.palette.cycle(current, direction);
        self.recolor_box(id, next);
        log::debug!("Box {} color {} -> {}", id, current, next);
        Some(next)
    }

    /// Move a box's origin to `(x, y)`, then clamp it inside the image.
    pub fn move_box(&mut self, id: BoxId, x: f32, y: f32) -> bool {
        let Some((width, height)) = self.image_size() else {
            return false;
        };
        match self.box_mut(id) {
            Some(b) => {
                b.x = x;
                b.y = y;
                *b = b.clamped_to_bounds(width, height);
                true
            }
            None => false,
        }
    }

    /// Bring a freshly sized box into canonical, in-bounds form.
    ///
    /// A box with an extent below `min_size` is removed instead. Returns
    /// whether the box was kept.
    pub fn finalize_box(&mut self, id: BoxId, min_size: f32) -> bool {
        let Some((width, height)) = self.image_size() else {
            return false;
        };
        let keep = match self.box_mut(id) {
            Some(b) if b.has_min_size(min_size) => {
                *b = b.fitted_to_bounds(width, height);
                true
            }
            Some(_) => false,
            None => return false,
        };
        if !keep {
            log::debug!("Discarding box {} smaller than {} px", id, min_size);
            self.remove_box(id);
        }
        keep
    }

    // ========================================================================
    // Commit / advance
    // ========================================================================

    /// Crop every box out of the current image into its class directory.
    ///
    /// Crops are named `{stem}_{ordinal}.{ext}` after the source file.
    /// A failing box is recorded in the report and the remaining boxes are
    /// still written.
    pub fn commit(&mut self) -> Result<CommitReport, PersistError> {
        let current = self.current.as_ref().ok_or(PersistError::NoCurrentImage)?;
        let started = web_time::Instant::now();

        let naming = OutputNaming::for_source(&current.path)?;
        let mut report = CommitReport::default();

        for (ordinal, b) in self.boxes.iter().enumerate() {
            let result = self
                .palette
                .dir_for(b.color)
                .ok_or(PersistError::UnknownClass { color: b.color })
                .and_then(|dir| write_crop(&current.pixels, b, ordinal, dir, &naming));
            match result {
                Ok(path) => {
                    log::debug!("Wrote box {} to {:?}", b.id, path);
                    report.written.push(path);
                }
                Err(error) => {
                    log::error!("Failed to save box {}: {}", ordinal, error);
                    report.failures.push(BoxFailure {
                        ordinal,
                        id: b.id,
                        error,
                    });
                }
            }
        }

        log::info!(
            "💾 Committed {:?}: {} written, {} failed in {:?}",
            current.path,
            report.written.len(),
            report.failures.len(),
            started.elapsed()
        );
        self.status_message = Some(report.summary());
        Ok(report)
    }

    /// Leave the current image and load the next decodable one.
    ///
    /// Clears all boxes. The outgoing image is archived into the completed
    /// directory unless it was deleted or filed elsewhere; an archive
    /// failure becomes the status message. Candidates that fail to decode
    /// are skipped. Returns [`Exhausted`] once the source is drained.
    pub fn advance(&mut self) -> Result<&Path, Exhausted> {
        self.boxes.clear();

        if let Some(outgoing) = self.current.take() {
            if outgoing.archive_on_leave {
                self.archive(&outgoing.path);
            }
        }

        loop {
            let Some(path) = self.source.next_path() else {
                log::info!("No more images");
                return Err(Exhausted);
            };
            match self.decoder.decode(&path) {
                Ok(pixels) => {
                    log::info!(
                        "📷 Showing {:?} ({}x{})",
                        path,
                        pixels.width(),
                        pixels.height()
                    );
                    let current = self.current.insert(CurrentImage {
                        path,
                        pixels,
                        archive_on_leave: true,
                    });
                    return Ok(&current.path);
                }
                Err(e) => {
                    log::warn!("Skipping {:?}: {}", path, e);
                }
            }
        }
    }

    /// Remove the current source file from disk.
    ///
    /// Whatever the outcome, the next advance leaves the file where it is.
    pub fn delete_current_image(&mut self) -> Result<(), FileSystemError> {
        let current = self.current.as_mut().ok_or(FileSystemError::NoCurrentImage)?;
        current.archive_on_leave = false;
        let path = current.path.clone();

        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::info!("🗑️ Deleted {:?}", path);
                self.status_message = Some(format!("Deleted {}", path.display()));
                Ok(())
            }
            Err(source) => {
                let error = FileSystemError::Remove { path, source };
                log::warn!("{}", error);
                self.status_message = Some(error.to_string());
                Err(error)
            }
        }
    }

    /// File the whole current image, unchanged, under class `class_index`.
    ///
    /// Returns the new location. Whatever the outcome, the next advance
    /// leaves the file where it is.
    pub fn classify_current(&mut self, class_index: usize) -> Result<PathBuf, FileSystemError> {
        let dir = self
            .palette
            .entries()
            .get(class_index)
            .map(|e| e.output_dir.clone())
            .ok_or(FileSystemError::UnknownClass { index: class_index })?;
        let current = self.current.as_mut().ok_or(FileSystemError::NoCurrentImage)?;
        current.archive_on_leave = false;
        let from = current.path.clone();
        let to = dir.join(from.file_name().unwrap_or(from.as_os_str()));

        match std::fs::rename(&from, &to) {
            Ok(()) => {
                log::info!("Moved {:?} to {:?}", from, dir);
                self.status_message =
                    Some(format!("Moved {} to {}.", from.display(), dir.display()));
                Ok(to)
            }
            Err(source) => {
                let error = FileSystemError::rename(from, to, source);
                log::warn!("{}", error);
                self.status_message = Some(error.to_string());
                Err(error)
            }
        }
    }

    fn archive(&mut self, path: &Path) {
        let to = self
            .completed_dir
            .join(path.file_name().unwrap_or(path.as_os_str()));
        if let Err(source) = std::fs::rename(path, &to) {
            let error = FileSystemError::rename(path, to, source);
            log::warn!("Couldn't move image to completed folder: {}", error);
            self.status_message = Some(format!("Couldn't move image to completed folder: {error}"));
        } else {
            log::debug!("Archived {:?} to {:?}", path, to);
        }
    }
}

/// Output filename parts derived from the source image.
struct OutputNaming {
    stem: String,
    extension: String,
    format: ImageFormat,
}

impl OutputNaming {
    fn for_source(path: &Path) -> Result<Self, PersistError> {
        let unsupported = || PersistError::UnsupportedExtension {
            path: path.to_path_buf(),
        };
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(unsupported)?;
        let format = ImageFormat::from_extension(extension).ok_or_else(unsupported)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(unsupported)?;
        Ok(Self {
            stem,
            extension: extension.to_string(),
            format,
        })
    }

    fn file_name(&self, ordinal: usize) -> String {
        format!("{}_{}.{}", self.stem, ordinal, self.extension)
    }
}

fn write_crop(
    image: &DynamicImage,
    b: &AnnotationBox,
    ordinal: usize,
    dir: &Path,
    naming: &OutputNaming,
) -> Result<PathBuf, PersistError> {
    let rect = b
        .normalized()
        .pixel_rect(image.width(), image.height())
        .ok_or(PersistError::EmptyRegion { ordinal })?;
    let mut crop = image.crop_imm(rect.x, rect.y, rect.width, rect.height);
    if naming.format == ImageFormat::Jpeg && crop.color().has_alpha() {
        crop = DynamicImage::ImageRgb8(crop.to_rgb8());
    }

    let path = dir.join(naming.file_name(ordinal));
    match crop.save_with_format(&path, naming.format) {
        Ok(()) => Ok(path),
        Err(source) => Err(PersistError::Write { path, source }),
    }
}

/// Make sure `path` is a directory, creating it (and parents) if absent.
pub fn ensure_directory(path: &Path) -> Result<(), FileSystemError> {
    if path.exists() {
        if path.is_dir() {
            return Ok(());
        }
        return Err(FileSystemError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    std::fs::create_dir_all(path).map_err(|source| FileSystemError::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Created directory {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ImageCrateDecoder;
    use crate::model::ClassEntry;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            for sub in ["pos", "neg", "tagged"] {
                std::fs::create_dir(dir.path().join(sub)).unwrap();
            }
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn image(&self, name: &str, width: u32, height: u32) -> PathBuf {
            let path = self.path(name);
            image::RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 7]))
                .save(&path)
                .unwrap();
            path
        }

        fn session(&self, paths: Vec<PathBuf>) -> AnnotationSession<ImageCrateDecoder> {
            let palette = ClassPalette::new(vec![
                ClassEntry::new(ClassColor::Red, self.path("pos")),
                ClassEntry::new(ClassColor::Blue, self.path("neg")),
            ])
            .unwrap();
            AnnotationSession::new(
                palette,
                ImageSource::from_paths(paths),
                ImageCrateDecoder,
                self.path("tagged"),
            )
        }
    }

    #[test]
    fn test_no_boxes_without_image() {
        let fx = Fixture::new();
        let mut session = fx.session(vec![]);
        assert!(session.add_box(0.0, 0.0, 10.0, 10.0).is_none());
        assert!(matches!(session.commit(), Err(PersistError::NoCurrentImage)));
        assert_eq!(session.advance().unwrap_err(), Exhausted);
    }

    #[test]
    fn test_advance_clears_boxes_and_archives() {
        let fx = Fixture::new();
        let a = fx.image("a.png", 40, 30);
        let b = fx.image("b.png", 40, 30);
        let mut session = fx.session(vec![a.clone(), b.clone()]);

        assert_eq!(session.advance().unwrap(), a.as_path());
        session.add_box(1.0, 1.0, 5.0, 5.0).unwrap();
        assert_eq!(session.boxes().len(), 1);

        assert_eq!(session.advance().unwrap(), b.as_path());
        assert!(session.boxes().is_empty());
        assert!(!a.exists());
        assert!(fx.path("tagged").join("a.png").exists());
    }

    #[test]
    fn test_advance_skips_undecodable_without_archiving_them() {
        let fx = Fixture::new();
        let broken = fx.path("broken.png");
        std::fs::write(&broken, b"garbage").unwrap();
        let missing = fx.path("missing.png");
        let good = fx.image("good.png", 8, 8);

        let mut session = fx.session(vec![broken.clone(), missing, good.clone()]);
        assert_eq!(session.advance().unwrap(), good.as_path());
        assert!(broken.exists());
        assert_eq!(session.advance().unwrap_err(), Exhausted);
        assert_eq!(session.advance().unwrap_err(), Exhausted);
    }

    #[test]
    fn test_archive_failure_becomes_status() {
        let fx = Fixture::new();
        let a = fx.image("a.png", 8, 8);
        let mut session = fx.session(vec![a.clone()]);
        session.advance().unwrap();
        std::fs::remove_file(&a).unwrap();

        assert_eq!(session.advance().unwrap_err(), Exhausted);
        assert!(
            session
                .status_message()
                .unwrap()
                .starts_with("Couldn't move image to completed folder")
        );
    }

    #[test]
    fn test_commit_names_and_crops() {
        let fx = Fixture::new();
        let img = fx.image("img.png", 64, 48);
        let mut session = fx.session(vec![img]);
        session.advance().unwrap();

        let first = session.add_box(10.0, 5.0, 20.0, 10.0).unwrap();
        let second = session.add_box(30.0, 30.0, -10.0, -20.0).unwrap();
        assert!(session.recolor_box(second, ClassColor::Blue));

        let report = session.commit().unwrap();
        assert!(report.is_complete());
        assert_eq!(
            report.written,
            vec![fx.path("pos").join("img_0.png"), fx.path("neg").join("img_1.png")]
        );

        let crop = image::open(fx.path("pos").join("img_0.png")).unwrap().to_rgb8();
        assert_eq!(crop.dimensions(), (20, 10));
        assert_eq!(crop.get_pixel(0, 0), &image::Rgb([10, 5, 7]));

        let flipped = image::open(fx.path("neg").join("img_1.png")).unwrap();
        assert_eq!((flipped.width(), flipped.height()), (10, 20));
        assert!(session.get_box(first).is_some());
        assert!(session.status_message().unwrap().starts_with("Saved"));
    }

    #[test]
    fn test_commit_is_per_box_independent() {
        let fx = Fixture::new();
        let img = fx.image("img.png", 64, 64);
        let mut session = fx.session(vec![img]);
        session.advance().unwrap();

        session.add_box(0.0, 0.0, 8.0, 8.0).unwrap();
        let failing = session.add_box(8.0, 8.0, 8.0, 8.0).unwrap();
        session.add_box(16.0, 16.0, 8.0, 8.0).unwrap();
        session.recolor_box(failing, ClassColor::Blue);
        std::fs::remove_dir(fx.path("neg")).unwrap();

        let report = session.commit().unwrap();
        assert_eq!(
            report.written,
            vec![fx.path("pos").join("img_0.png"), fx.path("pos").join("img_2.png")]
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].ordinal, 1);
        assert_eq!(report.failures[0].id, failing);
        assert!(matches!(report.failures[0].error, PersistError::Write { .. }));
        assert!(fx.path("pos").join("img_0.png").exists());
        assert!(fx.path("pos").join("img_2.png").exists());
    }

    #[test]
    fn test_commit_rejects_unknown_extension() {
        let fx = Fixture::new();
        let img = fx.image("img.png", 16, 16);
        let odd = fx.path("img.data");
        std::fs::rename(&img, &odd).unwrap();

        struct PngDecoder;
        impl ImageDecoder for PngDecoder {
            fn id(&self) -> &'static str {
                "png"
            }
            fn extensions(&self) -> &'static [&'static str] {
                &["data"]
            }
            fn decode(&self, path: &Path) -> Result<DynamicImage, crate::error::DecodeError> {
                let bytes = std::fs::read(path).unwrap();
                Ok(image::load_from_memory(&bytes).unwrap())
            }
        }

        let mut session = AnnotationSession::new(
            ClassPalette::from_dirs(&[fx.path("pos")]).unwrap(),
            ImageSource::from_paths([odd]),
            PngDecoder,
            fx.path("tagged"),
        );
        session.advance().unwrap();
        session.add_box(0.0, 0.0, 4.0, 4.0).unwrap();
        assert!(matches!(
            session.commit(),
            Err(PersistError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn test_mutators_on_unknown_ids_are_noops() {
        let fx = Fixture::new();
        let img = fx.image("img.png", 16, 16);
        let mut session = fx.session(vec![img]);
        session.advance().unwrap();

        assert!(!session.remove_box(42));
        assert!(!session.recolor_box(42, ClassColor::Blue));
        assert!(!session.move_box(42, 1.0, 1.0));
        assert!(session.cycle_color(42, CycleDirection::Forward).is_none());

        let id = session.add_box(0.0, 0.0, 4.0, 4.0).unwrap();
        assert!(!session.recolor_box(id, ClassColor::Teal), "teal is not in the palette");
        assert!(session.remove_box(id));
        assert!(!session.remove_box(id));
    }

    #[test]
    fn test_move_box_clamps() {
        let fx = Fixture::new();
        let img = fx.image("img.png", 100, 50);
        let mut session = fx.session(vec![img]);
        session.advance().unwrap();

        let id = session.add_box(0.0, 0.0, 20.0, 20.0).unwrap();
        assert!(session.move_box(id, 95.0, 45.0));
        let b = session.get_box(id).unwrap();
        assert_eq!((b.x, b.y, b.width, b.height), (80.0, 30.0, 20.0, 20.0));
    }

    #[test]
    fn test_finalize_discards_degenerate_boxes() {
        let fx = Fixture::new();
        let img = fx.image("img.png", 100, 50);
        let mut session = fx.session(vec![img]);
        session.advance().unwrap();

        let tiny = session.add_box(10.0, 10.0, 0.0, 0.0).unwrap();
        assert!(!session.finalize_box(tiny, 1.0));
        assert!(session.get_box(tiny).is_none());

        let tall = session.add_box(10.0, 40.0, 20.0, -80.0).unwrap();
        assert!(session.finalize_box(tall, 1.0));
        let b = session.get_box(tall).unwrap();
        assert_eq!((b.x, b.y, b.width, b.height), (13.75, 0.0, 12.5, 50.0));
    }

    #[test]
    fn test_delete_and_classify_are_not_archived() {
        let fx = Fixture::new();
        let a = fx.image("a.png", 8, 8);
        let b = fx.image("b.png", 8, 8);
        let mut session = fx.session(vec![a.clone(), b.clone()]);

        session.advance().unwrap();
        session.delete_current_image().unwrap();
        assert!(!a.exists());
        session.advance().unwrap();
        assert!(!fx.path("tagged").join("a.png").exists());

        let moved = session.classify_current(1).unwrap();
        assert_eq!(moved, fx.path("neg").join("b.png"));
        assert!(moved.exists());
        assert_eq!(session.advance().unwrap_err(), Exhausted);
        assert!(!fx.path("tagged").join("b.png").exists());
    }

    #[test]
    fn test_delete_failure_is_reported() {
        let fx = Fixture::new();
        let a = fx.image("a.png", 8, 8);
        let mut session = fx.session(vec![a.clone()]);
        session.advance().unwrap();
        std::fs::remove_file(&a).unwrap();

        assert!(matches!(
            session.delete_current_image(),
            Err(FileSystemError::Remove { .. })
        ));
        assert!(session.status_message().unwrap().contains("unable to delete"));
        assert!(matches!(
            session.classify_current(5),
            Err(FileSystemError::UnknownClass { index: 5 })
        ));
    }

    #[test]
    fn test_ensure_directory() {
        let fx = Fixture::new();
        let nested = fx.path("out").join("deeper");
        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_directory(&nested).unwrap();

        let file = fx.image("file.png", 2, 2);
        assert!(matches!(
            ensure_directory(&file),
            Err(FileSystemError::NotADirectory { .. })
        ));
    }
}
