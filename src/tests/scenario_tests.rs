//! Operator scenarios on real files in a temporary directory.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::app::{RunEnd, TaggerApp};
use crate::controller::{EventOutcome, InteractionController, InteractionState, SizingMode};
use crate::data::{ImageCrateDecoder, ImageSource};
use crate::event::{InputEvent, PointerButton, ScrollDirection};
use crate::keybindings::{KeyBindings, KeyCode};
use crate::model::{ClassColor, ClassEntry, ClassPalette};
use crate::render::LogRenderSink;
use crate::replay::EventScript;
use crate::session::AnnotationSession;

const WINDOW: SizingMode = SizingMode::FixedSize {
    width: 64.0,
    height: 128.0,
};

/// Working directory with `pos/`, `neg/` and `completed/`.
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for sub in ["pos", "neg", "completed"] {
        std::fs::create_dir(dir.path().join(sub)).unwrap();
    }
    dir
}

fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let pixels = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    pixels.save(&path).unwrap();
    path
}

fn red_blue(dir: &Path) -> ClassPalette {
    ClassPalette::new(vec![
        ClassEntry::new(ClassColor::Red, dir.join("pos")),
        ClassEntry::new(ClassColor::Blue, dir.join("neg")),
    ])
    .unwrap()
}

fn session(dir: &Path, paths: Vec<PathBuf>) -> AnnotationSession<ImageCrateDecoder> {
    AnnotationSession::new(
        red_blue(dir),
        ImageSource::from_paths(paths),
        ImageCrateDecoder,
        dir.join("completed"),
    )
}

#[test]
fn test_tap_recolor_commit_and_archive() {
    let dir = workspace();
    let img = write_image(dir.path(), "img.jpg", 640, 480);
    let next = write_image(dir.path(), "next.jpg", 640, 480);
    let mut session = session(dir.path(), vec![img.clone(), next.clone()]);
    let mut controller = InteractionController::new(WINDOW, KeyBindings::default());
    session.advance().unwrap();

    controller
        .handle_event(&mut session, &InputEvent::press(PointerButton::Primary, 100.0, 100.0))
        .unwrap();
    assert_eq!(session.boxes().len(), 1);
    let b = session.boxes()[0];
    assert_eq!(b.edges(), (68.0, 36.0, 132.0, 164.0));
    assert_eq!(b.color, ClassColor::Red);

    controller
        .handle_event(&mut session, &InputEvent::scroll(ScrollDirection::Up, 100.0, 100.0))
        .unwrap();
    assert_eq!(session.boxes()[0].color, ClassColor::Blue);

    let report = session.commit().unwrap();
    assert!(report.is_complete());
    let crop_path = dir.path().join("neg").join("img_0.jpg");
    assert_eq!(report.written, vec![crop_path.clone()]);
    let crop = image::open(&crop_path).unwrap();
    assert_eq!((crop.width(), crop.height()), (64, 128));
    assert!(!dir.path().join("pos").join("img_0.jpg").exists());

    assert_eq!(session.advance().unwrap(), next.as_path());
    assert!(!img.exists());
    assert!(dir.path().join("completed").join("img.jpg").exists());
    assert!(session.boxes().is_empty(), "boxes never leak between images");
}

#[test]
fn test_undecodable_image_is_skipped() {
    let dir = workspace();
    let a = dir.path().join("a.jpg");
    std::fs::write(&a, b"not a jpeg at all").unwrap();
    let b = write_image(dir.path(), "b.jpg", 32, 32);
    let mut session = session(dir.path(), vec![a.clone(), b.clone()]);

    assert_eq!(session.advance().unwrap(), b.as_path());
    assert!(a.exists(), "a file that failed to decode stays in place");
}

#[test]
fn test_secondary_press_on_empty_area_is_noop() {
    let dir = workspace();
    let img = write_image(dir.path(), "img.jpg", 640, 480);
    let mut session = session(dir.path(), vec![img]);
    let mut controller = InteractionController::new(WINDOW, KeyBindings::default());
    session.advance().unwrap();

    controller
        .handle_event(&mut session, &InputEvent::press(PointerButton::Primary, 100.0, 100.0))
        .unwrap();
    let outcome = controller
        .handle_event(&mut session, &InputEvent::press(PointerButton::Secondary, 400.0, 400.0))
        .unwrap();

    assert_eq!(outcome, EventOutcome::Ignored);
    assert_eq!(session.boxes().len(), 1);
    assert_eq!(*controller.state(), InteractionState::Idle);
}

#[test]
fn test_replayed_drag_session() {
    let dir = workspace();
    let img = write_image(dir.path(), "street.png", 640, 480);
    let script = "\
# draw one pedestrian, move it, commit
press left 300 100
move 300 150
move 310 212
release left 310 212
press left 300 150
move 10 10
release left 10 10
key enter
";
    let mut app = TaggerApp::new(
        session(dir.path(), vec![img]),
        InteractionController::new(
            SizingMode::AspectDrag {
                aspect_ratio: 0.5,
                margin: [0.25, 0.125],
            },
            KeyBindings::default(),
        ),
        LogRenderSink::new(),
    );

    let summary = app.run(EventScript::new(script.as_bytes()));

    assert_eq!(summary.end, RunEnd::Exhausted);
    assert_eq!(summary.events, 8);
    let crop = image::open(dir.path().join("pos").join("street_0.png"))
        .unwrap()
        .to_rgb8();
    assert_eq!(crop.dimensions(), (64, 128));
    // the box was dropped with its origin at (10, 10)
    assert_eq!(crop.get_pixel(0, 0), &image::Rgb([10, 10, 90]));
    assert!(dir.path().join("completed").join("street.png").exists());
}

#[test]
fn test_whole_mode_files_every_image() {
    let dir = workspace();
    let paths = vec![
        write_image(dir.path(), "1.png", 8, 8),
        write_image(dir.path(), "2.png", 8, 8),
        write_image(dir.path(), "3.png", 8, 8),
    ];
    let palette =
        ClassPalette::from_dirs(&[dir.path().join("pos"), dir.path().join("neg")]).unwrap();
    let mut app = TaggerApp::new(
        AnnotationSession::new(
            palette,
            ImageSource::from_paths(paths),
            ImageCrateDecoder,
            dir.path().join("completed"),
        ),
        InteractionController::new(SizingMode::Whole, KeyBindings::default()),
        LogRenderSink::new(),
    );

    let summary = app.run(vec![
        InputEvent::key(KeyCode::Right),
        InputEvent::key(KeyCode::Left),
        InputEvent::key(KeyCode::Space),
    ]);

    assert_eq!(summary.end, RunEnd::Exhausted);
    assert!(dir.path().join("pos").join("1.png").exists());
    assert!(dir.path().join("neg").join("2.png").exists());
    assert!(dir.path().join("completed").join("3.png").exists());
}
