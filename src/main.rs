//! croptag command-line entry point.
//!
//! ```text
//! croptag [--config FILE] [--events FILE] MODE DIRS [FILES...]
//! ```
//!
//! Events are read as a script (see [`croptag::replay`]) from stdin unless
//! `--events` is given.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use clap::builder::TypedValueParser;
use clap::{ArgAction, Parser};
use croptag::config::{TaggerConfig, TaggerMode};
use croptag::data::{ImageCrateDecoder, ImageSource};
use croptag::model::ClassPalette;
use croptag::render::LogRenderSink;
use croptag::replay::EventScript;
use croptag::session::ensure_directory;
use croptag::{AnnotationSession, InteractionController, SetupError, TaggerApp};

/// Tag regions of images with colored boxes and crop them into class folders.
#[derive(Parser, Debug)]
#[command(name = "croptag", version)]
struct Cli {
    /// Configuration file (default: the user config directory)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Read the event script from this file instead of stdin
    #[arg(long, short)]
    events: Option<PathBuf>,

    /// How boxes are created
    #[arg(value_enum)]
    mode: TaggerMode,

    /// Comma-separated class directories, e.g. pos,neg
    #[arg(value_delimiter = ',', num_args = 1, value_parser = clap::builder::OsStringValueParser::new().map(PathBuf::from), action = ArgAction::Set, required = true)]
    dirs: Vec<PathBuf>,

    /// Images to tag (default: image files in the current directory)
    files: Vec<PathBuf>,
}

impl Cli {
    /// Class directories with empty entries from stray commas removed.
    fn class_dirs(&self) -> Vec<PathBuf> {
        self.dirs
            .iter()
            .filter(|d| !d.as_os_str().is_empty())
            .cloned()
            .collect()
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("croptag: {e}");
        std::process::exit(2);
    }
}

fn run(args: Cli) -> Result<(), SetupError> {
    let config = TaggerConfig::load(args.config.as_deref())?;

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let conflicts = config
        .keybindings
        .conflicts_with(&config.keybindings.class_keys);
    if !conflicts.is_empty() {
        log::warn!("Keys bound to both an action and a class: {:?}", conflicts);
    }

    let palette =
        ClassPalette::from_dirs_with_keys(&args.class_dirs(), &config.keybindings.class_keys)
            .ok_or_else(|| SetupError::usage("expected between 1 and 7 class directories"))?;
    for entry in palette.entries() {
        ensure_directory(&entry.output_dir)?;
        log::info!(
            "Class {} -> {:?} (key {})",
            entry.color,
            entry.output_dir,
            entry.key.map(|k| k.to_string()).unwrap_or_else(|| "none".to_string())
        );
    }
    ensure_directory(&config.completed_dir)?;

    let source = if args.files.is_empty() {
        ImageSource::from_directory(&std::env::current_dir()?, &ImageCrateDecoder)?
    } else {
        ImageSource::from_paths(args.files)
    };

    let session = AnnotationSession::new(
        palette,
        source,
        ImageCrateDecoder,
        config.completed_dir.clone(),
    );
    let controller =
        InteractionController::new(config.sizing_mode(args.mode), config.keybindings.clone());
    let mut app = TaggerApp::new(session, controller, LogRenderSink::new());

    let reader: Box<dyn BufRead> = match &args.events {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(std::io::stdin().lock()),
    };
    let summary = app.run(EventScript::new(reader));
    log::info!(
        "Finished ({:?}): {} events, {} images in {:.1?}",
        summary.end,
        summary.events,
        summary.images_visited,
        summary.elapsed
    );
    Ok(())
}
