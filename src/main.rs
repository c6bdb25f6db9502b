use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use study_volume::{
    Navigator, SortBy, Study, StudyCursor, ViewMode, WindowEdges, WindowedCursor,
    config::{DEFAULT_PREFERENCES_FILE, PREFERENCES_ENV, Preferences},
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Single,
    Quad,
    Windowed,
    Reconstruction,
    Sagittal,
    Coronal,
}

impl From<Mode> for ViewMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Single => ViewMode::Single,
            Mode::Quad => ViewMode::Quad,
            Mode::Windowed => ViewMode::Windowed,
            Mode::Reconstruction => ViewMode::Reconstruction,
            Mode::Sagittal => ViewMode::Sagittal,
            Mode::Coronal => ViewMode::Coronal,
        }
    }
}

/// Render a view of a study reconstructed from its image slices.
#[derive(Parser, Debug)]
#[command(author, about, version, long_about)]
struct Args {
    /// Study directory. Falls back to the default study in the preferences.
    study: Option<PathBuf>,

    /// View mode to switch to before rendering
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Steps to move the active cursor; negative values move backwards
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    steps: i64,

    /// Lower intensity bound for the windowed view
    #[arg(long, requires = "high")]
    low: Option<i32>,

    /// Upper intensity bound for the windowed view
    #[arg(long, requires = "low")]
    high: Option<i32>,

    /// Window every pixel, including the last row and column
    #[arg(long)]
    full_window: bool,

    /// Number of checkpoints to undo after the other edits
    #[arg(long, default_value_t = 0)]
    undo: usize,

    /// Output image; quad views write `<stem>_<n>.<ext>`
    #[arg(short, long, default_value = "result.png")]
    output: PathBuf,

    /// Save the resulting navigation state into the study
    #[arg(long)]
    save: bool,

    /// Remember this study as the default
    #[arg(long)]
    set_default: bool,

    /// Preferences file
    #[arg(long, env = PREFERENCES_ENV, default_value = DEFAULT_PREFERENCES_FILE)]
    prefs: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn frame_path(output: &Path, index: usize, count: usize) -> PathBuf {
    if count == 1 {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = output
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    output.with_file_name(format!("{stem}_{index}.{ext}"))
}

fn apply_edits(
    args: &Args,
    study: &Study,
    navigator: &mut Navigator,
) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(low), Some(high)) = (args.low, args.high) {
        let position = navigator.cursors().get(ViewMode::Windowed).position();
        navigator.replace_cursor(ViewMode::Windowed, WindowedCursor::new(position, low, high)?);
    }
    if let Some(mode) = args.mode {
        navigator.set_mode(mode.into());
    }
    if args.steps != 0 {
        navigator.checkpoint();
        for _ in 0..args.steps.unsigned_abs() {
            let moved = if args.steps > 0 {
                navigator.next(study)
            } else {
                navigator.prev()
            };
            if !moved {
                warn!(mode = ?navigator.mode(), "Reached the end of the study");
                break;
            }
        }
    }
    for _ in 0..args.undo {
        navigator.undo()?;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let mut prefs = Preferences::load(&args.prefs)?;
    let study_path = args
        .study
        .clone()
        .or_else(|| prefs.default_study().map(Path::to_path_buf))
        .ok_or("no study given and no default study set")?;

    let edges = if args.full_window {
        WindowEdges::Full
    } else {
        WindowEdges::Legacy
    };
    let study = Study::open_async(study_path.clone(), SortBy::Name)
        .await?
        .with_window_edges(edges);
    let mut navigator = study.restore_navigation()?;

    apply_edits(&args, &study, &mut navigator)?;

    let frames = navigator.render(&study)?;
    let count = frames.len();
    for (index, frame) in frames.iter().enumerate() {
        match frame {
            Some(image) => {
                let path = frame_path(&args.output, index, count);
                image.save(&path)?;
                info!(path = %path.display(), "Wrote frame");
            }
            None => info!(index, "No slice for frame"),
        }
    }

    if args.save {
        study.save_record(&navigator.record())?;
    } else if !study.matches_saved(navigator.cursors(), navigator.mode()) {
        info!("Navigation differs from the saved study; pass --save to keep it");
    }

    if args.set_default {
        prefs.set_default_study(&study_path);
        prefs.save(&args.prefs)?;
    }
    Ok(())
}
