//! marksheet CLI: read answer sheet photos, inspect fiducials, print markers.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn, LevelFilter};
use marksheet::aruco::{builtins, draw_marker, MarkerDetector, MarkerDetectorParams};
use marksheet::frame::{self, Message};
use marksheet::{convert, detect, AnswerSheet, SheetConfig, SheetReport};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "marksheet")]
#[command(about = "Read photographed answer sheets framed by four ArUco markers")]
#[command(version)]
struct Cli {
    /// Log verbosity.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rectify a photo and read every answer block.
    Read(ReadArgs),

    /// Detect ArUco markers and print them as JSON.
    Markers {
        /// Path to the input image.
        #[arg(long)]
        image: PathBuf,

        /// Dictionary name.
        #[arg(long, default_value = "DICT_4X4_50")]
        dictionary: String,
    },

    /// Render a printable marker as PNG.
    DrawMarker {
        /// Marker id in the dictionary.
        #[arg(long)]
        id: u32,

        /// Side length in pixels, border included.
        #[arg(long, default_value_t = 150)]
        size: usize,

        /// Dictionary name.
        #[arg(long, default_value = "DICT_4X4_50")]
        dictionary: String,

        /// Output image path.
        #[arg(long)]
        out: PathBuf,
    },

    /// Print a built-in sheet configuration as JSON.
    Preset {
        #[arg(value_enum)]
        preset: Preset,
    },
}

#[derive(Debug, Clone, Args)]
struct ReadArgs {
    /// Input photo, or a length-prefixed message stream with `--framed`.
    #[arg(long)]
    image: PathBuf,

    /// Sheet configuration (JSON). Overrides `--preset`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Built-in sheet layout used when no `--config` is given.
    #[arg(long, value_enum, default_value_t = Preset::Ssq)]
    preset: Preset,

    /// Treat the input as a capture of the device stream and read every
    /// image message in it.
    #[arg(long)]
    framed: bool,

    /// Maximum accepted frame size in bytes.
    #[arg(long, default_value_t = frame::DEFAULT_MAX_FRAME_LEN)]
    max_frame_len: usize,

    /// Write the report (JSON) here instead of stdout.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write the photo with marked cells painted over it.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Overlay opacity in [0, 1].
    #[arg(long, default_value_t = 0.5)]
    alpha: f32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// Simulator sickness questionnaire.
    Ssq,
    /// Motion sickness susceptibility questionnaire.
    Mssq,
}

impl Preset {
    fn config(self) -> SheetConfig {
        match self {
            Self::Ssq => SheetConfig::ssq(),
            Self::Mssq => SheetConfig::mssq(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

#[cfg(feature = "tracing")]
fn init_logging(level: LogLevel) -> CliResult<()> {
    tracing_log::LogTracer::init()?;
    marksheet::core::init_tracing(level.filter(), marksheet::core::TraceFormat::Pretty)?;
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LogLevel) -> CliResult<()> {
    marksheet::core::init_with_level(level.filter())?;
    Ok(())
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level)?;

    match cli.command {
        Commands::Read(args) => run_read(&args),
        Commands::Markers { image, dictionary } => run_markers(&image, &dictionary),
        Commands::DrawMarker {
            id,
            size,
            dictionary,
            out,
        } => run_draw_marker(id, size, &dictionary, &out),
        Commands::Preset { preset } => {
            println!("{}", serde_json::to_string_pretty(&preset.config())?);
            Ok(())
        }
    }
}

// ── read ───────────────────────────────────────────────────────────────

fn run_read(args: &ReadArgs) -> CliResult<()> {
    let config = match &args.config {
        Some(path) => SheetConfig::load_json(path)?,
        None => args.preset.config(),
    };
    let sheet = config.build()?;

    let photos = if args.framed {
        read_framed_images(&args.image, args.max_frame_len)?
    } else {
        vec![detect::load_image(&args.image)?]
    };
    info!("{} photo(s) from {}", photos.len(), args.image.display());

    let mut reports = Vec::with_capacity(photos.len());
    for (i, photo) in photos.iter().enumerate() {
        let mut report = detect::inspect_sheet(photo, &sheet);
        report.image_path = Some(if args.framed {
            format!("{}#{i}", args.image.display())
        } else {
            args.image.display().to_string()
        });

        if let Some(path) = &args.overlay {
            let path = overlay_path(path, i, photos.len());
            write_overlay(photo, &sheet, &report, &path, args.alpha)?;
        }
        reports.push(report);
    }

    let json = match reports.as_slice() {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    match &args.report {
        Some(path) => {
            std::fs::write(path, json)?;
            info!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn read_framed_images(path: &Path, max_len: usize) -> CliResult<Vec<image::DynamicImage>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut images = Vec::new();
    while let Some(message) = frame::next_message(&mut reader, max_len)
        .map_err(|e| format!("{} after {} image(s): {e}", path.display(), images.len()))?
    {
        match message {
            Message::Image(bytes) => images.push(image::load_from_memory(&bytes)?),
            Message::Text(text) => info!("device says: {text}"),
        }
    }
    Ok(images)
}

fn overlay_path(path: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "overlay".to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    path.with_file_name(format!("{stem}_{index}.{ext}"))
}

fn write_overlay(
    photo: &image::DynamicImage,
    sheet: &AnswerSheet,
    report: &SheetReport,
    path: &Path,
    alpha: f32,
) -> CliResult<()> {
    let Some(answers) = report.answers() else {
        warn!("sheet not found, no overlay for {}", path.display());
        return Ok(());
    };
    let out = detect::overlay_answers(photo, sheet, &answers, alpha, detect::MARK_COLOR)?;
    out.save(path)?;
    info!("overlay written to {}", path.display());
    Ok(())
}

// ── markers ────────────────────────────────────────────────────────────

fn run_markers(image: &Path, dictionary: &str) -> CliResult<()> {
    let detector = MarkerDetector::new(MarkerDetectorParams {
        dictionary: dictionary.to_string(),
        ..Default::default()
    })?;
    let photo = detect::load_image(image)?;
    let gray = convert::to_gray(&photo);
    let detections = detector.detect(&gray.view());
    info!("{} marker(s) in {}", detections.len(), image.display());
    println!("{}", serde_json::to_string_pretty(&detections)?);
    Ok(())
}

// ── draw-marker ────────────────────────────────────────────────────────

fn run_draw_marker(id: u32, size: usize, dictionary: &str, out: &Path) -> CliResult<()> {
    let dict = builtins::builtin_dictionary(dictionary)
        .ok_or_else(|| format!("unknown dictionary `{dictionary}`"))?;
    let marker = draw_marker(&dict, id, size).ok_or_else(|| {
        format!(
            "cannot draw id {id} at {size} px (dictionary has {} ids, needs >= {} px)",
            dict.len(),
            dict.marker_size + 2
        )
    })?;
    convert::gray_to_image(&marker)?.save(out)?;
    info!("marker {id} written to {}", out.display());
    Ok(())
}
