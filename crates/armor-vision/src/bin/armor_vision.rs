use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use armor_vision::{run_detection, DetectConfig, DetectorKind, Overlay, ParamsIoError, Team};
use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "armor-vision")]
#[command(author, version, about = "Armor, rune and ore detection on still images")]
#[command(propagate_version = true)]
struct Cli {
    /// Log level for stderr output
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the default parameter document of a detector
    InitParams {
        kind: DetectorKind,
        path: PathBuf,
    },
    /// Run one detector on an image and print a JSON report
    Detect {
        /// Parameter document written by `init-params`
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        image: PathBuf,
        /// Save the image with the overlay drawn on it
        #[arg(long)]
        output: Option<PathBuf>,
        /// Override the team of the parameter document
        #[arg(long)]
        team: Option<Team>,
        /// Overlay verbosity, 0 to 3
        #[arg(long, default_value_t = 1)]
        verbose: u8,
        /// TrueType font for overlay captions
        #[arg(long)]
        font: Option<PathBuf>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("parameters {}: {source}", .path.display())]
    Params {
        path: PathBuf,
        source: ParamsIoError,
    },
    #[error("image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("font {}: {reason}", .path.display())]
    Font { path: PathBuf, reason: String },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    if let Err(err) = run(cli.command) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(feature = "tracing")]
fn init_logging(level: LevelFilter) {
    armor_vision::core::init_tracing(level, false);
    let _ = tracing_log::LogTracer::init();
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LevelFilter) {
    if let Err(err) = armor_vision::core::init_with_level(level) {
        eprintln!("logger: {err}");
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::InitParams { kind, path } => {
            DetectConfig::default_for(kind)
                .write_json(&path)
                .map_err(|source| CliError::Params {
                    path: path.clone(),
                    source,
                })?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Detect {
            config,
            image: image_path,
            output,
            team,
            verbose,
            font,
        } => {
            let mut cfg = DetectConfig::load_json(&config).map_err(|source| CliError::Params {
                path: config.clone(),
                source,
            })?;
            if let Some(team) = team {
                cfg.team = team;
            }
            let mut img = image::open(&image_path)
                .map_err(|source| CliError::Image {
                    path: image_path.clone(),
                    source,
                })?
                .to_rgb8();
            let font = font.as_deref().map(load_font).transpose()?;

            let verbose = if output.is_some() { verbose } else { 0 };
            let overlay = Overlay {
                verbose,
                font: font.as_ref(),
            };
            let report = run_detection(&cfg, &mut img, overlay);
            if let Some(path) = output {
                img.save(&path)
                    .map_err(|source| CliError::Image { path, source })?;
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn load_font(path: &Path) -> Result<FontArc, CliError> {
    let bytes = fs::read(path).map_err(|err| CliError::Font {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    FontArc::try_from_vec(bytes).map_err(|err| CliError::Font {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}
