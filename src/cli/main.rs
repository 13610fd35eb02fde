//! Command-line entry point for batch background removal

use crate::backends::OnnxSession;
use crate::cli::config::CliConfigBuilder;
use crate::pipeline::BatchRemover;
use crate::tracing_config::{TracingConfig, TracingFormat};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};

/// Batch background removal CLI tool
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgbatch")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Input directory scanned (non-recursively) for images
    #[arg(value_name = "INPUT_DIR", default_value = "input")]
    pub input: PathBuf,

    /// Output directory for composites and masks (created if missing)
    #[arg(short, long, value_name = "OUTPUT_DIR", default_value = "output")]
    pub output: PathBuf,

    /// Path to the ONNX segmentation model file
    #[arg(short, long, value_name = "MODEL")]
    pub model: PathBuf,

    /// Enable alpha-matting refinement of soft masks
    #[arg(long)]
    pub alpha_matting: bool,

    /// Alpha value at or above which a pixel is definite foreground (0-255)
    #[arg(long, value_name = "N", default_value_t = 240)]
    pub foreground_thresh: u8,

    /// Alpha value at or below which a pixel is definite background (0-255)
    #[arg(long, value_name = "N", default_value_t = 20)]
    pub background_thresh: u8,

    /// Erosion radius applied to the definite-foreground region, in pixels
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub erode_size: u32,

    /// Binarize the alpha channel (above 128 becomes opaque, else transparent)
    #[arg(long)]
    pub hard_edge: bool,

    /// Also write a grayscale `<base>_<i>_mask.png` next to each composite
    #[arg(long)]
    pub export_mask: bool,

    /// Color mode inputs are normalized to before inference
    #[arg(long, value_enum, default_value_t = CliColorMode::Rgba)]
    pub color_mode: CliColorMode,

    /// Number of inference threads (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    pub threads: usize,

    /// Write a JSON batch report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Input color mode as exposed on the command line
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliColorMode {
    Rgb,
    Rgba,
}

/// Run the CLI
///
/// # Errors
///
/// Returns an error for configuration and setup failures; expected run
/// outcomes (empty input directory, partial failures) are reported through
/// the exit code instead.
pub fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    TracingConfig::new()
        .with_verbosity(cli.verbose)
        .with_format(TracingFormat::Console)
        .init()
        .context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    info!(
        input = %cli.input.display(),
        output = %cli.output.display(),
        model = %cli.model.display(),
        "starting batch background removal"
    );

    // Check the input directory before paying the model load cost
    if let Err(e) = crate::pipeline::enumerate_images(&cli.input) {
        if e.is_precondition_failure() {
            eprintln!("{e}");
            return Ok(ExitCode::from(1));
        }
        return Err(e.into());
    }

    let session = OnnxSession::from_config(&config).context("Failed to create ONNX session")?;
    let mut remover =
        BatchRemover::new(config, Box::new(session)).context("Failed to create batch remover")?;

    let batch_start = Instant::now();
    let progress = ProgressBar::hidden();
    let run_result = remover.run_with_progress(&cli.input, &cli.output, |path, index, total| {
        if index == 0 && total > 1 {
            progress.set_draw_target(ProgressDrawTarget::stderr());
            progress.set_length(total as u64);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
        }
        progress.set_position(index as u64);
        progress.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
    });
    progress.finish_and_clear();

    let report = match run_result {
        Ok(report) => report,
        Err(e) if e.is_precondition_failure() => {
            eprintln!("{e}");
            return Ok(ExitCode::from(1));
        },
        Err(e) => return Err(e.into()),
    };

    let elapsed_ms = batch_start.elapsed().as_millis() as u64;
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        elapsed_ms,
        "batch finished"
    );

    if let Some(report_path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize batch report")?;
        std::fs::write(report_path, json).with_context(|| {
            format!("Failed to write batch report to {}", report_path.display())
        })?;
        info!(path = %report_path.display(), "wrote batch report");
    }

    if report.is_complete_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        for file in &report.files {
            if let crate::pipeline::FileOutcome::Failed { error: message } = &file.outcome {
                error!(file = %file.input.display(), "{message}");
            }
        }
        Ok(ExitCode::from(2))
    }
}
