//! Conversion from CLI arguments to the unified pipeline configuration

use crate::cli::main_impl::{Cli, CliColorMode};
use crate::config::{ColorMode, MattingConfig, RemovalConfig};
use anyhow::{bail, Result};

/// Builds a [`RemovalConfig`] from parsed CLI arguments
pub struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Validate argument combinations before building the configuration
    ///
    /// # Errors
    ///
    /// Returns an error for a missing model file or inconsistent matting
    /// thresholds.
    pub fn validate_cli(cli: &Cli) -> Result<()> {
        if !cli.model.is_file() {
            bail!("model file not found: {}", cli.model.display());
        }
        if cli.alpha_matting && cli.background_thresh >= cli.foreground_thresh {
            bail!(
                "background threshold ({}) must be below foreground threshold ({})",
                cli.background_thresh,
                cli.foreground_thresh
            );
        }
        Ok(())
    }

    /// Convert CLI arguments to the unified configuration
    ///
    /// # Errors
    ///
    /// Returns an error when the assembled configuration fails validation.
    pub fn from_cli(cli: &Cli) -> Result<RemovalConfig> {
        let config = RemovalConfig::builder()
            .model_path(cli.model.clone())
            .input_color_mode(match cli.color_mode {
                CliColorMode::Rgb => ColorMode::Rgb,
                CliColorMode::Rgba => ColorMode::Rgba,
            })
            .matting(MattingConfig {
                enabled: cli.alpha_matting,
                foreground_threshold: cli.foreground_thresh,
                background_threshold: cli.background_thresh,
                erode_size: cli.erode_size,
            })
            .hard_edge(cli.hard_edge)
            .export_mask(cli.export_mask)
            .intra_threads(cli.threads)
            .build()?;
        Ok(config)
    }
}
