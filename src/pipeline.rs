//! Batch background removal pipeline
//!
//! Drives the whole run: enumerate input files, push each through the shared
//! segmentation session, apply optional alpha post-processing, and write
//! deterministically named PNG outputs. Files are processed independently and
//! in sorted order; one bad file is recorded in the batch report and the loop
//! moves on.

use crate::{
    config::RemovalConfig,
    error::{RemovalError, Result},
    postprocess,
    session::RemovalSession,
    types::{AlphaMask, ProcessingTimings, RemovalResult},
};
use image::DynamicImage;
use instant::Instant;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// File extensions recognized by the input enumerator (lowercase)
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tiff"];

/// List the image files in a directory, sorted lexicographically
///
/// Non-recursive; directories and files with other extensions are silently
/// excluded. The ordering determines the numeric suffix of each output file,
/// so the same input directory always yields the same output names.
///
/// # Errors
///
/// - `RemovalError::Io` when the directory cannot be read
/// - `RemovalError::NoInputImages` when nothing matches — a precondition
///   failure, not a retryable error
pub fn enumerate_images(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(input_dir)
        .map_err(|e| RemovalError::file_io_error("read input directory", input_dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && is_image_file(&path) {
            files.push(path);
        }
    }

    files.sort();

    if files.is_empty() {
        return Err(RemovalError::NoInputImages {
            dir: input_dir.to_path_buf(),
        });
    }

    debug!(count = files.len(), dir = %input_dir.display(), "enumerated input images");
    Ok(files)
}

/// Check if a file is an image based on its (lowercased) extension
fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Output file name for the i-th enumerated input (`base.ext` -> `base_<i>.png`)
///
/// The index suffix is always attached, even for a single-file batch, so a
/// re-run against the same directory overwrites its own outputs.
#[must_use]
pub fn composite_file_name(input_path: &Path, index: usize) -> String {
    let stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
    format!("{stem}_{index}.png")
}

/// Mask file name for the i-th enumerated input (`base.ext` -> `base_<i>_mask.png`)
#[must_use]
pub fn mask_file_name(input_path: &Path, index: usize) -> String {
    let stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
    format!("{stem}_{index}_mask.png")
}

/// Outcome of one file's trip through the pipeline
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome {
    /// The file was processed and its outputs written
    Succeeded {
        /// Path of the written RGBA composite
        composite: PathBuf,
        /// Path of the written grayscale mask, when mask export is enabled
        mask: Option<PathBuf>,
        /// Timing breakdown
        timings: ProcessingTimings,
    },
    /// Decode, inference, or write failed; later files still ran
    Failed {
        /// Human-readable failure description
        error: String,
    },
}

/// Per-file entry in the batch report
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// The input file this entry describes
    pub input: PathBuf,
    /// What happened to it
    pub outcome: FileOutcome,
}

/// Summary of a whole batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Per-file outcomes in processing (sorted) order
    pub files: Vec<FileReport>,
}

impl BatchReport {
    /// Number of files that produced outputs
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Succeeded { .. }))
            .count()
    }

    /// Number of files that failed
    #[must_use]
    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    /// Whether every file produced outputs
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Batch background removal driver
///
/// Owns the configuration and the one session shared by every file in the
/// batch. Execution is fully sequential: each file's read, backend call,
/// post-processing, and write complete before the next file begins.
pub struct BatchRemover {
    config: RemovalConfig,
    session: Box<dyn RemovalSession>,
}

impl BatchRemover {
    /// Create a new batch remover
    ///
    /// # Errors
    ///
    /// Returns `RemovalError::InvalidConfig` for inconsistent matting
    /// thresholds.
    pub fn new(config: RemovalConfig, session: Box<dyn RemovalSession>) -> Result<Self> {
        config.matting.validate()?;
        Ok(Self { config, session })
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &RemovalConfig {
        &self.config
    }

    /// Process one already-decoded image
    ///
    /// Normalizes the color mode, calls the backend, applies hard-edge
    /// thresholding when enabled, and derives the alpha mask from the final
    /// composite (so the mask reflects any thresholding).
    ///
    /// # Errors
    ///
    /// Propagates backend inference and mask construction failures.
    pub fn process_image(&mut self, image: &DynamicImage) -> Result<RemovalResult> {
        let total_start = Instant::now();
        let mut timings = ProcessingTimings::default();
        let original_dimensions = (image.width(), image.height());

        let normalized = self.config.input_color_mode.normalize(image);

        let inference_start = Instant::now();
        let mut composite = self
            .session
            .remove(&normalized, self.config.matting_for_call())?;
        timings.inference_ms = inference_start.elapsed().as_millis() as u64;

        let postprocess_start = Instant::now();
        if self.config.hard_edge {
            postprocess::harden_alpha(&mut composite);
        }
        let mask_image = postprocess::extract_alpha_mask(&composite);
        let mask = AlphaMask::new(mask_image.into_raw(), composite.dimensions())?;
        timings.postprocess_ms = postprocess_start.elapsed().as_millis() as u64;

        timings.total_ms = total_start.elapsed().as_millis() as u64;
        Ok(RemovalResult::new(
            composite,
            mask,
            original_dimensions,
            timings,
        ))
    }

    /// Process one image file
    ///
    /// # Errors
    ///
    /// - Image decode failures (with path context)
    /// - Everything [`Self::process_image`] can return
    pub fn process_file(&mut self, input_path: &Path) -> Result<RemovalResult> {
        let decode_start = Instant::now();
        let image =
            image::open(input_path).map_err(|e| RemovalError::image_load_error(input_path, e))?;
        let decode_ms = decode_start.elapsed().as_millis() as u64;

        let mut result = self.process_image(&image)?;
        result.timings.decode_ms = decode_ms;
        result.timings.total_ms += decode_ms;
        Ok(result)
    }

    /// Run the pipeline over a whole input directory
    ///
    /// # Errors
    ///
    /// - `RemovalError::NoInputImages` when the directory holds no images
    /// - `RemovalError::Io` when the directory scan or output directory
    ///   creation fails
    ///
    /// Per-file failures do not abort the batch; they are recorded in the
    /// returned [`BatchReport`].
    pub fn run(&mut self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport> {
        self.run_with_progress(input_dir, output_dir, |_, _, _| {})
    }

    /// Like [`Self::run`], invoking `progress(path, index, total)` before
    /// each file is processed
    pub fn run_with_progress<F>(
        &mut self,
        input_dir: &Path,
        output_dir: &Path,
        mut progress: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(&Path, usize, usize),
    {
        let files = enumerate_images(input_dir)?;

        // Idempotent: re-running against an existing output directory is fine
        std::fs::create_dir_all(output_dir)
            .map_err(|e| RemovalError::file_io_error("create output directory", output_dir, e))?;

        info!(
            count = files.len(),
            backend = self.session.name(),
            input = %input_dir.display(),
            output = %output_dir.display(),
            "starting batch"
        );

        let total = files.len();
        let mut report = BatchReport::default();

        for (index, input_path) in files.iter().enumerate() {
            progress(input_path, index, total);

            let outcome = match self.process_and_write(input_path, output_dir, index) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(file = %input_path.display(), "failed to process: {e}");
                    FileOutcome::Failed {
                        error: e.to_string(),
                    }
                },
            };
            report.files.push(FileReport {
                input: input_path.clone(),
                outcome,
            });
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch complete"
        );
        Ok(report)
    }

    /// Process one enumerated file and write its outputs
    fn process_and_write(
        &mut self,
        input_path: &Path,
        output_dir: &Path,
        index: usize,
    ) -> Result<FileOutcome> {
        let mut result = self.process_file(input_path)?;

        let composite_path = output_dir.join(composite_file_name(input_path, index));
        result.save_png(&composite_path)?;

        let mask_path = if self.config.export_mask {
            let path = output_dir.join(mask_file_name(input_path, index));
            result.mask.save_png(&path)?;
            Some(path)
        } else {
            None
        };

        debug!(
            input = %input_path.display(),
            output = %composite_path.display(),
            total_ms = result.timings.total_ms,
            "processed"
        );

        Ok(FileOutcome::Succeeded {
            composite: composite_path,
            mask: mask_path,
            timings: result.timings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_utils::MockRemovalSession;
    use crate::config::{ColorMode, MattingConfig, RemovalConfig};
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_test_png(dir: &Path, name: &str, width: u32, height: u32) {
        let img = RgbImage::from_pixel(width, height, Rgb([180, 90, 30]));
        img.save_with_format(dir.join(name), image::ImageFormat::Png)
            .unwrap();
    }

    fn write_test_jpeg(dir: &Path, name: &str, width: u32, height: u32) {
        let img = RgbImage::from_pixel(width, height, Rgb([180, 90, 30]));
        img.save_with_format(dir.join(name), image::ImageFormat::Jpeg)
            .unwrap();
    }

    #[test]
    fn test_enumerate_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        write_test_png(temp.path(), "zebra.png", 4, 4);
        write_test_png(temp.path(), "apple.png", 4, 4);
        std::fs::write(temp.path().join("notes.txt"), b"not an image").unwrap();
        std::fs::create_dir(temp.path().join("nested.png")).unwrap();

        let files = enumerate_images(temp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["apple.png", "zebra.png"]);
    }

    #[test]
    fn test_enumerate_case_insensitive_extensions() {
        let temp = TempDir::new().unwrap();
        write_test_png(temp.path(), "upper.PNG", 2, 2);
        write_test_png(temp.path(), "mixed.JpEg", 2, 2);
        let files = enumerate_images(temp.path()).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_enumerate_empty_is_precondition_failure() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("readme.md"), b"x").unwrap();
        let err = enumerate_images(temp.path()).unwrap_err();
        assert!(err.is_precondition_failure());
    }

    #[test]
    fn test_output_names_always_carry_index() {
        let input = Path::new("input/cat.jpg");
        assert_eq!(composite_file_name(input, 0), "cat_0.png");
        assert_eq!(mask_file_name(input, 0), "cat_0_mask.png");
        assert_eq!(composite_file_name(Path::new("dog.png"), 7), "dog_7.png");
    }

    #[test]
    fn test_process_image_dimensions_and_mask() {
        let config = RemovalConfig::default();
        let mut remover =
            BatchRemover::new(config, Box::new(MockRemovalSession::new())).unwrap();

        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 24, Rgb([10, 20, 30])));
        let result = remover.process_image(&image).unwrap();

        assert_eq!(result.dimensions(), (32, 24));
        assert_eq!(result.mask.dimensions, (32, 24));
        for (x, y, pixel) in result.image.enumerate_pixels() {
            assert_eq!(result.mask.value_at(x, y), pixel.0[3]);
        }
    }

    #[test]
    fn test_hard_edge_binarizes_result() {
        let config = RemovalConfig::builder().hard_edge(true).build().unwrap();
        let mut remover =
            BatchRemover::new(config, Box::new(MockRemovalSession::new())).unwrap();

        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([1, 2, 3])));
        let result = remover.process_image(&image).unwrap();
        for pixel in result.image.pixels() {
            assert!(pixel.0[3] == 0 || pixel.0[3] == 255);
        }
    }

    #[test]
    fn test_matting_forwarded_only_when_enabled() {
        let session = MockRemovalSession::new();
        let recorded = session.recorded_matting();

        let matting = MattingConfig {
            enabled: true,
            foreground_threshold: 200,
            ..MattingConfig::default()
        };
        let config = RemovalConfig::builder().matting(matting).build().unwrap();
        let mut remover = BatchRemover::new(config, Box::new(session)).unwrap();
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([0, 0, 0])));
        remover.process_image(&image).unwrap();

        let calls = recorded.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].unwrap().foreground_threshold, 200);
    }

    #[test]
    fn test_color_mode_reaches_backend() {
        let session = MockRemovalSession::new();
        let seen = session.seen_color_types();
        let config = RemovalConfig::builder()
            .input_color_mode(ColorMode::Rgb)
            .build()
            .unwrap();
        let mut remover = BatchRemover::new(config, Box::new(session)).unwrap();
        let image = DynamicImage::ImageRgba8(image::RgbaImage::new(6, 6));
        remover.process_image(&image).unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[image::ColorType::Rgb8]);
    }

    #[test]
    fn test_run_batch_writes_indexed_outputs() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("input");
        let output = temp.path().join("output");
        std::fs::create_dir(&input).unwrap();
        write_test_jpeg(&input, "cat.jpg", 6, 6);
        write_test_png(&input, "dog.png", 6, 6);

        let config = RemovalConfig::builder().export_mask(true).build().unwrap();
        let mut remover =
            BatchRemover::new(config, Box::new(MockRemovalSession::new())).unwrap();
        let report = remover.run(&input, &output).unwrap();

        assert_eq!(report.succeeded(), 2);
        assert!(report.is_complete_success());
        assert!(output.join("cat_0.png").is_file());
        assert!(output.join("cat_0_mask.png").is_file());
        assert!(output.join("dog_1.png").is_file());
        assert!(output.join("dog_1_mask.png").is_file());
    }

    #[test]
    fn test_run_continues_past_failing_file() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("input");
        let output = temp.path().join("output");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("broken.png"), b"this is not a png").unwrap();
        write_test_png(&input, "ok.png", 6, 6);

        let mut remover =
            BatchRemover::new(RemovalConfig::default(), Box::new(MockRemovalSession::new()))
                .unwrap();
        let report = remover.run(&input, &output).unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 1);
        // "ok.png" sorts after "broken.png", so it keeps index 1
        assert!(output.join("ok_1.png").is_file());
        assert!(!output.join("broken_0.png").exists());
    }
}
