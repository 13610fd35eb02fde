#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # bgbatch
//!
//! A Rust library and CLI for batch background removal using ONNX Runtime.
//!
//! The pipeline scans an input directory for images, removes the background
//! from each one with a segmentation model loaded once per run, optionally
//! refines or binarizes the resulting alpha channel, and writes
//! deterministically named RGBA PNGs (plus optional grayscale masks) to an
//! output directory. Files are processed independently: one undecodable image
//! is recorded in the batch report while the rest of the batch completes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "onnx")]
//! # fn example() -> anyhow::Result<()> {
//! use bgbatch::{BatchRemover, OnnxSession, RemovalConfig};
//!
//! let config = RemovalConfig::builder()
//!     .model_path("models/isnet-general.onnx")
//!     .export_mask(true)
//!     .build()?;
//! let session = OnnxSession::from_config(&config)?;
//! let mut remover = BatchRemover::new(config, Box::new(session))?;
//! let report = remover.run("input".as_ref(), "output".as_ref())?;
//! println!("{} ok, {} failed", report.succeeded(), report.failed());
//! # Ok(())
//! # }
//! # fn main() {}
//! ```
//!
//! ## Feature Flags
//!
//! - `onnx` (default): ONNX Runtime CPU backend
//! - `cli` (default): command-line interface and progress reporting
//!
//! Library-only usage without CLI dependencies:
//!
//! ```toml
//! [dependencies]
//! bgbatch = { version = "0.1", default-features = false, features = ["onnx"] }
//! ```

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod matting;
pub mod pipeline;
pub mod postprocess;
pub mod session;
pub mod tracing_config;
pub mod types;

// Public API exports
#[cfg(feature = "onnx")]
pub use backends::OnnxSession;
pub use config::{ColorMode, MattingConfig, RemovalConfig, RemovalConfigBuilder};
pub use error::{RemovalError, Result};
pub use pipeline::{enumerate_images, BatchRemover, BatchReport, FileOutcome, FileReport};
pub use session::RemovalSession;
pub use tracing_config::{TracingConfig, TracingFormat};
pub use types::{AlphaMask, ProcessingTimings, RemovalResult};

/// Remove the background from a single image file
///
/// Convenience wrapper that builds a one-shot ONNX session; batch callers
/// should construct a [`BatchRemover`] instead so the model loads only once.
///
/// # Errors
///
/// Propagates configuration, decode, and inference failures.
#[cfg(feature = "onnx")]
pub fn remove_background<P: AsRef<std::path::Path>>(
    input_path: P,
    config: &RemovalConfig,
) -> Result<RemovalResult> {
    let session = OnnxSession::from_config(config)?;
    let mut remover = BatchRemover::new(config.clone(), Box::new(session))?;
    remover.process_file(input_path.as_ref())
}
