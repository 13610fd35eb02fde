//! Batch background removal CLI tool
//!
//! Command-line interface for removing backgrounds from every image in a
//! directory using the bgbatch library with an ONNX Runtime backend.

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<std::process::ExitCode> {
    bgbatch::cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
