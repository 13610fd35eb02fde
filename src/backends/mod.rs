//! Segmentation backend implementations

#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(feature = "onnx")]
pub use onnx::OnnxSession;

#[cfg(test)]
pub mod test_utils;
