//! Integration test modules for neurosat

pub mod interpreter;

#[cfg(feature = "plugin")]
pub mod saturator;

#[cfg(any(feature = "onnx", feature = "tflite"))]
pub mod tract;
