//! Test helpers and fixtures for neurosat integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (closure models)
//! - `INFERENCE_EPSILON` (1e-4): Optimized backend graphs
//! - `PROBABILITY_EPSILON` (1e-5): Softmax sums

#![allow(dead_code)]

pub mod tolerances;

#[cfg(feature = "onnx")]
pub mod onnx;

use neurosat::prelude::*;
use neurosat::{FnBackend, InferenceBackend};

/// Standard block size for deterministic testing
pub const TEST_BLOCK_SIZE: usize = 512;

/// Gain value fed to the saturation fixtures.
pub const TEST_GAIN: f32 = 50.0;

/// Saturation curve used by the closure fixture: `tanh(sample * gain / 100)`.
pub fn saturate(sample: f32, gain: f32) -> f32 {
    (sample * gain * 0.01).tanh()
}

/// A `[1, 2] -> [1, 1]` closure backend shaped like the bundled saturation models.
pub fn saturation_backend() -> FnBackend {
    FnBackend::new([1, 2], [1, 1], |input, output| {
        output[0] = saturate(input[0], input[1]);
    })
}

/// Bound and primed interpreter over [`saturation_backend`].
pub fn saturation_interpreter() -> Interpreter {
    Interpreter::bind(Box::new(saturation_backend()), &InterpreterOptions::default())
        .expect("Failed to bind saturation backend")
}

/// Factory that ignores the model source and builds [`saturation_backend`].
pub fn saturation_factory() -> neurosat::BackendFactory {
    Box::new(|_source: &ModelSource, _options: &InterpreterOptions| {
        Ok(Box::new(saturation_backend()) as Box<dyn InferenceBackend>)
    })
}

/// Four-class classifier over a `[1, 8, 4]` feature matrix: scores are column sums.
pub fn column_classifier() -> Interpreter {
    let backend = FnBackend::new([1, 8, 4], [1, 4], |input, output| {
        output.fill(0.0);
        for row in input.chunks(4) {
            for (score, value) in output.iter_mut().zip(row) {
                *score += value;
            }
        }
    });
    Interpreter::bind(Box::new(backend), &InterpreterOptions::default())
        .expect("Failed to bind classifier backend")
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s.abs()).fold(0.0, f32::max)
}
