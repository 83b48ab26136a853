//! Tolerance constants for inference testing.
//!
//! Different backends and graphs need different precision levels.

/// Floating point rounding errors (closure models, exact arithmetic).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Optimized graph tolerance (operator fusion and reordering in the backend).
pub const INFERENCE_EPSILON: f32 = 1e-4;

/// Probability mass tolerance for softmax outputs.
pub const PROBABILITY_EPSILON: f32 = 1e-5;
