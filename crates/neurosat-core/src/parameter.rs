//! Parameter ranges: normalized (0.0-1.0) ↔ real value conversion.
//!
//! # Example
//!
//! ```
//! use neurosat_core::ParameterRange;
//!
//! // Saturation gain fed to the model: 0.1 to 200, host knob in 0..1
//! let gain = ParameterRange::linear(0.1, 200.0, 0.1);
//! assert!((gain.denormalize(1.0) - 200.0).abs() < 1e-3);
//! ```

use serde::{Deserialize, Serialize};

/// How a parameter value is scaled between normalized (0-1) and real values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterScale {
    /// `real = min + normalized * (max - min)`
    #[default]
    Linear,

    /// `real = min * (max/min)^normalized`
    ///
    /// Requires `min > 0`. Falls back to linear otherwise.
    Logarithmic,
}

/// Valid range, default and scaling of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    /// Default real value, clamped to the range.
    pub default: f32,
    pub scale: ParameterScale,
}

impl ParameterRange {
    pub fn new(min: f32, max: f32, default: f32, scale: ParameterScale) -> Self {
        debug_assert!(max > min, "max must be greater than min");

        Self {
            min,
            max,
            default: default.clamp(min, max),
            scale,
        }
    }

    pub fn linear(min: f32, max: f32, default: f32) -> Self {
        Self::new(min, max, default, ParameterScale::Linear)
    }

    pub fn logarithmic(min: f32, max: f32, default: f32) -> Self {
        debug_assert!(min > 0.0, "logarithmic scale requires min > 0");
        Self::new(min, max, default, ParameterScale::Logarithmic)
    }

    /// Convert a real value to normalized (0.0-1.0).
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let value = value.clamp(self.min, self.max);
        let range = self.max - self.min;

        if range <= 0.0 {
            return 0.0;
        }

        match self.scale {
            ParameterScale::Logarithmic if self.min > 0.0 => {
                let log_min = self.min.ln();
                let log_max = self.max.ln();
                (value.ln() - log_min) / (log_max - log_min)
            }
            _ => (value - self.min) / range,
        }
    }

    /// Convert a normalized value (0.0-1.0) to a real value.
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let normalized = normalized.clamp(0.0, 1.0);

        match self.scale {
            ParameterScale::Logarithmic if self.min > 0.0 => {
                let log_min = self.min.ln();
                let log_max = self.max.ln();
                (log_min + normalized * (log_max - log_min)).exp()
            }
            _ => self.min + normalized * (self.max - self.min),
        }
    }

    /// Normalized position of [`default`](Self::default).
    #[inline]
    pub fn default_normalized(&self) -> f32 {
        self.normalize(self.default)
    }
}
