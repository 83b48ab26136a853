//! Interpreter configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Numeric and threading policy applied while binding an interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterOptions {
    /// Permit reduced-precision (f16) arithmetic for f32 graphs.
    pub allow_reduced_precision: bool,
    /// Intra-op threads. 1 keeps execution deterministic and free of
    /// scheduling jitter in the audio thread.
    pub num_threads: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            allow_reduced_precision: true,
            num_threads: 1,
        }
    }
}

impl InterpreterOptions {
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(Error::InvalidConfig(
                "num_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
