//! # neurosat - Real-time Neural Audio Inference
//!
//! Runs small neural models (ONNX or TFLite) inside an audio callback.
//!
//! ## Architecture
//!
//! neurosat is an umbrella crate that coordinates:
//! - **neurosat-core** - Interpreter wrapper (binding, priming, invocation, introspection)
//! - **neurosat-tract** - ONNX and TFLite backends on the tract inference engine
//! - **neurosat-plugin** - Neural saturation processor driven by a gain knob
//!
//! ## Quick Start
//!
//! ```ignore
//! use neurosat::prelude::*;
//!
//! // Load, bind and prime (non-real-time)
//! let mut interpreter = neurosat::open("saturation_model.tflite")?;
//!
//! // Audio thread: no allocation in the wrapper, no locks, no logging
//! let mut output = [0.0f32; 1];
//! interpreter.invoke(&[sample, 50.0], &mut output)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - ONNX + TFLite backends and the saturation processor
//! - `onnx` - ONNX front-end
//! - `tflite` - TFLite front-end
//! - `plugin` - Saturation processor

/// Re-export of neurosat-core for direct access
pub use neurosat_core as core;

pub use neurosat_core::{
    argmax, softmax, BackendFactory, ErrorKind, FnBackend, InferenceBackend, InputLayout,
    Interpreter, InterpreterBuilder, InterpreterOptions, InvokeError, ModelFormat, ModelSource,
    ResourceTable, TensorInfo,
};

pub mod error;
pub use error::{Error, Result};

/// Backends on the tract inference engine
#[cfg(any(feature = "onnx", feature = "tflite"))]
pub use neurosat_tract as tract;

/// Neural saturation processor
#[cfg(feature = "plugin")]
pub use neurosat_plugin as plugin;

/// Open a model with default options.
///
/// The backend is picked from the file extension, or the content for
/// buffers.
pub fn open(source: impl Into<ModelSource>) -> Result<Interpreter> {
    open_with(source, InterpreterOptions::default())
}

/// Open a model with explicit options.
pub fn open_with(source: impl Into<ModelSource>, options: InterpreterOptions) -> Result<Interpreter> {
    let source = source.into();
    tracing::debug!("Opening model from {}", source.describe());

    #[cfg(any(feature = "onnx", feature = "tflite"))]
    {
        Ok(Interpreter::builder()
            .source(source)
            .options(options)
            .backend(tract::backend_factory())
            .build()?)
    }

    #[cfg(not(any(feature = "onnx", feature = "tflite")))]
    {
        let _ = options;
        Err(neurosat_core::Error::BackendUnavailable(source.format()?).into())
    }
}

/// Build a saturator from its config, loading the model with the tract backend.
#[cfg(all(feature = "plugin", any(feature = "onnx", feature = "tflite")))]
pub fn open_saturator(
    config: &plugin::SaturatorConfig,
    resources: &ResourceTable,
) -> Result<plugin::Saturator> {
    Ok(plugin::Saturator::from_config(
        config,
        resources,
        tract::backend_factory(),
    )?)
}

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{open, open_with};
    pub use crate::{Error, Result};

    // Interpreter
    pub use crate::core::{
        argmax, softmax, InputLayout, Interpreter, InterpreterOptions, InvokeError, ModelSource,
        ResourceTable,
    };

    // Saturator
    #[cfg(feature = "plugin")]
    pub use crate::plugin::{GainParameter, Saturator, SaturatorConfig};

    #[cfg(all(feature = "plugin", any(feature = "onnx", feature = "tflite")))]
    pub use crate::open_saturator;
}
