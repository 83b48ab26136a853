//! tract backend for neurosat.
//!
//! Provides [`InferenceBackend`](neurosat_core::InferenceBackend) over
//! [tract](https://github.com/sonos/tract), a pure-Rust inference engine, with
//! an ONNX front-end (`onnx` feature) and a TFLite front-end (`tflite`
//! feature).
//!
//! ```rust,ignore
//! let interpreter = Interpreter::builder()
//!     .source(ModelSource::path("saturation_model.tflite"))
//!     .backend(neurosat_tract::backend_factory())
//!     .build()?;
//! ```

mod backend;
mod compiled;
pub use backend::TractBackend;

use neurosat_core::{
    BackendFactory, Error, InferenceBackend, InterpreterOptions, ModelFormat, ModelSource, Result,
};

/// Load an ONNX model from a path or buffer.
#[cfg(feature = "onnx")]
pub fn load_onnx(source: &ModelSource) -> Result<TractBackend> {
    use tract_onnx::prelude::{Framework, InferenceModelExt};

    let bytes = source.bytes()?;
    tracing::debug!("Parsing ONNX model from {}", source.describe());
    let model = tract_onnx::onnx()
        .model_for_read(&mut &bytes[..])
        .map_err(|e| Error::ModelInvalid(format!("{e:#}")))?;
    let typed = model
        .into_typed()
        .map_err(|e| Error::OperatorUnsupported(format!("{e:#}")))?;
    TractBackend::from_typed(typed, "tract/ONNX")
}

/// Load a TFLite model from a path or buffer.
#[cfg(feature = "tflite")]
pub fn load_tflite(source: &ModelSource) -> Result<TractBackend> {
    use tract_core::prelude::Framework;

    let bytes = source.bytes()?;
    tracing::debug!("Parsing TFLite model from {}", source.describe());
    let typed = tract_tflite::tflite()
        .model_for_read(&mut &bytes[..])
        .map_err(|e| Error::ModelInvalid(format!("{e:#}")))?;
    TractBackend::from_typed(typed, "tract/TFLite")
}

/// Load a model, picking the front-end from the extension or content.
pub fn load(source: &ModelSource) -> Result<TractBackend> {
    match source.format()? {
        #[cfg(feature = "onnx")]
        ModelFormat::Onnx => load_onnx(source),
        #[cfg(feature = "tflite")]
        ModelFormat::Tflite => load_tflite(source),
        #[allow(unreachable_patterns)]
        format => Err(Error::BackendUnavailable(format)),
    }
}

/// Factory for [`InterpreterBuilder::backend`](neurosat_core::InterpreterBuilder::backend)
/// that dispatches on the model format.
pub fn backend_factory() -> BackendFactory {
    Box::new(|source: &ModelSource, _options: &InterpreterOptions| {
        Ok(Box::new(load(source)?) as Box<dyn InferenceBackend>)
    })
}

#[cfg(feature = "onnx")]
pub fn onnx_backend_factory() -> BackendFactory {
    Box::new(|source: &ModelSource, _options: &InterpreterOptions| {
        Ok(Box::new(load_onnx(source)?) as Box<dyn InferenceBackend>)
    })
}

#[cfg(feature = "tflite")]
pub fn tflite_backend_factory() -> BackendFactory {
    Box::new(|source: &ModelSource, _options: &InterpreterOptions| {
        Ok(Box::new(load_tflite(source)?) as Box<dyn InferenceBackend>)
    })
}
