//! Inference backend abstraction: framework-agnostic neural inference.
//!
//! Defines the [`InferenceBackend`] trait that concrete engines (tract's ONNX
//! and TFLite front-ends, or a plain closure) implement. All data crosses the
//! boundary as flat `f32` slices, so no framework tensor types leak into the
//! interpreter wrapper.

use crate::error::InferenceError;
use crate::model::ModelSource;
use crate::options::InterpreterOptions;
use crate::shape::TensorInfo;
use crate::Result;

#[derive(Debug, Clone)]
pub struct BackendCapabilities {
    /// e.g. "tract/ONNX", "tract/TFLite", "closure"
    pub name: String,
    pub supports_reduced_precision: bool,
    pub max_threads: usize,
    /// `forward` never touches the heap once `allocate` has run.
    pub allocation_free: bool,
}

/// A loaded, operator-resolved model ready to be bound.
///
/// # Lifecycle
///
/// 1. Created by a [`BackendFactory`] (load + build)
/// 2. [`allocate`](Self::allocate) once while binding
/// 3. [`forward`](Self::forward) once for priming, then once per invocation
///
/// # Thread Safety
///
/// `Send` so an interpreter built on a control thread can move to the audio
/// thread. Never shared: the interpreter owns it and calls it through
/// `&mut self`, one pass at a time.
pub trait InferenceBackend: Send {
    /// Graph inputs, in graph order.
    fn inputs(&self) -> &[TensorInfo];

    /// Graph outputs, in graph order.
    fn outputs(&self) -> &[TensorInfo];

    /// Apply the numeric/threading policy and allocate all tensor storage.
    ///
    /// `options` has already been clamped to [`capabilities`](Self::capabilities).
    fn allocate(&mut self, options: &InterpreterOptions) -> core::result::Result<(), InferenceError>;

    /// Run one forward pass.
    ///
    /// `input` and `output` are exactly as long as the declared input element
    /// count and the output's last dimension.
    fn forward(
        &mut self,
        input: &[f32],
        output: &mut [f32],
    ) -> core::result::Result<(), InferenceError>;

    fn capabilities(&self) -> BackendCapabilities;
}

/// Factory that loads a model and builds its backend.
///
/// Runs in the non-real-time construction context.
pub type BackendFactory = Box<
    dyn FnOnce(&ModelSource, &InterpreterOptions) -> Result<Box<dyn InferenceBackend>> + Send,
>;
