//! Closure-backed inference backend.
//!
//! Wraps a plain Rust function as a single-input, single-output graph. Useful
//! for hosts that bring their own DSP model and for exercising the interpreter
//! without a serialized model.

use crate::backend::{BackendCapabilities, InferenceBackend};
use crate::error::InferenceError;
use crate::options::InterpreterOptions;
use crate::shape::TensorInfo;

type ForwardFn =
    Box<dyn FnMut(&[f32], &mut [f32]) -> core::result::Result<(), InferenceError> + Send>;

/// An [`InferenceBackend`] whose forward pass is a closure.
///
/// # Example
///
/// ```
/// use neurosat_core::{FnBackend, Interpreter, InterpreterOptions};
///
/// let backend = FnBackend::new([1, 2], [1, 1], |input, output| {
///     output[0] = (input[0] * input[1]).tanh();
/// });
/// let mut interpreter =
///     Interpreter::bind(Box::new(backend), &InterpreterOptions::default()).unwrap();
///
/// let mut out = [0.0f32];
/// interpreter.invoke(&[0.5, 2.0], &mut out).unwrap();
/// ```
pub struct FnBackend {
    inputs: Vec<TensorInfo>,
    outputs: Vec<TensorInfo>,
    forward: ForwardFn,
}

impl FnBackend {
    pub fn new<F>(input_dims: impl Into<Vec<usize>>, output_dims: impl Into<Vec<usize>>, mut f: F) -> Self
    where
        F: FnMut(&[f32], &mut [f32]) + Send + 'static,
    {
        Self::fallible(input_dims, output_dims, move |input, output| {
            f(input, output);
            Ok(())
        })
    }

    /// Like [`new`](Self::new), for forward passes that can fail.
    pub fn fallible<F>(
        input_dims: impl Into<Vec<usize>>,
        output_dims: impl Into<Vec<usize>>,
        f: F,
    ) -> Self
    where
        F: FnMut(&[f32], &mut [f32]) -> core::result::Result<(), InferenceError> + Send + 'static,
    {
        Self {
            inputs: vec![TensorInfo::f32("input", input_dims)],
            outputs: vec![TensorInfo::f32("output", output_dims)],
            forward: Box::new(f),
        }
    }

    /// Override the declared graph inputs.
    pub fn with_inputs(mut self, inputs: Vec<TensorInfo>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Override the declared graph outputs.
    pub fn with_outputs(mut self, outputs: Vec<TensorInfo>) -> Self {
        self.outputs = outputs;
        self
    }
}

impl InferenceBackend for FnBackend {
    fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorInfo] {
        &self.outputs
    }

    fn allocate(&mut self, _options: &InterpreterOptions) -> core::result::Result<(), InferenceError> {
        Ok(())
    }

    #[inline]
    fn forward(
        &mut self,
        input: &[f32],
        output: &mut [f32],
    ) -> core::result::Result<(), InferenceError> {
        (self.forward)(input, output)
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            name: "closure".to_string(),
            supports_reduced_precision: false,
            max_threads: 1,
            allocation_free: true,
        }
    }
}
