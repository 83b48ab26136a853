//! The interpreter wrapper: binding, priming and the real-time invocation path.
//!
//! Construction (load, build, bind, prime) may allocate, log and fail. Once an
//! [`Interpreter`] exists, [`invoke`](Interpreter::invoke) and friends only
//! compare lengths, copy into and out of the pinned buffers, and run one
//! forward pass.

use crate::backend::{BackendCapabilities, BackendFactory, InferenceBackend};
use crate::confinement::ThreadConfinement;
use crate::error::InvokeError;
use crate::math::argmax;
use crate::model::ModelSource;
use crate::options::InterpreterOptions;
use crate::shape::{output_len, ElementType, InputLayout, TensorInfo, TensorKind};
use crate::{Error, Result};
use std::fmt;

/// A model bound to pinned input/output buffers and primed for real-time use.
///
/// `Send` but not `Sync`: build it anywhere, then hand it to the audio thread.
/// Every invocation takes `&mut self`, so at most one forward pass is ever in
/// flight.
pub struct Interpreter {
    backend: Box<dyn InferenceBackend>,
    backend_name: String,
    layout: InputLayout,
    input_dims: Vec<usize>,
    output_dims: Vec<usize>,
    /// Pinned input tensor storage. Never reallocated after binding.
    input: Box<[f32]>,
    /// Pinned output tensor storage. Never reallocated after binding.
    output: Box<[f32]>,
    confinement: ThreadConfinement,
}

impl Interpreter {
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::default()
    }

    /// Bind a loaded backend and prime it with exactly one zero-filled pass.
    ///
    /// Requires exactly one `f32` input shaped `[1, N]` / `[1, R, C]` and
    /// exactly one `f32` output.
    pub fn bind(mut backend: Box<dyn InferenceBackend>, options: &InterpreterOptions) -> Result<Self> {
        options.validate()?;

        let capabilities = backend.capabilities();
        if !capabilities.allocation_free {
            tracing::warn!(
                "{} allocates during every forward pass; keep it off the audio thread",
                capabilities.name
            );
        }
        let input_info = single_tensor(backend.inputs(), TensorKind::Input)?.clone();
        let output_info = single_tensor(backend.outputs(), TensorKind::Output)?.clone();
        log_tensor(&capabilities.name, TensorKind::Input, &input_info);
        log_tensor(&capabilities.name, TensorKind::Output, &output_info);

        require_f32(TensorKind::Input, &input_info)?;
        require_f32(TensorKind::Output, &output_info)?;

        let layout = InputLayout::classify(&input_info.dims)?;
        let output_size = output_len(&output_info.dims)?;
        tracing::debug!("Input layout: {} | Output size: {}", layout, output_size);

        let effective = effective_options(options, &capabilities);
        tracing::debug!("Allocating tensor buffers ({})", capabilities.name);
        backend.allocate(&effective)?;

        let mut interpreter = Self {
            backend,
            backend_name: capabilities.name,
            layout,
            input_dims: input_info.dims,
            output_dims: output_info.dims,
            input: vec![0.0; layout.len()].into_boxed_slice(),
            output: vec![0.0; output_size].into_boxed_slice(),
            confinement: ThreadConfinement::default(),
        };

        tracing::debug!("Priming the interpreter (calling inference once)");
        interpreter.prime()?;

        tracing::info!(
            "Interpreter ready: {} input {} -> output [{}]",
            interpreter.backend_name,
            interpreter.layout,
            output_size
        );

        Ok(interpreter)
    }

    /// Zero-filled warm-up pass so lazy backend allocation happens now.
    fn prime(&mut self) -> Result<()> {
        self.input.fill(0.0);
        self.backend
            .forward(&self.input, &mut self.output)
            .map_err(|e| Error::Priming(e.into()))
    }

    // -- Invocation ----------------------------------------------------------

    /// Run one forward pass on a flat input vector and return the argmax of
    /// the output.
    ///
    /// `input.len()` must equal [`input_size`](Self::input_size) and
    /// `output.len()` must equal [`output_size`](Self::output_size). On a size
    /// error nothing has been written.
    ///
    /// An output with no element above `f32::MIN` (all NaN, say) returns 0,
    /// the same as a genuine class 0. Call [`argmax`] on `output` to tell
    /// the two apart.
    #[inline]
    pub fn invoke(&mut self, input: &[f32], output: &mut [f32]) -> core::result::Result<usize, InvokeError> {
        let expected = self.layout.len();
        if input.len() != expected {
            return Err(InvokeError::InputSize {
                expected,
                found: input.len(),
            });
        }
        self.check_output(output)?;
        self.run(input, output)
    }

    /// Run one forward pass on a row-major matrix of `rows` x `cols`.
    #[inline]
    pub fn invoke_flat_2d(
        &mut self,
        flat: &[f32],
        rows: usize,
        cols: usize,
        output: &mut [f32],
    ) -> core::result::Result<usize, InvokeError> {
        if rows.checked_mul(cols) != Some(flat.len()) {
            return Err(InvokeError::FlatLength {
                len: flat.len(),
                rows,
                cols,
            });
        }
        match self.layout {
            InputLayout::Matrix {
                rows: expected_rows,
                cols: expected_cols,
            } => {
                if rows != expected_rows || cols != expected_cols {
                    return Err(InvokeError::MatrixShape {
                        expected_rows,
                        expected_cols,
                        rows,
                        cols,
                    });
                }
            }
            InputLayout::Vector { .. } => return Err(InvokeError::NotMatrixInput),
        }
        self.check_output(output)?;
        self.run(flat, output)
    }

    #[inline]
    fn check_output(&self, output: &[f32]) -> core::result::Result<(), InvokeError> {
        if output.len() != self.output.len() {
            return Err(InvokeError::OutputSize {
                expected: self.output.len(),
                found: output.len(),
            });
        }
        Ok(())
    }

    /// Lengths already validated.
    #[inline]
    fn run(&mut self, input: &[f32], output: &mut [f32]) -> core::result::Result<usize, InvokeError> {
        self.confinement.check();
        self.input.copy_from_slice(input);
        self.backend.forward(&self.input, &mut self.output)?;
        output.copy_from_slice(&self.output);
        Ok(argmax(output).unwrap_or(0))
    }

    /// Allow the next invocation to come from a different thread.
    ///
    /// Call when handing the interpreter from one audio thread to another
    /// (e.g. a host switching from realtime to offline rendering).
    pub fn release_thread(&mut self) {
        self.confinement.release();
    }

    // -- Classification ------------------------------------------------------

    /// Classify a feature vector. Same contract as [`invoke`](Self::invoke).
    #[inline]
    pub fn classify(&mut self, features: &[f32], scores: &mut [f32]) -> core::result::Result<usize, InvokeError> {
        self.invoke(features, scores)
    }

    /// Classify a fixed-size feature array.
    #[inline]
    pub fn classify_array<const IN: usize, const OUT: usize>(
        &mut self,
        features: &[f32; IN],
        scores: &mut [f32; OUT],
    ) -> core::result::Result<usize, InvokeError> {
        self.invoke(features, scores)
    }

    /// Classify a flat row-major feature matrix.
    #[inline]
    pub fn classify_flat_2d(
        &mut self,
        flat: &[f32],
        rows: usize,
        cols: usize,
        scores: &mut [f32],
    ) -> core::result::Result<usize, InvokeError> {
        self.invoke_flat_2d(flat, rows, cols, scores)
    }

    /// Classify a fixed-size feature matrix.
    #[inline]
    pub fn classify_matrix<const R: usize, const C: usize, const OUT: usize>(
        &mut self,
        matrix: &[[f32; C]; R],
        scores: &mut [f32; OUT],
    ) -> core::result::Result<usize, InvokeError> {
        self.invoke_flat_2d(matrix.as_flattened(), R, C, scores)
    }

    // -- Introspection -------------------------------------------------------

    /// Declared input element count (N, or R * C for matrix inputs).
    #[inline]
    pub fn input_size(&self) -> usize {
        self.layout.len()
    }

    /// N for `[1, N]` inputs, `None` for matrix inputs.
    #[inline]
    pub fn input_size_1d(&self) -> Option<usize> {
        match self.layout {
            InputLayout::Vector { len } => Some(len),
            InputLayout::Matrix { .. } => None,
        }
    }

    /// `(rows, cols)` for `[1, R, C]` inputs, `None` for vector inputs.
    #[inline]
    pub fn input_size_2d(&self) -> Option<(usize, usize)> {
        match self.layout {
            InputLayout::Matrix { rows, cols } => Some((rows, cols)),
            InputLayout::Vector { .. } => None,
        }
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.output.len()
    }

    #[inline]
    pub fn input_layout(&self) -> InputLayout {
        self.layout
    }

    pub fn input_dims(&self) -> &[usize] {
        &self.input_dims
    }

    pub fn output_dims(&self) -> &[usize] {
        &self.output_dims
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("backend", &self.backend_name)
            .field("layout", &self.layout)
            .field("input_dims", &self.input_dims)
            .field("output_dims", &self.output_dims)
            .finish()
    }
}

fn single_tensor(tensors: &[TensorInfo], kind: TensorKind) -> Result<&TensorInfo> {
    match tensors {
        [tensor] => Ok(tensor),
        _ => Err(Error::TensorCount {
            kind,
            found: tensors.len(),
        }),
    }
}

fn require_f32(kind: TensorKind, info: &TensorInfo) -> Result<()> {
    if info.element_type != ElementType::F32 {
        return Err(Error::Binding(format!(
            "{} tensor '{}' has element type {}, only f32 can be bound",
            kind, info.name, info.element_type
        )));
    }
    Ok(())
}

fn log_tensor(backend: &str, kind: TensorKind, info: &TensorInfo) {
    tracing::debug!(
        "{}: {} tensor '{}' dims {:?} type {}",
        backend,
        kind,
        info.name,
        info.dims,
        info.element_type
    );
}

/// Clamp requested options to what the backend can honour.
fn effective_options(
    requested: &InterpreterOptions,
    capabilities: &BackendCapabilities,
) -> InterpreterOptions {
    let mut effective = requested.clone();
    if requested.allow_reduced_precision && !capabilities.supports_reduced_precision {
        tracing::debug!(
            "{} has no reduced-precision mode, running in full f32",
            capabilities.name
        );
        effective.allow_reduced_precision = false;
    }
    let max_threads = capabilities.max_threads.max(1);
    if requested.num_threads > max_threads {
        tracing::warn!(
            "{} supports at most {} thread(s), {} requested",
            capabilities.name,
            max_threads,
            requested.num_threads
        );
        effective.num_threads = max_threads;
    }
    effective
}

/// Builder: model source + backend factory + options.
///
/// # Example
///
/// ```ignore
/// let interpreter = Interpreter::builder()
///     .source(ModelSource::path("/udata/model.tflite"))
///     .backend(neurosat_tract::tflite_backend_factory())
///     .build()?;
/// ```
#[derive(Default)]
pub struct InterpreterBuilder {
    source: Option<ModelSource>,
    options: InterpreterOptions,
    backend_factory: Option<BackendFactory>,
}

impl InterpreterBuilder {
    pub fn source(mut self, source: impl Into<ModelSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn options(mut self, options: InterpreterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn backend(mut self, factory: BackendFactory) -> Self {
        self.backend_factory = Some(factory);
        self
    }

    pub fn build(self) -> Result<Interpreter> {
        let source = self.source.ok_or_else(|| {
            Error::InvalidConfig("No model source configured. Use .source() to set one.".to_string())
        })?;
        let backend_factory = self.backend_factory.ok_or_else(|| {
            Error::InvalidConfig(
                "No inference backend configured. Use .backend() to set one.".to_string(),
            )
        })?;
        self.options.validate()?;

        tracing::debug!("Loading model from {}", source.describe());
        let backend = backend_factory(&source, &self.options)?;
        Interpreter::bind(backend, &self.options)
    }
}
