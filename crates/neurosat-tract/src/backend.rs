//! [`InferenceBackend`] over a tract graph.

use neurosat_core::{
    BackendCapabilities, ElementType, Error, InferenceBackend, InferenceError, InterpreterOptions,
    Result, TensorInfo,
};
use crate::compiled::CompiledGraph;
use tract_core::prelude::{
    Datum, DatumType, OutletId, SymbolValues, Tensor, TValue, TypedFact, TypedModel,
    TypedRunnableModel,
};

/// A tract graph with a single batch pinned to 1.
///
/// The graph is decluttered and lowered onto kernels over one arena that
/// [`allocate`] creates; from then on [`forward`] never allocates. Graphs with
/// operators the kernels do not cover run on tract's own plan instead, which
/// allocates its tensors on every pass, and report
/// `allocation_free: false` in their capabilities.
///
/// [`allocate`]: InferenceBackend::allocate
/// [`forward`]: InferenceBackend::forward
pub struct TractBackend {
    name: String,
    inputs: Vec<TensorInfo>,
    outputs: Vec<TensorInfo>,
    execution: Execution,
}

enum Execution {
    Compiled(CompiledGraph),
    Planned(TypedRunnableModel<TypedModel>),
}

impl TractBackend {
    /// Pin the batch dimension, declutter and lower a typed model.
    ///
    /// `name` is the front-end label reported in logs, e.g. "tract/ONNX".
    pub fn from_typed(model: TypedModel, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let model = pin_batch(model)?;

        let inputs = describe(&model, model.input_outlets().map_err(shape_error)?)?;
        let outputs = describe(&model, model.output_outlets().map_err(shape_error)?)?;

        tracing::debug!("{}: decluttering {} node(s)", name, model.nodes().len());
        let model = model.into_decluttered().map_err(operator_error)?;

        let execution = match CompiledGraph::compile(&model) {
            Ok(graph) => {
                tracing::debug!(
                    "{}: lowered onto {} kernel(s), {} arena value(s)",
                    name,
                    graph.step_count(),
                    graph.arena_len()
                );
                Execution::Compiled(graph)
            }
            Err(reason) => {
                tracing::warn!(
                    "{}: {}; running the tract plan, which allocates on every invocation",
                    name,
                    reason
                );
                let plan = model
                    .into_optimized()
                    .and_then(|optimized| optimized.into_runnable())
                    .map_err(operator_error)?;
                Execution::Planned(plan)
            }
        };

        Ok(Self {
            name,
            inputs,
            outputs,
            execution,
        })
    }

    /// True when the graph runs on the preallocated kernels.
    pub fn is_allocation_free(&self) -> bool {
        matches!(self.execution, Execution::Compiled(_))
    }
}

impl InferenceBackend for TractBackend {
    fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorInfo] {
        &self.outputs
    }

    fn allocate(&mut self, options: &InterpreterOptions) -> core::result::Result<(), InferenceError> {
        if self.inputs.len() != 1 {
            return Err(InferenceError::BackendInit(format!(
                "expected one input tensor, found {}",
                self.inputs.len()
            )));
        }
        match &mut self.execution {
            Execution::Compiled(graph) => {
                tracing::debug!(
                    "{}: allocating {} arena value(s) ({} thread(s))",
                    self.name,
                    graph.arena_len(),
                    options.num_threads
                );
                graph.allocate();
            }
            Execution::Planned(_) => {
                tracing::debug!("{}: tract allocates per pass, nothing to pin", self.name);
            }
        }
        Ok(())
    }

    fn forward(
        &mut self,
        input: &[f32],
        output: &mut [f32],
    ) -> core::result::Result<(), InferenceError> {
        match &mut self.execution {
            Execution::Compiled(graph) => {
                if !graph.is_allocated() {
                    return Err(InferenceError::ForwardFailed(
                        "arena not allocated".to_string(),
                    ));
                }
                if input.len() != graph.input_len() || output.len() > graph.output_len() {
                    return Err(InferenceError::ForwardFailed(format!(
                        "buffers of {} -> {} elements for a {} -> {} graph",
                        input.len(),
                        output.len(),
                        graph.input_len(),
                        graph.output_len()
                    )));
                }
                graph.run(input, output);
                Ok(())
            }
            Execution::Planned(plan) => {
                let dims = self
                    .inputs
                    .first()
                    .map(|info| info.dims.as_slice())
                    .unwrap_or_default();
                let tensor = Tensor::from_shape(dims, input).map_err(forward_error)?;
                let results = plan
                    .run(std::iter::once(TValue::from(tensor)).collect())
                    .map_err(forward_error)?;
                let values = results
                    .first()
                    .ok_or_else(|| {
                        InferenceError::ForwardFailed("plan produced no output".to_string())
                    })?
                    .as_slice::<f32>()
                    .map_err(forward_error)?;

                let head = values.get(..output.len()).ok_or_else(|| {
                    InferenceError::ForwardFailed(format!(
                        "output has {} elements, {} expected",
                        values.len(),
                        output.len()
                    ))
                })?;
                output.copy_from_slice(head);
                Ok(())
            }
        }
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            name: self.name.clone(),
            supports_reduced_precision: false,
            max_threads: 1,
            allocation_free: self.is_allocation_free(),
        }
    }
}

/// Resolve a symbolic leading (batch) dimension of each input to 1.
fn pin_batch(model: TypedModel) -> Result<TypedModel> {
    let mut values = SymbolValues::default();
    let mut symbolic = false;
    for outlet in model.input_outlets().map_err(shape_error)? {
        let fact = model.outlet_fact(*outlet).map_err(shape_error)?;
        if let Some(batch) = fact.shape.first() {
            for symbol in batch.symbols() {
                values = values.with(&symbol, 1);
                symbolic = true;
            }
        }
    }
    if !symbolic {
        return Ok(model);
    }
    tracing::debug!("pinning symbolic batch dimension to 1");
    model.concretize_dims(&values).map_err(shape_error)
}

fn describe(model: &TypedModel, outlets: &[OutletId]) -> Result<Vec<TensorInfo>> {
    outlets
        .iter()
        .map(|outlet| {
            let fact = model.outlet_fact(*outlet).map_err(shape_error)?;
            Ok(TensorInfo {
                name: model.node(outlet.node).name.clone(),
                dims: concrete_dims(fact)?,
                element_type: element_type(fact.datum_type),
            })
        })
        .collect()
}

fn concrete_dims(fact: &TypedFact) -> Result<Vec<usize>> {
    fact.shape
        .as_concrete()
        .map(|dims| dims.to_vec())
        .ok_or_else(|| {
            Error::ShapeUnsupported(format!(
                "tensor shape {:?} is not fully known",
                fact.shape
            ))
        })
}

fn element_type(datum_type: DatumType) -> ElementType {
    if datum_type == f32::datum_type() {
        ElementType::F32
    } else {
        ElementType::Other(format!("{datum_type:?}").to_lowercase())
    }
}

fn shape_error(e: impl std::fmt::Display) -> Error {
    Error::ShapeUnsupported(e.to_string())
}

fn operator_error(e: impl std::fmt::Display) -> Error {
    Error::OperatorUnsupported(format!("{e:#}"))
}

fn forward_error(e: impl std::fmt::Display) -> InferenceError {
    InferenceError::ForwardFailed(e.to_string())
}
