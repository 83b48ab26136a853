//! Decluttered tract graphs lowered onto preallocated `f32` kernels.
//!
//! Every value in the graph gets a fixed region of a single arena whose
//! layout is decided at compile time. [`CompiledGraph::allocate`] creates the
//! arena once; [`CompiledGraph::run`] then only reads and writes it, so a
//! forward pass never touches the allocator.

use std::collections::HashMap;
use thiserror::Error;
use tract_core::ops::array::MultiBroadcastTo;
use tract_core::ops::binary::TypedBinOp;
use tract_core::ops::cast::Cast;
use tract_core::ops::change_axes::AxisOp;
use tract_core::ops::einsum::EinSum;
use tract_core::ops::element_wise::ElementWiseOp;
use tract_core::ops::identity::Identity;
use tract_core::ops::konst::Const;
use tract_core::ops::math;
use tract_core::ops::nn::{self, Reduce, Reducer, Softmax};
use tract_core::ops::source::TypedSource;
use tract_core::prelude::{Datum, DatumType, Op, OutletId, TypedModel, TypedNode};

/// Why a graph cannot run on the preallocated kernels.
#[derive(Debug, Error)]
pub(crate) enum LowerError {
    #[error("operator {op} at '{node}' has no preallocated kernel")]
    Operator { node: String, op: String },

    #[error("'{node}' produces {datum_type:?}, only f32 values can be preallocated")]
    Datum { node: String, datum_type: DatumType },

    #[error("'{node}' has a shape that is not fully known")]
    Shape { node: String },

    #[error("'{node}' cannot broadcast {operand:?} to {target:?}")]
    Broadcast {
        node: String,
        operand: Vec<usize>,
        target: Vec<usize>,
    },

    #[error("expected one graph {kind}, found {found}")]
    Outlets { kind: &'static str, found: usize },

    #[error(transparent)]
    Tract(#[from] tract_core::prelude::TractError),
}

/// A value's region of the arena, row-major and contiguous.
#[derive(Debug, Clone)]
struct Region {
    offset: usize,
    shape: Vec<usize>,
}

impl Region {
    fn len(&self) -> usize {
        self.shape.iter().product()
    }

    fn strides(&self) -> Vec<usize> {
        row_major_strides(&self.shape)
    }
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Odometer over a fixed iteration space, yielding one arena offset per
/// operand. The counter is allocated with the walk and reused on every pass.
#[derive(Debug)]
struct Walk<const N: usize> {
    dims: Vec<usize>,
    strides: Vec<[usize; N]>,
    base: [usize; N],
    counter: Vec<usize>,
}

impl<const N: usize> Walk<N> {
    fn new(dims: Vec<usize>, strides: Vec<[usize; N]>, base: [usize; N]) -> Self {
        let counter = vec![0; dims.len()];
        Self {
            dims,
            strides,
            base,
            counter,
        }
    }

    #[inline]
    fn for_each(&mut self, mut f: impl FnMut([usize; N])) {
        if self.dims.contains(&0) {
            return;
        }
        self.counter.fill(0);
        let mut at = self.base;
        loop {
            f(at);
            let mut axis = self.dims.len();
            loop {
                if axis == 0 {
                    return;
                }
                axis -= 1;
                self.counter[axis] += 1;
                if self.counter[axis] < self.dims[axis] {
                    for (offset, stride) in at.iter_mut().zip(&self.strides[axis]) {
                        *offset += stride;
                    }
                    break;
                }
                self.counter[axis] = 0;
                let span = self.dims[axis] - 1;
                for (offset, stride) in at.iter_mut().zip(&self.strides[axis]) {
                    *offset -= stride * span;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Unary {
    Abs,
    Cos,
    Exp,
    Ln,
    Neg,
    Recip,
    Rsqrt,
    Sigmoid,
    Sin,
    Sqrt,
    Square,
    Tanh,
    LeakyRelu(f32),
    Scale(f32),
}

impl Unary {
    fn lower(op: &ElementWiseOp) -> Option<Self> {
        let mini = &op.0;
        let unary = if mini.is::<math::Abs>() {
            Unary::Abs
        } else if mini.is::<math::Cos>() {
            Unary::Cos
        } else if mini.is::<math::Exp>() {
            Unary::Exp
        } else if mini.is::<math::Ln>() {
            Unary::Ln
        } else if mini.is::<math::Neg>() {
            Unary::Neg
        } else if mini.is::<math::Recip>() {
            Unary::Recip
        } else if mini.is::<math::Rsqrt>() {
            Unary::Rsqrt
        } else if mini.is::<nn::Sigmoid>() {
            Unary::Sigmoid
        } else if mini.is::<math::Sin>() {
            Unary::Sin
        } else if mini.is::<math::Sqrt>() {
            Unary::Sqrt
        } else if mini.is::<math::Square>() {
            Unary::Square
        } else if mini.is::<math::Tanh>() {
            Unary::Tanh
        } else if let Some(leaky) = mini.downcast_ref::<nn::LeakyRelu>() {
            Unary::LeakyRelu(leaky.alpha)
        } else {
            return None;
        };
        Some(unary)
    }

    #[inline]
    fn apply(self, x: f32) -> f32 {
        match self {
            Unary::Abs => x.abs(),
            Unary::Cos => x.cos(),
            Unary::Exp => x.exp(),
            Unary::Ln => x.ln(),
            Unary::Neg => -x,
            Unary::Recip => x.recip(),
            Unary::Rsqrt => x.sqrt().recip(),
            Unary::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Unary::Sin => x.sin(),
            Unary::Sqrt => x.sqrt(),
            Unary::Square => x * x,
            Unary::Tanh => x.tanh(),
            Unary::LeakyRelu(alpha) => {
                if x >= 0.0 {
                    x
                } else {
                    alpha * x
                }
            }
            Unary::Scale(factor) => x * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Binary {
    Add,
    Sub,
    Mul,
    Div,
    Max,
    Min,
    Pow,
}

impl Binary {
    fn lower(op: &TypedBinOp) -> Option<Self> {
        let mini = &op.0;
        let binary = if mini.is::<math::Add>() {
            Binary::Add
        } else if mini.is::<math::Sub>() {
            Binary::Sub
        } else if mini.is::<math::Mul>() {
            Binary::Mul
        } else if mini.is::<math::Div>() {
            Binary::Div
        } else if mini.is::<math::Max>() {
            Binary::Max
        } else if mini.is::<math::Min>() {
            Binary::Min
        } else if mini.is::<math::Pow>() {
            Binary::Pow
        } else {
            return None;
        };
        Some(binary)
    }

    #[inline]
    fn apply(self, a: f32, b: f32) -> f32 {
        match self {
            Binary::Add => a + b,
            Binary::Sub => a - b,
            Binary::Mul => a * b,
            Binary::Div => a / b,
            Binary::Max => a.max(b),
            Binary::Min => a.min(b),
            Binary::Pow => a.powf(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Fold {
    Sum,
    Max,
    Min,
    Prod,
    SumOfSquares,
}

impl Fold {
    fn init(self) -> f32 {
        match self {
            Fold::Sum | Fold::SumOfSquares => 0.0,
            Fold::Max => f32::NEG_INFINITY,
            Fold::Min => f32::INFINITY,
            Fold::Prod => 1.0,
        }
    }

    #[inline]
    fn apply(self, acc: f32, x: f32) -> f32 {
        match self {
            Fold::Sum => acc + x,
            Fold::Max => acc.max(x),
            Fold::Min => acc.min(x),
            Fold::Prod => acc * x,
            Fold::SumOfSquares => acc + x * x,
        }
    }
}

#[derive(Debug)]
enum Step {
    /// Element-wise over a contiguous range; `src` may equal `dst`.
    Map {
        op: Unary,
        src: usize,
        dst: usize,
        len: usize,
    },
    /// Broadcasting binary op. Offsets are `[dst, lhs, rhs]`.
    Zip { op: Binary, walk: Walk<3> },
    /// Reduction into `dst`, whose stride is 0 on folded axes. Offsets are
    /// `[dst, src]`.
    Fold {
        op: Fold,
        dst: usize,
        len: usize,
        walk: Walk<2>,
    },
    /// Sum of products of two operands. Offsets are `[dst, lhs, rhs]`.
    Contract {
        dst: usize,
        len: usize,
        walk: Walk<3>,
    },
    /// Strided copy (axis permutation, broadcast). Offsets are `[dst, src]`.
    Copy { walk: Walk<2> },
}

impl Step {
    #[inline]
    fn run(&mut self, arena: &mut [f32]) {
        match self {
            Step::Map { op, src, dst, len } => {
                let op = *op;
                for i in 0..*len {
                    arena[*dst + i] = op.apply(arena[*src + i]);
                }
            }
            Step::Zip { op, walk } => {
                let op = *op;
                walk.for_each(|[dst, lhs, rhs]| arena[dst] = op.apply(arena[lhs], arena[rhs]));
            }
            Step::Fold { op, dst, len, walk } => {
                let op = *op;
                arena[*dst..*dst + *len].fill(op.init());
                walk.for_each(|[dst, src]| arena[dst] = op.apply(arena[dst], arena[src]));
            }
            Step::Contract { dst, len, walk } => {
                arena[*dst..*dst + *len].fill(0.0);
                walk.for_each(|[dst, lhs, rhs]| arena[dst] += arena[lhs] * arena[rhs]);
            }
            Step::Copy { walk } => {
                walk.for_each(|[dst, src]| arena[dst] = arena[src]);
            }
        }
    }
}

/// A graph lowered onto kernels over one preallocated arena.
#[derive(Debug)]
pub(crate) struct CompiledGraph {
    arena_len: usize,
    constants: Vec<(usize, Vec<f32>)>,
    input: Region,
    output: Region,
    steps: Vec<Step>,
    arena: Vec<f32>,
}

impl CompiledGraph {
    /// Lower a decluttered graph with a single `f32` input and output.
    pub(crate) fn compile(model: &TypedModel) -> Result<Self, LowerError> {
        let inputs = model.input_outlets()?;
        let outputs = model.output_outlets()?;
        let [input] = inputs else {
            return Err(LowerError::Outlets {
                kind: "input",
                found: inputs.len(),
            });
        };
        let [output] = outputs else {
            return Err(LowerError::Outlets {
                kind: "output",
                found: outputs.len(),
            });
        };

        let mut lowering = Lowering::default();
        for id in model.eval_order()? {
            lowering.lower(model, model.node(id))?;
        }

        let input = lowering.region(model, *input)?.clone();
        let output = lowering.region(model, *output)?.clone();
        Ok(Self {
            arena_len: lowering.arena_len,
            constants: lowering.constants,
            input,
            output,
            steps: lowering.steps,
            arena: Vec::new(),
        })
    }

    pub(crate) fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub(crate) fn arena_len(&self) -> usize {
        self.arena_len
    }

    /// Create the arena and write the constants into it.
    pub(crate) fn allocate(&mut self) {
        let mut arena = vec![0.0; self.arena_len];
        for (offset, values) in &self.constants {
            arena[*offset..*offset + values.len()].copy_from_slice(values);
        }
        self.arena = arena;
    }

    pub(crate) fn is_allocated(&self) -> bool {
        self.arena.len() == self.arena_len && self.arena_len > 0
    }

    pub(crate) fn input_len(&self) -> usize {
        self.input.len()
    }

    pub(crate) fn output_len(&self) -> usize {
        self.output.len()
    }

    /// One forward pass. `input` must fill the input region exactly and
    /// `output` receives the first `output.len()` output values.
    #[inline]
    pub(crate) fn run(&mut self, input: &[f32], output: &mut [f32]) {
        let Self {
            input: input_region,
            output: output_region,
            steps,
            arena,
            ..
        } = self;
        let start = input_region.offset;
        arena[start..start + input.len()].copy_from_slice(input);
        for step in steps.iter_mut() {
            step.run(arena);
        }
        let start = output_region.offset;
        output.copy_from_slice(&arena[start..start + output.len()]);
    }
}

#[derive(Default)]
struct Lowering {
    regions: HashMap<OutletId, Region>,
    arena_len: usize,
    constants: Vec<(usize, Vec<f32>)>,
    steps: Vec<Step>,
}

impl Lowering {
    fn reserve(&mut self, shape: Vec<usize>) -> Region {
        let region = Region {
            offset: self.arena_len,
            shape,
        };
        self.arena_len += region.len();
        region
    }

    fn region(&self, model: &TypedModel, outlet: OutletId) -> Result<&Region, LowerError> {
        self.regions.get(&outlet).ok_or_else(|| {
            let node = model.node(outlet.node);
            LowerError::Operator {
                node: node.name.clone(),
                op: node.op.name().to_string(),
            }
        })
    }

    fn input(&self, model: &TypedModel, node: &TypedNode, slot: usize) -> Result<Region, LowerError> {
        let outlet = node.inputs.get(slot).ok_or_else(|| unsupported(node))?;
        Ok(self.region(model, *outlet)?.clone())
    }

    /// Shape of the node's single `f32` output.
    fn output_shape(node: &TypedNode) -> Result<Vec<usize>, LowerError> {
        let [outlet] = node.outputs.as_slice() else {
            return Err(unsupported(node));
        };
        if outlet.fact.datum_type != f32::datum_type() {
            return Err(LowerError::Datum {
                node: node.name.clone(),
                datum_type: outlet.fact.datum_type,
            });
        }
        outlet
            .fact
            .shape
            .as_concrete()
            .map(|dims| dims.to_vec())
            .ok_or_else(|| LowerError::Shape {
                node: node.name.clone(),
            })
    }

    fn bind(&mut self, node: &TypedNode, region: Region) {
        self.regions.insert(OutletId::new(node.id, 0), region);
    }

    fn lower(&mut self, model: &TypedModel, node: &TypedNode) -> Result<(), LowerError> {
        if let Some(konst) = node.op_as::<Const>() {
            // Non-f32 constants (shapes, indices) stay out of the arena; a
            // kernel that reads one fails to find its region.
            if let Ok(values) = konst.0.as_slice::<f32>() {
                let region = self.reserve(konst.0.shape().to_vec());
                self.constants.push((region.offset, values.to_vec()));
                self.bind(node, region);
            }
            return Ok(());
        }

        let shape = Self::output_shape(node)?;

        if node.op_as::<TypedSource>().is_some() {
            let region = self.reserve(shape);
            self.bind(node, region);
        } else if node.op_as::<Identity>().is_some() {
            self.alias(model, node, shape)?;
        } else if let Some(cast) = node.op_as::<Cast>() {
            if cast.to != f32::datum_type() {
                return Err(unsupported(node));
            }
            self.alias(model, node, shape)?;
        } else if let Some(axis_op) = node.op_as::<AxisOp>() {
            match axis_op {
                AxisOp::Add(_) | AxisOp::Rm(_) | AxisOp::Reshape(..) => {
                    self.alias(model, node, shape)?
                }
                AxisOp::Move(from, to) => self.permute(model, node, *from, *to, shape)?,
            }
        } else if node.op_as::<MultiBroadcastTo>().is_some() {
            self.broadcast(model, node, shape)?;
        } else if let Some(bin) = node.op_as::<TypedBinOp>() {
            let op = Binary::lower(bin).ok_or_else(|| unsupported(node))?;
            self.zip(model, node, op, shape)?;
        } else if let Some(element_wise) = node.op_as::<ElementWiseOp>() {
            let op = Unary::lower(element_wise).ok_or_else(|| unsupported(node))?;
            let src = self.input(model, node, 0)?;
            let dst = self.reserve(shape);
            self.steps.push(Step::Map {
                op,
                src: src.offset,
                dst: dst.offset,
                len: dst.len(),
            });
            self.bind(node, dst);
        } else if let Some(einsum) = node.op_as::<EinSum>() {
            self.einsum(model, node, einsum, shape)?;
        } else if let Some(reduce) = node.op_as::<Reduce>() {
            self.reduce(model, node, reduce, shape)?;
        } else if let Some(softmax) = node.op_as::<Softmax>() {
            self.softmax(model, node, softmax, shape)?;
        } else {
            return Err(unsupported(node));
        }
        Ok(())
    }

    /// Same data, new shape.
    fn alias(&mut self, model: &TypedModel, node: &TypedNode, shape: Vec<usize>) -> Result<(), LowerError> {
        let src = self.input(model, node, 0)?;
        if src.len() != shape.iter().product::<usize>() {
            return Err(unsupported(node));
        }
        self.bind(
            node,
            Region {
                offset: src.offset,
                shape,
            },
        );
        Ok(())
    }

    fn permute(
        &mut self,
        model: &TypedModel,
        node: &TypedNode,
        from: usize,
        to: usize,
        shape: Vec<usize>,
    ) -> Result<(), LowerError> {
        let src = self.input(model, node, 0)?;
        let rank = src.shape.len();
        if from >= rank || to >= rank {
            return Err(unsupported(node));
        }
        // order[output axis] = input axis
        let mut order: Vec<usize> = (0..rank).collect();
        let moved = order.remove(from);
        order.insert(to, moved);

        let dst = self.reserve(shape);
        let dst_strides = dst.strides();
        let src_strides = src.strides();
        let strides = (0..rank)
            .map(|axis| {
                let position = order.iter().position(|&a| a == axis).unwrap_or(axis);
                [dst_strides[position], src_strides[axis]]
            })
            .collect();
        self.steps.push(Step::Copy {
            walk: Walk::new(src.shape.clone(), strides, [dst.offset, src.offset]),
        });
        self.bind(node, dst);
        Ok(())
    }

    fn broadcast(&mut self, model: &TypedModel, node: &TypedNode, shape: Vec<usize>) -> Result<(), LowerError> {
        let src = self.input(model, node, 0)?;
        let dst = self.reserve(shape);
        let src_strides = broadcast_strides(node, &src, &dst.shape)?;
        let strides = dst
            .strides()
            .into_iter()
            .zip(src_strides)
            .map(|(d, s)| [d, s])
            .collect();
        self.steps.push(Step::Copy {
            walk: Walk::new(dst.shape.clone(), strides, [dst.offset, src.offset]),
        });
        self.bind(node, dst);
        Ok(())
    }

    fn zip(
        &mut self,
        model: &TypedModel,
        node: &TypedNode,
        op: Binary,
        shape: Vec<usize>,
    ) -> Result<(), LowerError> {
        let lhs = self.input(model, node, 0)?;
        let rhs = self.input(model, node, 1)?;
        let dst = self.reserve(shape);
        let lhs_strides = broadcast_strides(node, &lhs, &dst.shape)?;
        let rhs_strides = broadcast_strides(node, &rhs, &dst.shape)?;
        let strides = dst
            .strides()
            .into_iter()
            .zip(lhs_strides)
            .zip(rhs_strides)
            .map(|((d, l), r)| [d, l, r])
            .collect();
        self.steps.push(Step::Zip {
            op,
            walk: Walk::new(
                dst.shape.clone(),
                strides,
                [dst.offset, lhs.offset, rhs.offset],
            ),
        });
        self.bind(node, dst);
        Ok(())
    }

    fn einsum(
        &mut self,
        model: &TypedModel,
        node: &TypedNode,
        einsum: &EinSum,
        shape: Vec<usize>,
    ) -> Result<(), LowerError> {
        if einsum.q_params.is_some() || einsum.operating_dt != f32::datum_type() {
            return Err(unsupported(node));
        }
        let operands = (0..einsum.axes.input_count())
            .map(|slot| self.input(model, node, slot))
            .collect::<Result<Vec<_>, _>>()?;
        if operands.is_empty() || operands.len() > 2 {
            return Err(unsupported(node));
        }

        let dst = self.reserve(shape);
        let dst_strides = dst.strides();
        let operand_strides: Vec<Vec<usize>> = operands.iter().map(Region::strides).collect();

        let mut dims = Vec::new();
        let mut strides: Vec<[usize; 3]> = Vec::new();
        for axis in einsum.axes.iter_all_axes() {
            let mut size = 1;
            let mut stride = [0usize; 3];

            match axis.outputs.first().map(|p| p.as_slice()) {
                Some([]) | None => {}
                Some([position]) => {
                    size = dst.shape[*position];
                    stride[0] = dst_strides[*position];
                }
                Some(_) => return Err(unsupported(node)),
            }
            for (slot, operand) in operands.iter().enumerate() {
                match axis.inputs.get(slot).map(|p| p.as_slice()) {
                    Some([]) | None => {}
                    Some([position]) => {
                        let dim = operand.shape[*position];
                        if dim != 1 {
                            if size != 1 && size != dim {
                                return Err(LowerError::Broadcast {
                                    node: node.name.clone(),
                                    operand: operand.shape.clone(),
                                    target: dst.shape.clone(),
                                });
                            }
                            size = dim;
                            stride[slot + 1] = operand_strides[slot][*position];
                        }
                    }
                    Some(_) => return Err(unsupported(node)),
                }
            }
            dims.push(size);
            strides.push(stride);
        }

        let len = dst.len();
        match operands.as_slice() {
            [src] => self.steps.push(Step::Fold {
                op: Fold::Sum,
                dst: dst.offset,
                len,
                walk: Walk::new(
                    dims,
                    strides.iter().map(|s| [s[0], s[1]]).collect(),
                    [dst.offset, src.offset],
                ),
            }),
            [lhs, rhs] => self.steps.push(Step::Contract {
                dst: dst.offset,
                len,
                walk: Walk::new(dims, strides, [dst.offset, lhs.offset, rhs.offset]),
            }),
            _ => return Err(unsupported(node)),
        }
        self.bind(node, dst);
        Ok(())
    }

    fn reduce(
        &mut self,
        model: &TypedModel,
        node: &TypedNode,
        reduce: &Reduce,
        shape: Vec<usize>,
    ) -> Result<(), LowerError> {
        let op = match reduce.reducer {
            Reducer::Sum => Fold::Sum,
            Reducer::Max => Fold::Max,
            Reducer::Min => Fold::Min,
            Reducer::Prod => Fold::Prod,
            Reducer::MeanOfSquares => Fold::SumOfSquares,
            _ => return Err(unsupported(node)),
        };
        let src = self.input(model, node, 0)?;
        let dst = self.reserve(shape);
        self.fold_into(op, &src, &dst, &reduce.axes);

        if op == Fold::SumOfSquares {
            let count: usize = reduce.axes.iter().map(|&axis| src.shape[axis]).product();
            self.steps.push(Step::Map {
                op: Unary::Scale(1.0 / count.max(1) as f32),
                src: dst.offset,
                dst: dst.offset,
                len: dst.len(),
            });
        }
        self.bind(node, dst);
        Ok(())
    }

    /// `softmax(x) = exp(x - max) / sum(exp(x - max))` over `axes`.
    fn softmax(
        &mut self,
        model: &TypedModel,
        node: &TypedNode,
        softmax: &Softmax,
        shape: Vec<usize>,
    ) -> Result<(), LowerError> {
        if softmax.quant_output_dt.is_some() {
            return Err(unsupported(node));
        }
        let src = self.input(model, node, 0)?;
        let mut reduced_shape = src.shape.clone();
        for &axis in &softmax.axes {
            reduced_shape[axis] = 1;
        }
        let max = self.reserve(reduced_shape.clone());
        let sum = self.reserve(reduced_shape);
        let dst = self.reserve(shape);

        self.fold_into(Fold::Max, &src, &max, &softmax.axes);
        self.push_zip(node, Binary::Sub, &dst, &src, &max)?;
        self.steps.push(Step::Map {
            op: Unary::Exp,
            src: dst.offset,
            dst: dst.offset,
            len: dst.len(),
        });
        self.fold_into(Fold::Sum, &dst, &sum, &softmax.axes);
        self.push_zip(node, Binary::Div, &dst, &dst, &sum)?;
        self.bind(node, dst);
        Ok(())
    }

    fn fold_into(&mut self, op: Fold, src: &Region, dst: &Region, axes: &[usize]) {
        let src_strides = src.strides();
        let dst_strides = dst.strides();
        let strides = (0..src.shape.len())
            .map(|axis| {
                let dst_stride = if axes.contains(&axis) {
                    0
                } else {
                    dst_strides[axis]
                };
                [dst_stride, src_strides[axis]]
            })
            .collect();
        self.steps.push(Step::Fold {
            op,
            dst: dst.offset,
            len: dst.len(),
            walk: Walk::new(src.shape.clone(), strides, [dst.offset, src.offset]),
        });
    }

    fn push_zip(
        &mut self,
        node: &TypedNode,
        op: Binary,
        dst: &Region,
        lhs: &Region,
        rhs: &Region,
    ) -> Result<(), LowerError> {
        let lhs_strides = broadcast_strides(node, lhs, &dst.shape)?;
        let rhs_strides = broadcast_strides(node, rhs, &dst.shape)?;
        let strides = dst
            .strides()
            .into_iter()
            .zip(lhs_strides)
            .zip(rhs_strides)
            .map(|((d, l), r)| [d, l, r])
            .collect();
        self.steps.push(Step::Zip {
            op,
            walk: Walk::new(
                dst.shape.clone(),
                strides,
                [dst.offset, lhs.offset, rhs.offset],
            ),
        });
        Ok(())
    }
}

/// Strides that read `operand` as if it had `target`'s shape.
fn broadcast_strides(node: &TypedNode, operand: &Region, target: &[usize]) -> Result<Vec<usize>, LowerError> {
    let mismatch = || LowerError::Broadcast {
        node: node.name.clone(),
        operand: operand.shape.clone(),
        target: target.to_vec(),
    };
    if operand.shape.len() != target.len() {
        return Err(mismatch());
    }
    operand
        .shape
        .iter()
        .zip(target)
        .zip(operand.strides())
        .map(|((&dim, &want), stride)| match dim {
            d if d == want => Ok(stride),
            1 => Ok(0),
            _ => Err(mismatch()),
        })
        .collect()
}

fn unsupported(node: &TypedNode) -> LowerError {
    LowerError::Operator {
        node: node.name.clone(),
        op: node.op.name().to_string(),
    }
}
