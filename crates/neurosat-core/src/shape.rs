//! Tensor metadata and input-rank classification.

use crate::{Error, Result};
use std::fmt;

/// Which side of the graph a tensor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorKind {
    Input,
    Output,
}

impl fmt::Display for TensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Element type of a graph tensor. Only `F32` can be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    F32,
    Other(String),
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F32 => write!(f, "f32"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Graph input/output description reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    pub name: String,
    pub dims: Vec<usize>,
    pub element_type: ElementType,
}

impl TensorInfo {
    pub fn f32(name: impl Into<String>, dims: impl Into<Vec<usize>>) -> Self {
        Self {
            name: name.into(),
            dims: dims.into(),
            element_type: ElementType::F32,
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn element_count(&self) -> usize {
        self.dims.iter().product()
    }
}

/// How the single input tensor is laid out.
///
/// Fixed for the lifetime of an interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLayout {
    /// `[1, len]`: a flat feature vector.
    Vector { len: usize },
    /// `[1, rows, cols]` or `[1, rows, cols, 1]`: a row-major feature matrix.
    Matrix { rows: usize, cols: usize },
}

impl InputLayout {
    /// Classify an input tensor shape.
    ///
    /// Rank 2 is a vector, rank 3 a matrix, rank 4 a matrix with a trailing
    /// channel of 1. The leading batch dimension must be 1.
    pub fn classify(dims: &[usize]) -> Result<Self> {
        if dims.iter().any(|&d| d == 0) {
            return Err(Error::ShapeUnsupported(format!(
                "input tensor {:?} has a zero-sized dimension",
                dims
            )));
        }
        if let Some(&batch) = dims.first() {
            if batch != 1 && dims.len() > 1 {
                return Err(Error::ShapeUnsupported(format!(
                    "input tensor {:?} has batch size {}, only 1 is supported",
                    dims, batch
                )));
            }
        }

        match *dims {
            [_, len] => Ok(Self::Vector { len }),
            [_, rows, cols] => Ok(Self::Matrix { rows, cols }),
            [_, rows, cols, 1] => Ok(Self::Matrix { rows, cols }),
            [_, _, _, channels] => Err(Error::ShapeUnsupported(format!(
                "input tensor {:?} has {} channels, only 1 is supported",
                dims, channels
            ))),
            _ => Err(Error::ShapeUnsupported(format!(
                "input tensor of rank {} ({:?}), expected [1, N] or [1, R, C]",
                dims.len(),
                dims
            ))),
        }
    }

    /// Number of elements the input buffer holds.
    pub fn len(&self) -> usize {
        match *self {
            Self::Vector { len } => len,
            Self::Matrix { rows, cols } => rows * cols,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Self::Matrix { .. })
    }
}

impl fmt::Display for InputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vector { len } => write!(f, "1-D [{}]", len),
            Self::Matrix { rows, cols } => write!(f, "2-D [{} x {}]", rows, cols),
        }
    }
}

/// Output element count: the last dimension, `(1, 1, ..., size)`.
pub fn output_len(dims: &[usize]) -> Result<usize> {
    match dims.last() {
        Some(&len) if len > 0 => Ok(len),
        _ => Err(Error::ShapeUnsupported(format!(
            "output tensor {:?} has no non-empty last dimension",
            dims
        ))),
    }
}
