//! Error types for neurosat-core.
//!
//! Two tiers: [`Error`] covers everything that can go wrong while a model is
//! loaded, built, bound and primed (non-real-time). [`InvokeError`] covers the
//! only faults expected after construction: caller buffers that do not match
//! the declared tensor sizes, plus backend forward failures.

use crate::model::ModelFormat;
use crate::shape::TensorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Construction-time error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read model from {}: {source}", path.display())]
    ModelRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model: {0}")]
    ModelInvalid(String),

    #[error("Unsupported operator set: {0}")]
    OperatorUnsupported(String),

    #[error("Unsupported tensor shape: {0}")]
    ShapeUnsupported(String),

    #[error("Expected exactly one {kind} tensor, the model has {found}")]
    TensorCount { kind: TensorKind, found: usize },

    #[error("Tensor binding failed: {0}")]
    Binding(String),

    #[error("Priming inference failed: {0}")]
    Priming(#[source] InvokeError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Model resource not found: {0}")]
    ResourceNotFound(String),

    #[error("No inference backend compiled in for {0} models")]
    BackendUnavailable(ModelFormat),

    #[error("Backend initialization failed: {0}")]
    Backend(#[from] InferenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of construction failures.
///
/// Lets the embedding application decide whether a failure is a packaging
/// problem (bad model) or a configuration problem without matching on every
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ModelInvalid,
    OperatorUnsupported,
    ShapeUnsupported,
    Configuration,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ModelInvalid(_) => ErrorKind::ModelInvalid,
            Error::OperatorUnsupported(_) | Error::Backend(_) | Error::Priming(_) => {
                ErrorKind::OperatorUnsupported
            }
            Error::ShapeUnsupported(_) | Error::TensorCount { .. } | Error::Binding(_) => {
                ErrorKind::ShapeUnsupported
            }
            Error::InvalidConfig(_)
            | Error::ResourceNotFound(_)
            | Error::BackendUnavailable(_) => ErrorKind::Configuration,
            Error::ModelRead { .. } | Error::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Invocation-time error.
///
/// Size checks run before any tensor memory or caller output is touched, so a
/// returned size error guarantees nothing was written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("input vector has to have size {expected} (found {found} instead)")]
    InputSize { expected: usize, found: usize },

    #[error("output vector has to have size {expected} (found {found} instead)")]
    OutputSize { expected: usize, found: usize },

    #[error(
        "input matrix has to have size {expected_rows}x{expected_cols} (found {rows}x{cols} instead)"
    )]
    MatrixShape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("flat input has {len} elements, {rows}x{cols} were declared")]
    FlatLength { len: usize, rows: usize, cols: usize },

    #[error("model takes a 1-D input vector, 2-D invocation is not available")]
    NotMatrixInput,

    #[error("{0}")]
    Forward(#[from] InferenceError),
}

/// Failure reported by an inference backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("Forward pass failed: {0}")]
    ForwardFailed(String),

    #[error("Backend initialization failed: {0}")]
    BackendInit(String),
}
