//! Real-time-safe interpreter wrapper for neural audio models.
//!
//! # Primary API
//!
//! - [`Interpreter`] / [`InterpreterBuilder`]: bind, prime and invoke a model
//! - [`InferenceBackend`] / [`BackendFactory`]: plug in a concrete engine
//! - [`ResourceTable`]: models bundled with the application, by file name
//! - [`argmax`], [`softmax`]: classifier post-processing
//!
//! Construction (load, build, bind, prime) may allocate, log and fail with
//! [`Error`]. After that, invocation only validates buffer lengths, copies
//! and runs one forward pass, failing with [`InvokeError`].
//!
//! # Example
//!
//! ```
//! use neurosat_core::{FnBackend, Interpreter, InterpreterOptions};
//!
//! let backend = FnBackend::new([1, 2], [1, 1], |input, output| {
//!     output[0] = (input[0] * input[1] * 0.01).tanh();
//! });
//! let mut interpreter =
//!     Interpreter::bind(Box::new(backend), &InterpreterOptions::default())?;
//!
//! let mut output = [0.0f32];
//! interpreter.invoke(&[0.0, 50.0], &mut output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub use error::{Error, ErrorKind, InferenceError, InvokeError, Result};

mod backend;
pub use backend::{BackendCapabilities, BackendFactory, InferenceBackend};

mod closure;
pub use closure::FnBackend;

mod confinement;

mod interpreter;
pub use interpreter::{Interpreter, InterpreterBuilder};

mod lockfree;
pub use lockfree::AtomicFloat;

mod math;
pub use math::{argmax, softmax};

mod model;
pub use model::{ModelFormat, ModelSource};

mod options;
pub use options::InterpreterOptions;

mod parameter;
pub use parameter::{ParameterRange, ParameterScale};

mod resources;
pub use resources::ResourceTable;

mod shape;
pub use shape::{output_len, ElementType, InputLayout, TensorInfo, TensorKind};
