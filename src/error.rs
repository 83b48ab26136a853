//! Centralized error type for the neurosat umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] neurosat_core::Error),

    #[error("Invocation: {0}")]
    Invoke(#[from] neurosat_core::InvokeError),

    #[cfg(feature = "plugin")]
    #[error("Saturator: {0}")]
    Plugin(#[from] neurosat_plugin::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
