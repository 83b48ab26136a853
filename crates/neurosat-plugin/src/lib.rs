//! Neural saturation processor.
//!
//! - [`Saturator`]: per-sample invocation of a `[sample, gain] -> [sample]` model
//! - [`SaturatorConfig`]: TOML configuration (model location, gain range, options)
//! - [`GainParameter`]: lock-free knob shared with the host's control thread
//!
//! ```rust,ignore
//! let mut resources = ResourceTable::new();
//! resources.insert_static("saturation_model.tflite", include_bytes!("saturation_model.tflite"));
//!
//! let mut saturator = Saturator::from_config(
//!     &SaturatorConfig::default(),
//!     &resources,
//!     neurosat_tract::backend_factory(),
//! )?;
//! saturator.gain().set(0.5);
//! saturator.process_block(&mut channels, 2)?;
//! ```

mod config;
pub use config::{ModelLocation, SaturatorConfig, DEFAULT_MODEL, MAX_SAT_GAIN, MIN_SAT_GAIN};

pub mod error;
pub use error::{Error, Result};

mod gain;
pub use gain::GainParameter;

mod saturator;
pub use saturator::Saturator;
