//! Saturator configuration, loaded from TOML.
//!
//! ```toml
//! model = "saturation_model.tflite"
//! source = "embedded"
//! min_gain = 0.1
//! max_gain = 200.0
//! default_gain = 0.5
//!
//! [options]
//! num_threads = 1
//! ```

use crate::error::{Error, Result};
use neurosat_core::{InterpreterOptions, ModelSource, ParameterRange, ParameterScale, ResourceTable};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lowest gain value fed to the model.
pub const MIN_SAT_GAIN: f32 = 0.1;
/// Highest gain value fed to the model.
pub const MAX_SAT_GAIN: f32 = 200.0;
/// Declared file name of the bundled model.
pub const DEFAULT_MODEL: &str = "saturation_model.tflite";

/// Where the model bytes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelLocation {
    /// Looked up by `model` in the application's [`ResourceTable`].
    #[default]
    Embedded,
    /// Read from `model_path` (or `model` when no path is given).
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturatorConfig {
    /// Declared model file name.
    pub model: String,
    pub source: ModelLocation,
    pub model_path: Option<PathBuf>,
    pub min_gain: f32,
    pub max_gain: f32,
    /// Initial normalized knob position in `[0, 1]`.
    pub default_gain: f32,
    pub gain_scale: ParameterScale,
    pub options: InterpreterOptions,
}

impl Default for SaturatorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            source: ModelLocation::Embedded,
            model_path: None,
            min_gain: MIN_SAT_GAIN,
            max_gain: MAX_SAT_GAIN,
            default_gain: 0.0,
            gain_scale: ParameterScale::Linear,
            options: InterpreterOptions::default(),
        }
    }
}

impl SaturatorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load the TOML sidecar next to a model file (`model.tflite` → `model.toml`).
    ///
    /// `Ok(None)` when there is no sidecar. A sidecar without `model_path`
    /// points at the model it sits next to.
    pub fn sidecar(model_path: impl AsRef<Path>) -> Result<Option<Self>> {
        let model_path = model_path.as_ref();
        let toml_path = model_path.with_extension("toml");
        if !toml_path.exists() {
            return Ok(None);
        }

        tracing::debug!("Loading model config from {}", toml_path.display());
        let mut config = Self::from_file(&toml_path)?;
        if config.model_path.is_none() {
            config.source = ModelLocation::File;
            config.model_path = Some(model_path.to_path_buf());
        }
        Ok(Some(config))
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(Error::InvalidConfig("model must not be empty".to_string()));
        }
        if !self.min_gain.is_finite() || !self.max_gain.is_finite() {
            return Err(Error::InvalidConfig(
                "min_gain and max_gain must be finite".to_string(),
            ));
        }
        if self.min_gain >= self.max_gain {
            return Err(Error::InvalidConfig(format!(
                "min_gain ({}) must be below max_gain ({})",
                self.min_gain, self.max_gain
            )));
        }
        if self.gain_scale == ParameterScale::Logarithmic && self.min_gain <= 0.0 {
            return Err(Error::InvalidConfig(
                "logarithmic gain_scale requires min_gain > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.default_gain) {
            return Err(Error::InvalidConfig(format!(
                "default_gain must be within [0, 1], got {}",
                self.default_gain
            )));
        }
        self.options.validate()?;
        Ok(())
    }

    /// Mapping from the normalized knob to the gain fed to the model.
    ///
    /// `default` is `default_gain` mapped through the configured scale.
    pub fn gain_range(&self) -> ParameterRange {
        let mut range =
            ParameterRange::new(self.min_gain, self.max_gain, self.min_gain, self.gain_scale);
        range.default = range.denormalize(self.default_gain);
        range
    }

    /// Resolve the configured model to a source.
    pub fn model_source(&self, resources: &ResourceTable) -> Result<ModelSource> {
        match self.source {
            ModelLocation::Embedded => Ok(resources.source(&self.model)?),
            ModelLocation::File => {
                let path = self
                    .model_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(&self.model));
                Ok(ModelSource::Path(path))
            }
        }
    }
}
