//! Neural saturation processor.
//!
//! Feeds every input sample through a 2-in/1-out model together with the
//! current gain, and writes the model output back in place.

use crate::config::SaturatorConfig;
use crate::error::Result;
use crate::gain::GainParameter;
use neurosat_core::{
    BackendFactory, Error as CoreError, Interpreter, InvokeError, ParameterRange, ResourceTable,
};
use std::sync::Arc;

/// Model input: `[sample, gain]`.
const MODEL_INPUTS: usize = 2;
/// Model output: `[saturated sample]`.
const MODEL_OUTPUTS: usize = 1;

pub struct Saturator {
    interpreter: Interpreter,
    gain: Arc<GainParameter>,
    gain_range: ParameterRange,
    input: [f32; MODEL_INPUTS],
    output: [f32; MODEL_OUTPUTS],
}

impl Saturator {
    /// Wrap a bound interpreter. The model must map 2 inputs to 1 output.
    pub fn new(
        interpreter: Interpreter,
        config: &SaturatorConfig,
        gain: Arc<GainParameter>,
    ) -> Result<Self> {
        if interpreter.input_size_1d() != Some(MODEL_INPUTS)
            || interpreter.output_size() != MODEL_OUTPUTS
        {
            return Err(CoreError::ShapeUnsupported(format!(
                "saturation model must map [1, {}] to [1, {}], got input {} and {} output(s)",
                MODEL_INPUTS,
                MODEL_OUTPUTS,
                interpreter.input_layout(),
                interpreter.output_size()
            ))
            .into());
        }

        Ok(Self {
            interpreter,
            gain,
            gain_range: config.gain_range(),
            input: [0.0; MODEL_INPUTS],
            output: [0.0; MODEL_OUTPUTS],
        })
    }

    /// Resolve, load and bind the configured model, then wrap it.
    pub fn from_config(
        config: &SaturatorConfig,
        resources: &ResourceTable,
        factory: BackendFactory,
    ) -> Result<Self> {
        config.validate()?;
        let source = config.model_source(resources)?;
        tracing::debug!("Saturator model '{}' from {}", config.model, source.describe());

        let interpreter = Interpreter::builder()
            .source(source)
            .options(config.options.clone())
            .backend(factory)
            .build()?;
        let gain = Arc::new(GainParameter::new(config.gain_range().default_normalized()));

        tracing::info!(
            "Saturator ready: gain {} to {} ({})",
            config.min_gain,
            config.max_gain,
            interpreter.backend_name()
        );
        Self::new(interpreter, config, gain)
    }

    /// Handle for the host's control thread.
    pub fn gain(&self) -> &Arc<GainParameter> {
        &self.gain
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Allow the next block to be processed on a different thread.
    pub fn release_thread(&mut self) {
        self.interpreter.release_thread();
    }

    /// Mono or stereo, with as many inputs as outputs.
    pub fn is_layout_supported(input_channels: usize, output_channels: usize) -> bool {
        matches!(output_channels, 1 | 2) && input_channels == output_channels
    }

    /// Process one block in place.
    ///
    /// The first `input_channels` channels carry input; any channel past them
    /// is cleared. The gain is read once for the whole block.
    pub fn process_block(
        &mut self,
        channels: &mut [&mut [f32]],
        input_channels: usize,
    ) -> std::result::Result<(), InvokeError> {
        self.input[1] = self.gain_range.denormalize(self.gain.get());

        let input_channels = input_channels.min(channels.len());
        let (active, extra) = channels.split_at_mut(input_channels);
        for channel in extra.iter_mut() {
            channel.fill(0.0);
        }

        for channel in active.iter_mut() {
            for sample in channel.iter_mut() {
                self.input[0] = *sample;
                self.interpreter.invoke(&self.input, &mut self.output)?;
                *sample = self.output[0];
            }
        }
        Ok(())
    }
}
