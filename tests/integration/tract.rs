//! tract backend integration tests
//!
//! Graphs are built programmatically, and ONNX fixtures are serialized at
//! test time, so no binary fixtures are needed.

use crate::helpers::tolerances::*;
use approx::assert_relative_eq;
use neurosat::prelude::*;
use neurosat::tract::TractBackend;
use neurosat::InferenceBackend;
use tract_core::ops::nn::{Reduce, Reducer};
use tract_core::prelude::*;

/// Saturation-shaped graph: `y = 0.02 * x0 + 0.01 * x1`, `[1, 2] -> [1, 1]`.
fn linear_saturation_graph() -> TractResult<TypedModel> {
    let mut model = TypedModel::default();
    let input = model.add_source("input", f32::fact([1usize, 2]))?;
    let weights = model.add_const("weights", tensor2(&[[0.02f32, 0.01]]))?;
    let scaled = model.wire_node("scale", tract_core::ops::math::mul(), &[input, weights])?;
    let sum = model.wire_node("sum", Reduce::new(tvec!(1), Reducer::Sum), &scaled)?;
    model.set_output_outlets(&sum)?;
    Ok(model)
}

fn interpreter() -> Interpreter {
    let backend = TractBackend::from_typed(linear_saturation_graph().unwrap(), "tract/graph")
        .expect("Failed to plan graph");
    Interpreter::bind(Box::new(backend), &InterpreterOptions::default())
        .expect("Failed to bind graph")
}

#[test]
fn test_reference_scenario_on_tract() {
    let mut interpreter = interpreter();
    assert_eq!(interpreter.input_size_1d(), Some(2));
    assert_eq!(interpreter.output_size(), 1);
    assert_eq!(interpreter.input_dims(), &[1, 2]);
    assert_eq!(interpreter.output_dims(), &[1, 1]);

    let mut output = [0.0f32];
    interpreter.invoke(&[0.0, 50.0], &mut output).unwrap();
    assert_relative_eq!(output[0], 0.5, epsilon = INFERENCE_EPSILON);

    let mut again = [0.0f32];
    interpreter.invoke(&[0.0, 50.0], &mut again).unwrap();
    assert_eq!(output[0].to_bits(), again[0].to_bits());
}

#[test]
fn test_sample_sweep() {
    let mut interpreter = interpreter();
    let mut output = [0.0f32];
    for i in -10..=10 {
        let sample = i as f32 / 10.0;
        interpreter.invoke(&[sample, 50.0], &mut output).unwrap();
        assert_relative_eq!(output[0], 0.02 * sample + 0.5, epsilon = INFERENCE_EPSILON);
    }
}

#[cfg(feature = "tflite")]
#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = neurosat::open(dir.path().join("saturation_model.tflite")).unwrap_err();
    match err {
        neurosat::Error::Core(e) => assert_eq!(e.kind(), neurosat::ErrorKind::Io),
        other => panic!("unexpected error: {other}"),
    }
}

#[cfg(feature = "onnx")]
#[test]
fn test_open_garbage_buffer() {
    let err = neurosat::open(vec![0xffu8; 64]).unwrap_err();
    match err {
        neurosat::Error::Core(e) => {
            assert_eq!(e.kind(), neurosat::ErrorKind::ModelInvalid)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_programmatic_graph_runs_on_kernels() {
    let backend = TractBackend::from_typed(linear_saturation_graph().unwrap(), "tract/graph").unwrap();
    assert!(backend.is_allocation_free());
    assert!(backend.capabilities().allocation_free);
}

#[cfg(feature = "onnx")]
mod onnx {
    use super::*;
    use crate::helpers::onnx::{quarter_gain_onnx, Batch};

    fn assert_quarter_gain(mut interpreter: Interpreter) {
        assert_eq!(interpreter.input_dims(), &[1, 2]);
        assert_eq!(interpreter.output_dims(), &[1, 1]);
        assert_eq!(interpreter.backend_name(), "tract/ONNX");

        let mut output = [0.0f32];
        interpreter.invoke(&[0.0, 50.0], &mut output).unwrap();
        assert_relative_eq!(output[0], 12.5, epsilon = INFERENCE_EPSILON);
    }

    #[test]
    fn test_open_symbolic_batch_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saturation_model.onnx");
        std::fs::write(&path, quarter_gain_onnx(Batch::Symbolic)).unwrap();
        assert_quarter_gain(neurosat::open(path).unwrap());
    }

    #[test]
    fn test_open_fixed_batch_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saturation_model.onnx");
        std::fs::write(&path, quarter_gain_onnx(Batch::Fixed)).unwrap();
        assert_quarter_gain(neurosat::open(path).unwrap());
    }

    #[test]
    fn test_open_symbolic_batch_from_buffer() {
        assert_quarter_gain(neurosat::open(quarter_gain_onnx(Batch::Symbolic)).unwrap());
    }

    #[test]
    fn test_open_fixed_batch_from_buffer() {
        assert_quarter_gain(neurosat::open(quarter_gain_onnx(Batch::Fixed)).unwrap());
    }

    #[test]
    fn test_loaded_model_runs_on_kernels() {
        let source = ModelSource::buffer(quarter_gain_onnx(Batch::Symbolic));
        let backend = neurosat::tract::load_onnx(&source).unwrap();
        assert!(backend.is_allocation_free());
    }

    #[cfg(feature = "plugin")]
    #[test]
    fn test_saturator_over_onnx_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saturation_model.onnx");
        std::fs::write(&path, quarter_gain_onnx(Batch::Symbolic)).unwrap();

        let config = SaturatorConfig {
            source: neurosat::plugin::ModelLocation::File,
            model_path: Some(path),
            ..Default::default()
        };
        let mut saturator = neurosat::open_saturator(&config, &ResourceTable::new()).unwrap();
        saturator.gain().set(1.0);

        let mut mono = [0.3f32, -0.7];
        let mut channels: [&mut [f32]; 1] = [&mut mono];
        saturator.process_block(&mut channels, 1).unwrap();
        assert_relative_eq!(mono[0], 50.0, epsilon = INFERENCE_EPSILON);
        assert_relative_eq!(mono[1], 50.0, epsilon = INFERENCE_EPSILON);
    }
}
