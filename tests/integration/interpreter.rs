//! Interpreter integration tests
//!
//! Binding, invocation, introspection and classification through the umbrella API.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use approx::assert_relative_eq;
use neurosat::prelude::*;

/// The reference scenario: 1-D model, 2 inputs, 1 output, `[0.0, 50.0]`.
#[test]
fn test_saturation_model_scenario() {
    let mut interpreter = saturation_interpreter();
    assert_eq!(interpreter.input_size(), 2);
    assert_eq!(interpreter.input_size_1d(), Some(2));
    assert_eq!(interpreter.output_size(), 1);
    assert_eq!(interpreter.input_layout(), InputLayout::Vector { len: 2 });

    let mut first = [f32::NAN];
    let mut second = [f32::NAN];
    assert_eq!(interpreter.invoke(&[0.0, TEST_GAIN], &mut first).unwrap(), 0);
    assert_eq!(interpreter.invoke(&[0.0, TEST_GAIN], &mut second).unwrap(), 0);

    assert!(first[0].is_finite());
    assert_eq!(first[0].to_bits(), second[0].to_bits());
}

#[test]
fn test_block_of_samples_matches_curve() {
    let mut interpreter = saturation_interpreter();
    let block = generate_sine(440.0, 48000.0, TEST_BLOCK_SIZE);
    let mut output = [0.0f32];

    for &sample in &block {
        interpreter.invoke(&[sample, TEST_GAIN], &mut output).unwrap();
        assert_relative_eq!(output[0], saturate(sample, TEST_GAIN), epsilon = FLOAT_EPSILON);
    }
}

#[test]
fn test_size_errors_report_expected_and_found() {
    let mut interpreter = saturation_interpreter();
    let mut output = [1.0f32];

    let err = interpreter.invoke(&[0.0, 1.0, 2.0], &mut output).unwrap_err();
    assert_eq!(
        err.to_string(),
        "input vector has to have size 2 (found 3 instead)"
    );
    assert_eq!(output, [1.0]);

    let err = interpreter.invoke(&[0.0, 1.0], &mut []).unwrap_err();
    assert_eq!(
        err,
        InvokeError::OutputSize {
            expected: 1,
            found: 0
        }
    );
}

#[test]
fn test_matrix_classification_with_softmax() {
    let mut interpreter = column_classifier();
    assert_eq!(interpreter.input_size_2d(), Some((8, 4)));
    assert_eq!(interpreter.input_size(), 32);

    let mut features = [[0.0f32; 4]; 8];
    for row in features.iter_mut() {
        row[2] = 1.0;
    }
    let mut scores = [0.0f32; 4];
    let class = interpreter.classify_matrix(&features, &mut scores).unwrap();
    assert_eq!(class, 2);

    softmax(&mut scores);
    let total: f32 = scores.iter().sum();
    assert_relative_eq!(total, 1.0, epsilon = PROBABILITY_EPSILON);
    assert_eq!(argmax(&scores), Some(2));
}

#[test]
fn test_flat_matrix_validation_order() {
    let mut interpreter = column_classifier();
    let mut scores = [5.0f32; 4];

    // Wrong length is reported even when rows/cols also disagree.
    let err = interpreter
        .classify_flat_2d(&[0.0; 31], 4, 8, &mut scores)
        .unwrap_err();
    assert!(matches!(err, InvokeError::FlatLength { .. }));

    let err = interpreter
        .classify_flat_2d(&[0.0; 32], 4, 8, &mut scores)
        .unwrap_err();
    assert!(matches!(err, InvokeError::MatrixShape { .. }));
    assert_eq!(scores, [5.0; 4]);
}

#[test]
fn test_builder_errors_carry_kind() {
    let err = Interpreter::builder()
        .source(ModelSource::path("saturation_model.tflite"))
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), neurosat::ErrorKind::Configuration);

    let options = InterpreterOptions {
        num_threads: 0,
        ..Default::default()
    };
    let err = Interpreter::builder()
        .source(ModelSource::path("saturation_model.tflite"))
        .options(options)
        .backend(saturation_factory())
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), neurosat::ErrorKind::Configuration);
}

#[test]
fn test_interpreter_moves_to_audio_thread() {
    let mut interpreter = saturation_interpreter();
    let handle = std::thread::spawn(move || {
        let mut output = [0.0f32];
        interpreter.invoke(&[0.5, TEST_GAIN], &mut output).unwrap();
        output[0]
    });
    let value = handle.join().unwrap();
    assert_relative_eq!(value, saturate(0.5, TEST_GAIN), epsilon = FLOAT_EPSILON);
}
