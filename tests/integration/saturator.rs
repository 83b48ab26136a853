//! Saturator integration tests
//!
//! End-to-end block processing: config → resource lookup → interpreter → audio.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use approx::assert_relative_eq;
use neurosat::plugin::{ModelLocation, Saturator, SaturatorConfig};
use neurosat::prelude::*;

fn bundled_resources() -> ResourceTable {
    let mut resources = ResourceTable::new();
    resources.insert_static("saturation_model.tflite", b"placeholder model bytes");
    resources
}

fn saturator(config: &SaturatorConfig) -> Saturator {
    Saturator::from_config(config, &bundled_resources(), saturation_factory())
        .expect("Failed to build saturator")
}

#[test]
fn test_stereo_block_follows_gain() {
    let config = SaturatorConfig::from_toml_str("min_gain = 0.0\nmax_gain = 100.0").unwrap();
    let mut saturator = saturator(&config);
    saturator.gain().set(0.5);

    let input = generate_sine(220.0, 48000.0, TEST_BLOCK_SIZE);
    let mut left = input.clone();
    let mut right = input.clone();
    let mut channels: [&mut [f32]; 2] = [&mut left, &mut right];
    saturator.process_block(&mut channels, 2).unwrap();

    for ((&dry, &l), &r) in input.iter().zip(&left).zip(&right) {
        let expected = saturate(dry, TEST_GAIN);
        assert_relative_eq!(l, expected, epsilon = FLOAT_EPSILON);
        assert_relative_eq!(r, expected, epsilon = FLOAT_EPSILON);
    }
    assert!(peak(&left) <= 1.0);
}

#[test]
fn test_gain_change_applies_from_next_block() {
    let config = SaturatorConfig::from_toml_str("min_gain = 0.0\nmax_gain = 100.0").unwrap();
    let mut saturator = saturator(&config);

    let mut block = [0.5f32; 4];
    let mut channels: [&mut [f32]; 1] = [&mut block];
    saturator.process_block(&mut channels, 1).unwrap();
    assert_eq!(block, [0.0; 4]);

    saturator.gain().set(1.0);
    let mut block = [0.5f32; 4];
    let mut channels: [&mut [f32]; 1] = [&mut block];
    saturator.process_block(&mut channels, 1).unwrap();
    assert_relative_eq!(block[0], saturate(0.5, 100.0), epsilon = FLOAT_EPSILON);
}

#[test]
fn test_default_gain_from_config() {
    let config = SaturatorConfig {
        default_gain: 0.5,
        ..Default::default()
    };
    let saturator = saturator(&config);
    assert_eq!(saturator.gain().get(), 0.5);
}

#[test]
fn test_model_file_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("saturation_model.onnx");
    std::fs::write(&model, b"not read by the closure factory").unwrap();
    std::fs::write(dir.path().join("saturation_model.toml"), "max_gain = 10.0\n").unwrap();

    let config = SaturatorConfig::sidecar(&model).unwrap().unwrap();
    assert_eq!(config.source, ModelLocation::File);

    let saturator = Saturator::from_config(&config, &ResourceTable::new(), saturation_factory());
    assert!(saturator.is_ok());
}

#[test]
fn test_bus_layouts() {
    assert!(Saturator::is_layout_supported(2, 2));
    assert!(!Saturator::is_layout_supported(2, 1));
}
