//! Configuration loading from disk.

use rio_common::config::{BridgeConfig, ConfigError, ControlMode, FeedbackKind, SetpointEncoding};
use rio_common::frame::FrameLayout;
use rio_common::pins::BridgePins;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const BOARD_TOML: &str = r#"
[bus]
oscillator_hz = 48000000
base_freq_hz = 48000000
cycle_time_us = 1000

[[joints]]
control = "p"
scale = 800.0
max_velocity = 50.0
max_accel = 500.0

[[joints]]
control = "p"
scale = 800.0

[[joints]]
control = "velocity"
feedback = "absolute"
feedback_scale = 4

[[setpoints]]
kind = "pwm"
frequency_hz = 10000.0

[[setpoints]]
kind = "rc_servo"

[io]
process_variables = 2
digital_outputs = 8
digital_inputs = 12
"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn load_board_config() {
    let file = write_temp(BOARD_TOML);
    let config = BridgeConfig::load(file.path()).unwrap();

    assert_eq!(config.joints.len(), 3);
    assert_eq!(config.joints[0].max_velocity, Some(50.0));
    assert_eq!(config.joints[2].mode(2).unwrap(), ControlMode::Velocity);
    assert_eq!(config.joints[2].feedback, FeedbackKind::Absolute);
    assert_eq!(config.joints[2].feedback_scale, 4);
    assert_eq!(config.setpoints[1], SetpointEncoding::RcServo);
    assert_eq!(config.io.digital_inputs, 12);
}

#[test]
fn loaded_config_sizes_layout_and_pins() {
    let file = write_temp(BOARD_TOML);
    let config = BridgeConfig::load(file.path()).unwrap();

    let layout = FrameLayout::from_config(&config);
    // header + 3 freq + 1 enable byte + 2 setpoints + 1 output byte
    assert_eq!(layout.tx_len(), 4 + 12 + 1 + 8 + 1);
    // header + 3 feedback + 2 pv + 2 input bytes
    assert_eq!(layout.rx_len(), 4 + 12 + 8 + 2);
    assert_eq!(layout.exchange_len(), 26);

    let pins = BridgePins::from_config(&config);
    assert_eq!(pins.joints.len(), 3);
    assert_eq!(pins.inputs_not.len(), 12);
}

#[test]
fn missing_file() {
    let err = BridgeConfig::load(Path::new("/nonexistent/rio/bridge.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn malformed_toml() {
    let file = write_temp("[[joints]\nscale = ");
    let err = BridgeConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn too_many_joints() {
    let file = write_temp(&"[[joints]]\n".repeat(17));
    let err = BridgeConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn zero_feedback_scale_rejected() {
    let file = write_temp("[[joints]]\nfeedback_scale = 0\n");
    let err = BridgeConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn bad_control_type_names_joint() {
    let file = write_temp("[[joints]]\n[[joints]]\n[[joints]]\ncontrol = \"torque\"\n");
    let err = BridgeConfig::load(file.path()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad control type 'torque' for joint 2 (must be 'p' or 'v')"
    );
}
