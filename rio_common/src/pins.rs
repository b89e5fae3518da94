//! Pin/parameter surface.
//!
//! The host reads and writes these values every cycle. Fields marked
//! *(out)* are written by the bridge; everything else is an input or a
//! tunable parameter the host may change between cycles.

use crate::config::{BridgeConfig, JointConfig};
use crate::consts::{MAX_DIGITAL_BITS, MAX_JOINTS, MAX_PROCESS_VARIABLES, MAX_SETPOINTS};
use heapless::Vec;
use std::iter::repeat_n;

/// Per-joint pins and parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPins {
    pub enable: bool,
    /// Position command in engineering units (position mode).
    pub pos_cmd: f64,
    /// Velocity command in engineering units per second (velocity mode).
    pub vel_cmd: f64,
    /// *(out)* Commanded step frequency in Hz.
    pub freq_cmd: f64,
    /// *(out)* Position feedback in engineering units.
    pub pos_fb: f64,
    /// *(out)* Raw position in device counts.
    pub counts: i64,
    /// Steps per engineering unit. Near-zero values are replaced by 1.0.
    pub scale: f64,
    pub pgain: f64,
    pub ff1gain: f64,
    pub deadband: f64,
    /// Velocity limit, tightened to what the bus can step.
    pub max_velocity: f64,
    /// Acceleration limit, tightened to what one cycle can achieve.
    pub max_accel: f64,
}

impl Default for JointPins {
    fn default() -> Self {
        Self {
            enable: false,
            pos_cmd: 0.0,
            vel_cmd: 0.0,
            freq_cmd: 0.0,
            pos_fb: 0.0,
            counts: 0,
            scale: 1.0,
            pgain: 0.0,
            ff1gain: 0.0,
            deadband: 0.0,
            max_velocity: f64::INFINITY,
            max_accel: crate::consts::DEFAULT_MAX_ACCEL,
        }
    }
}

impl JointPins {
    /// Initial parameter values for a configured joint.
    pub fn from_config(config: &JointConfig) -> Self {
        Self {
            scale: config.scale,
            pgain: config.pgain,
            ff1gain: config.ff1gain,
            deadband: config.deadband,
            max_velocity: config.max_velocity.unwrap_or(f64::INFINITY),
            max_accel: config.max_accel,
            ..Self::default()
        }
    }
}

/// Complete pin surface of one bridge instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgePins {
    /// Bus enable. While false no transfer happens and `status` drops.
    pub enable: bool,
    /// A rising edge requests resynchronisation with the device.
    pub reset_request: bool,
    /// Level forwarded to the device reset line.
    pub device_reset: bool,
    /// *(out)* True while the device answers with valid data frames.
    pub status: bool,
    pub joints: Vec<JointPins, MAX_JOINTS>,
    pub setpoints: Vec<f64, MAX_SETPOINTS>,
    /// *(out)*
    pub process_variables: Vec<f64, MAX_PROCESS_VARIABLES>,
    pub outputs: Vec<bool, MAX_DIGITAL_BITS>,
    /// *(out)*
    pub inputs: Vec<bool, MAX_DIGITAL_BITS>,
    /// *(out)* Complement of `inputs`.
    pub inputs_not: Vec<bool, MAX_DIGITAL_BITS>,
}

impl BridgePins {
    /// Size every collection to the configured counts.
    ///
    /// Counts beyond capacity are truncated; a validated configuration never
    /// exceeds them.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let mut pins = Self::default();
        for joint in config.joints.iter().take(MAX_JOINTS) {
            let _ = pins.joints.push(JointPins::from_config(joint));
        }
        pins.setpoints
            .extend(repeat_n(0.0, config.setpoints.len().min(MAX_SETPOINTS)));
        pins.process_variables.extend(repeat_n(
            0.0,
            config.io.process_variables.min(MAX_PROCESS_VARIABLES),
        ));
        pins.outputs
            .extend(repeat_n(false, config.io.digital_outputs.min(MAX_DIGITAL_BITS)));
        let inputs = config.io.digital_inputs.min(MAX_DIGITAL_BITS);
        pins.inputs.extend(repeat_n(false, inputs));
        pins.inputs_not.extend(repeat_n(true, inputs));
        pins
    }

    /// Enable every joint.
    pub fn enable_all_joints(&mut self) {
        for joint in self.joints.iter_mut() {
            joint.enable = true;
        }
    }
}
