//! Bridge configuration and TOML loading.
//!
//! One TOML file describes the bus, the joints, the auxiliary setpoint
//! outputs and the IO counts. Everything here is read once at startup;
//! nothing in the control path touches it.
//!
//! # TOML Example
//!
//! ```toml
//! [bus]
//! oscillator_hz = 48000000
//! base_freq_hz = 48000000
//! cycle_time_us = 1000
//!
//! [[joints]]
//! control = "p"
//! feedback = "incremental"
//! scale = 800.0
//! max_velocity = 50.0
//! max_accel = 500.0
//!
//! [[setpoints]]
//! kind = "pwm"
//! frequency_hz = 10000.0
//!
//! [io]
//! process_variables = 2
//! digital_outputs = 8
//! digital_inputs = 8
//! ```

use crate::consts::{
    DEFAULT_BASE_FREQ_HZ, DEFAULT_CYCLE_TIME_US, DEFAULT_MAX_ACCEL, DEFAULT_OSCILLATOR_HZ,
    MAX_DIGITAL_BITS, MAX_JOINTS, MAX_PROCESS_VARIABLES, MAX_SETPOINTS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// The file exists but could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(String),

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// A joint's control-type token is neither position nor velocity.
    #[error("bad control type '{token}' for joint {joint} (must be 'p' or 'v')")]
    InvalidControlType { joint: usize, token: String },
}

/// Per-joint control law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    /// P + velocity feed-forward on the position command.
    #[default]
    Position,
    /// Velocity command passed through.
    Velocity,
}

/// Parse a control-type token.
///
/// Only the first character counts, case-insensitive. An empty token
/// selects position mode. Returns `None` for anything else.
pub fn parse_control_type(token: &str) -> Option<ControlMode> {
    match token.trim().chars().next() {
        None | Some('p' | 'P') => Some(ControlMode::Position),
        Some('v' | 'V') => Some(ControlMode::Velocity),
        Some(_) => None,
    }
}

/// How the device reports a joint's position counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// Wrapping 32-bit counter, accumulated on the host.
    #[default]
    Incremental,
    /// Absolute position in raw counts.
    Absolute,
}

/// Encoding of one auxiliary setpoint output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SetpointEncoding {
    /// `min..=max` mapped onto `0..=0x7FFF_FFFF`.
    Linear { min: f64, max: f64 },
    /// Oscillator-period word for a sine generator running at `frequency_hz`.
    Sine { frequency_hz: f64 },
    /// Duty cycle in percent of a PWM carrier at `frequency_hz`.
    Pwm { frequency_hz: f64 },
    /// Hobby servo pulse, setpoint -100..100.
    RcServo,
}

// ─── Sections ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Device oscillator in Hz; numerator of every frequency word.
    #[serde(default = "default_oscillator_hz")]
    pub oscillator_hz: u32,
    /// Device base frequency in Hz; the step rate limit is half of this.
    #[serde(default = "default_base_freq_hz")]
    pub base_freq_hz: u32,
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            oscillator_hz: DEFAULT_OSCILLATOR_HZ,
            base_freq_hz: DEFAULT_BASE_FREQ_HZ,
            cycle_time_us: DEFAULT_CYCLE_TIME_US,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JointConfig {
    /// Control-type token, see [`parse_control_type`].
    #[serde(default = "default_control")]
    pub control: String,
    #[serde(default)]
    pub feedback: FeedbackKind,
    /// Divisor applied to raw feedback before scaling.
    #[serde(default = "default_feedback_scale")]
    pub feedback_scale: i32,
    /// Initial steps per engineering unit.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Initial velocity limit; absent means limited only by the bus.
    #[serde(default)]
    pub max_velocity: Option<f64>,
    #[serde(default = "default_max_accel")]
    pub max_accel: f64,
    #[serde(default)]
    pub pgain: f64,
    #[serde(default)]
    pub ff1gain: f64,
    #[serde(default)]
    pub deadband: f64,
}

impl Default for JointConfig {
    fn default() -> Self {
        Self {
            control: default_control(),
            feedback: FeedbackKind::default(),
            feedback_scale: default_feedback_scale(),
            scale: default_scale(),
            max_velocity: None,
            max_accel: default_max_accel(),
            pgain: 0.0,
            ff1gain: 0.0,
            deadband: 0.0,
        }
    }
}

impl JointConfig {
    /// Resolve the control-type token of joint `index`.
    pub fn mode(&self, index: usize) -> Result<ControlMode, ConfigError> {
        parse_control_type(&self.control).ok_or_else(|| ConfigError::InvalidControlType {
            joint: index,
            token: self.control.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoConfig {
    #[serde(default)]
    pub process_variables: usize,
    #[serde(default)]
    pub digital_outputs: usize,
    #[serde(default)]
    pub digital_inputs: usize,
}

/// Complete bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    #[serde(default)]
    pub bus: BusConfig,
    pub joints: Vec<JointConfig>,
    #[serde(default)]
    pub setpoints: Vec<SetpointEncoding>,
    #[serde(default)]
    pub io: IoConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            joints: vec![JointConfig::default()],
            setpoints: Vec::new(),
            io: IoConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load and validate a TOML configuration file.
    ///
    /// # Errors
    ///
    /// - `FileNotFound` if the file does not exist
    /// - `Io` if it cannot be read
    /// - `ParseError` if the TOML is malformed or has unknown keys
    /// - `ValidationError` / `InvalidControlType` from [`Self::validate`]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::Io(format!("{}: {e}", path.display()))
            }
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check counts against capacities and every per-entry constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.joints.is_empty() || self.joints.len() > MAX_JOINTS {
            return Err(ConfigError::ValidationError(format!(
                "joint count {} out of range 1..={MAX_JOINTS}",
                self.joints.len()
            )));
        }
        if self.setpoints.len() > MAX_SETPOINTS {
            return Err(ConfigError::ValidationError(format!(
                "setpoint count {} exceeds {MAX_SETPOINTS}",
                self.setpoints.len()
            )));
        }
        if self.io.process_variables > MAX_PROCESS_VARIABLES {
            return Err(ConfigError::ValidationError(format!(
                "process variable count {} exceeds {MAX_PROCESS_VARIABLES}",
                self.io.process_variables
            )));
        }
        if self.io.digital_outputs > MAX_DIGITAL_BITS || self.io.digital_inputs > MAX_DIGITAL_BITS
        {
            return Err(ConfigError::ValidationError(format!(
                "digital IO count exceeds {MAX_DIGITAL_BITS}"
            )));
        }
        if self.bus.oscillator_hz == 0 || self.bus.base_freq_hz == 0 {
            return Err(ConfigError::ValidationError(
                "oscillator_hz and base_freq_hz must be positive".to_string(),
            ));
        }
        if self.bus.cycle_time_us == 0 {
            return Err(ConfigError::ValidationError(
                "cycle_time_us must be positive".to_string(),
            ));
        }

        for (i, joint) in self.joints.iter().enumerate() {
            joint.mode(i)?;
            if joint.feedback_scale < 1 {
                return Err(ConfigError::ValidationError(format!(
                    "joint {i}: feedback_scale must be >= 1, got {}",
                    joint.feedback_scale
                )));
            }
            if !joint.scale.is_finite() {
                return Err(ConfigError::ValidationError(format!(
                    "joint {i}: scale must be finite"
                )));
            }
        }

        for (i, sp) in self.setpoints.iter().enumerate() {
            match *sp {
                SetpointEncoding::Linear { min, max } => {
                    if !(min.is_finite() && max.is_finite() && max > min) {
                        return Err(ConfigError::ValidationError(format!(
                            "setpoint {i}: linear range needs finite max > min, got {min}..{max}"
                        )));
                    }
                }
                SetpointEncoding::Sine { frequency_hz } | SetpointEncoding::Pwm { frequency_hz } => {
                    if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
                        return Err(ConfigError::ValidationError(format!(
                            "setpoint {i}: frequency_hz must be positive, got {frequency_hz}"
                        )));
                    }
                }
                SetpointEncoding::RcServo => {}
            }
        }
        Ok(())
    }

    /// Replace the per-joint control tokens with `tokens`, in joint order.
    ///
    /// Tokens beyond the configured joint count are ignored with a warning.
    pub fn apply_control_overrides(&mut self, tokens: &[String]) -> Result<(), ConfigError> {
        if tokens.len() > self.joints.len() {
            warn!(
                "{} control types given for {} joints, ignoring the rest",
                tokens.len(),
                self.joints.len()
            );
        }
        for (i, (joint, token)) in self.joints.iter_mut().zip(tokens).enumerate() {
            joint.control = token.clone();
            joint.mode(i)?;
        }
        Ok(())
    }

    /// Cycle period in nanoseconds.
    pub fn cycle_time_ns(&self) -> i64 {
        i64::from(self.bus.cycle_time_us) * 1_000
    }
}

fn default_oscillator_hz() -> u32 {
    DEFAULT_OSCILLATOR_HZ
}

fn default_base_freq_hz() -> u32 {
    DEFAULT_BASE_FREQ_HZ
}

fn default_cycle_time_us() -> u32 {
    DEFAULT_CYCLE_TIME_US
}

fn default_control() -> String {
    "p".to_string()
}

fn default_feedback_scale() -> i32 {
    1
}

fn default_scale() -> f64 {
    1.0
}

fn default_max_accel() -> f64 {
    DEFAULT_MAX_ACCEL
}
