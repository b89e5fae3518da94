//! Position mode: proportional control with velocity feed-forward.
//!
//! Zero pgain or ff1gain means 1.0; zero deadband means one count.

use rio_common::pins::JointPins;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionGains {
    pub pgain: f64,
    pub ff1gain: f64,
    /// Error band treated as zero [engineering units].
    pub deadband: f64,
}

impl PositionGains {
    /// Resolve the gain pins, substituting defaults for zero values.
    pub fn from_pins(pins: &JointPins) -> Self {
        Self {
            pgain: if pins.pgain != 0.0 { pins.pgain } else { 1.0 },
            ff1gain: if pins.ff1gain != 0.0 { pins.ff1gain } else { 1.0 },
            deadband: if pins.deadband != 0.0 {
                pins.deadband
            } else {
                1.0 / pins.scale.abs()
            },
        }
    }
}

/// Shrink `error` toward zero by `deadband`, zero inside the band.
#[inline]
pub fn apply_deadband(error: f64, deadband: f64) -> f64 {
    if error > deadband {
        error - deadband
    } else if error < -deadband {
        error + deadband
    } else {
        0.0
    }
}

/// Velocity command in engineering units per second.
#[inline]
pub fn position_velocity(
    gains: &PositionGains,
    command: f64,
    feedback: f64,
    command_derivative: f64,
) -> f64 {
    let error = apply_deadband(command - feedback, gains.deadband);
    gains.pgain * error + gains.ff1gain * command_derivative
}
