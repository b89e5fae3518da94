//! Auxiliary setpoint encodings.

use rio_common::config::SetpointEncoding;
use rio_common::consts::{LINEAR_FULL_SCALE, PWM_PERCENT, RC_SERVO_DIVISOR, RC_SERVO_OFFSET};

/// Encode a setpoint value into its 32-bit wire word.
///
/// Out-of-range values are clamped to the encoding's input range and NaN is
/// treated as 0. The result saturates at the `i32` bounds.
pub fn encode_setpoint(encoding: &SetpointEncoding, value: f64, oscillator_hz: f64) -> i32 {
    let value = if value.is_nan() { 0.0 } else { value };
    let word = match *encoding {
        SetpointEncoding::Linear { min, max } => {
            let span = max - min;
            if span > 0.0 {
                (value.clamp(min, max) - min) * LINEAR_FULL_SCALE / span
            } else {
                0.0
            }
        }
        SetpointEncoding::Sine { frequency_hz } => {
            if value == 0.0 || !(frequency_hz > 0.0) {
                0.0
            } else {
                oscillator_hz / value / frequency_hz
            }
        }
        SetpointEncoding::Pwm { frequency_hz } => {
            if frequency_hz > 0.0 {
                value.clamp(0.0, PWM_PERCENT) * (oscillator_hz / frequency_hz) / PWM_PERCENT
            } else {
                0.0
            }
        }
        SetpointEncoding::RcServo => {
            (value.clamp(-100.0, 100.0) + RC_SERVO_OFFSET) * (oscillator_hz / RC_SERVO_DIVISOR)
        }
    };
    word as i32
}

/// Method form of [`encode_setpoint`].
pub trait EncodeSetpoint {
    fn encode(&self, value: f64, oscillator_hz: f64) -> i32;
}

impl EncodeSetpoint for SetpointEncoding {
    #[inline]
    fn encode(&self, value: f64, oscillator_hz: f64) -> i32 {
        encode_setpoint(self, value, oscillator_hz)
    }
}
