//! Axis control law.
//!
//! Per joint and cycle: tighten the limits, compute a velocity from the
//! position or velocity command, scale it to a step frequency, then clamp
//! it to the frequency limit and the per-cycle acceleration step.

pub mod limits;
pub mod position;

use crate::joint::JointState;
use limits::{JointLimits, compute_limits};
use position::{PositionGains, position_velocity};
use rio_common::config::ControlMode;
use rio_common::pins::JointPins;

/// Cycle period in seconds and its reciprocal, recomputed only when the
/// period changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodCache {
    period_ns: i64,
    dt: f64,
    recip_dt: f64,
}

impl Default for PeriodCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodCache {
    pub const fn new() -> Self {
        Self {
            period_ns: 0,
            dt: 0.0,
            recip_dt: 0.0,
        }
    }

    /// Accept a new period. Returns `false` for a non-positive period, in
    /// which case the cached values are left untouched and the update pass
    /// must be skipped.
    pub fn refresh(&mut self, period_ns: i64) -> bool {
        if period_ns <= 0 {
            return false;
        }
        if period_ns != self.period_ns {
            self.period_ns = period_ns;
            self.dt = period_ns as f64 * 1e-9;
            self.recip_dt = 1.0 / self.dt;
        }
        true
    }

    #[inline]
    pub fn period_ns(&self) -> i64 {
        self.period_ns
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    #[inline]
    pub fn recip_dt(&self) -> f64 {
        self.recip_dt
    }
}

/// Clamp `value` to `±limit`.
#[inline]
pub fn clamp_symmetric(value: f64, limit: f64) -> f64 {
    if value > limit {
        limit
    } else if value < -limit {
        -limit
    } else {
        value
    }
}

/// Move from `current` toward `target` by at most `step`.
#[inline]
pub fn rate_limit(target: f64, current: f64, step: f64) -> f64 {
    if target > current + step {
        current + step
    } else if target < current - step {
        current - step
    } else {
        target
    }
}

/// Run the control law for one joint and store the resulting frequency in
/// both the joint state and the `freq_cmd` pin.
///
/// `pins.scale`, `pins.max_velocity` and `pins.max_accel` may be rewritten
/// (sanitized scale, tightened limits).
///
/// The target is clamped before the rate limit, so after `max_velocity` is
/// lowered on a moving joint the frequency ramps down at `max_accel` and may
/// exceed the new `max_freq` for a few cycles.
pub fn update_joint(
    joint: &mut JointState,
    pins: &mut JointPins,
    base_freq_hz: f64,
    period: &PeriodCache,
) -> JointLimits {
    joint.refresh_scale(&mut pins.scale);
    let scale = pins.scale;

    let limits = compute_limits(
        base_freq_hz,
        scale,
        &mut pins.max_velocity,
        &mut pins.max_accel,
        period.recip_dt(),
    );

    let velocity = match joint.mode() {
        ControlMode::Position => {
            let gains = PositionGains::from_pins(pins);
            let command_derivative = joint.track_command(pins.pos_cmd, period.recip_dt());
            position_velocity(&gains, pins.pos_cmd, pins.pos_fb, command_derivative)
        }
        ControlMode::Velocity => pins.vel_cmd,
    };

    let mut freq = velocity * scale;
    if freq.is_nan() {
        freq = 0.0;
    }
    freq = clamp_symmetric(freq, limits.max_freq);
    freq = rate_limit(freq, joint.commanded_freq(), limits.max_accel * period.dt());

    if !pins.enable || limits.frozen {
        freq = 0.0;
    }

    joint.set_commanded_freq(freq);
    pins.freq_cmd = freq;
    limits
}
