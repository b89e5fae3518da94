//! Velocity and acceleration limits.
//!
//! The step rate can never exceed half the device base frequency, and the
//! frequency can never change by more than that rate within one cycle. User
//! limits above these ceilings are written back tightened.

/// Effective limits for one joint and cycle, in step units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimits {
    /// Highest step frequency [Hz].
    pub max_freq: f64,
    /// Highest frequency change rate [Hz/s].
    pub max_accel: f64,
    /// A limit was zero or negative: the joint must not move.
    pub frozen: bool,
}

/// Compute this cycle's limits and tighten the user parameters in place.
///
/// `max_velocity` and `max_accel` are in engineering units. A value that is
/// not positive (NaN included) is forced to exactly 0 and freezes the joint.
pub fn compute_limits(
    base_freq_hz: f64,
    scale: f64,
    max_velocity: &mut f64,
    max_accel: &mut f64,
    recip_dt: f64,
) -> JointLimits {
    let abs_scale = scale.abs();
    let mut frozen = false;

    let mut max_freq = base_freq_hz / 2.0;
    if *max_velocity > 0.0 {
        let desired = *max_velocity * abs_scale;
        if desired > max_freq {
            *max_velocity = max_freq / abs_scale;
        } else {
            max_freq = desired;
        }
    } else {
        *max_velocity = 0.0;
        frozen = true;
    }

    // reachable from standstill within one cycle
    let mut max_ac = max_freq * recip_dt;
    if *max_accel > 0.0 {
        if *max_accel * abs_scale > max_ac {
            *max_accel = max_ac / abs_scale;
        } else {
            max_ac = *max_accel * abs_scale;
        }
    } else {
        *max_accel = 0.0;
        frozen = true;
    }

    if frozen {
        return JointLimits {
            max_freq: 0.0,
            max_accel: 0.0,
            frozen,
        };
    }
    JointLimits {
        max_freq,
        max_accel: max_ac,
        frozen,
    }
}
