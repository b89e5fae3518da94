//! Joint state and fixed-point scaling.
//!
//! Converts between engineering units and the firmware's raw step counts and
//! keeps the 64-bit accumulator that extends the device's wrapping 32-bit
//! counter.

use rio_common::config::{ConfigError, ControlMode, FeedbackKind, JointConfig};
use rio_common::consts::{FULL_RANGE_MASK, MIN_SCALE_MAGNITUDE};
use rio_common::pins::JointPins;

/// Replace an unusable scale (near zero or NaN) with 1.0.
#[inline]
pub fn sanitize_scale(scale: f64) -> f64 {
    if scale.abs() >= MIN_SCALE_MAGNITUDE {
        scale
    } else {
        1.0
    }
}

/// Position of an incremental joint, centred on the current count.
#[inline]
pub fn incremental_position(accumulated: i64, scale: f64) -> f64 {
    (accumulated as f64 + 0.5) / scale
}

#[inline]
pub fn absolute_position(raw: i32, scale: f64) -> f64 {
    f64::from(raw) / scale
}

/// Per-joint runtime state, created once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointState {
    mode: ControlMode,
    feedback_kind: FeedbackKind,
    feedback_scale: i32,
    /// Scale seen on the previous cycle, after sanitizing.
    old_scale: Option<f64>,
    scale_reciprocal: f64,
    /// Frequency sent to the device [Hz].
    commanded_freq: f64,
    accumulator: i64,
    old_count: i32,
    prev_command: f64,
    command_derivative: f64,
}

impl JointState {
    pub fn new(mode: ControlMode, feedback_kind: FeedbackKind, feedback_scale: i32) -> Self {
        Self {
            mode,
            feedback_kind,
            feedback_scale: feedback_scale.max(1),
            old_scale: None,
            scale_reciprocal: 1.0 / FULL_RANGE_MASK,
            commanded_freq: 0.0,
            accumulator: 0,
            old_count: 0,
            prev_command: 0.0,
            command_derivative: 0.0,
        }
    }

    /// Build joint `index` from its configuration, resolving the control type.
    pub fn from_config(index: usize, config: &JointConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.mode(index)?,
            config.feedback,
            config.feedback_scale,
        ))
    }

    /// Pick up a changed scale parameter.
    ///
    /// A near-zero scale is replaced by 1.0 and written back. Returns `true`
    /// if the scale changed since the last call.
    pub fn refresh_scale(&mut self, scale: &mut f64) -> bool {
        if self.old_scale == Some(*scale) {
            return false;
        }
        *scale = sanitize_scale(*scale);
        self.old_scale = Some(*scale);
        self.scale_reciprocal = (1.0 / FULL_RANGE_MASK) / *scale;
        true
    }

    /// Fold a new raw counter reading into the accumulator.
    ///
    /// The delta is taken modulo 2^32, so the accumulator stays exact across
    /// counter wraparound as long as the counter moves less than 2^31 counts
    /// between readings.
    #[inline]
    pub fn accumulate(&mut self, raw: i32) -> i64 {
        let delta = raw.wrapping_sub(self.old_count);
        self.old_count = raw;
        self.accumulator += i64::from(delta);
        self.accumulator
    }

    /// Turn a raw feedback word into the `counts` and `pos_fb` pins.
    ///
    /// `raw` is the word as the device reports it, before the feedback scale
    /// divisor. Incremental joints accumulate the undivided word and divide
    /// the 64-bit total, so the divisor never sees the 32-bit wrap.
    pub fn apply_feedback(&mut self, raw: i32, pins: &mut JointPins) {
        let scale = sanitize_scale(pins.scale);
        match self.feedback_kind {
            FeedbackKind::Absolute => {
                let counts = raw.wrapping_div(self.feedback_scale);
                pins.counts = i64::from(counts);
                pins.pos_fb = absolute_position(counts, scale);
            }
            FeedbackKind::Incremental => {
                let counts = self
                    .accumulate(raw)
                    .div_euclid(i64::from(self.feedback_scale));
                pins.counts = counts;
                pins.pos_fb = incremental_position(counts, scale);
            }
        }
    }

    /// Record a position command and return its derivative.
    #[inline]
    pub fn track_command(&mut self, command: f64, recip_dt: f64) -> f64 {
        self.command_derivative = (command - self.prev_command) * recip_dt;
        self.prev_command = command;
        self.command_derivative
    }

    #[inline]
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    #[inline]
    pub fn feedback_kind(&self) -> FeedbackKind {
        self.feedback_kind
    }

    #[inline]
    pub fn feedback_scale(&self) -> i32 {
        self.feedback_scale
    }

    #[inline]
    pub fn commanded_freq(&self) -> f64 {
        self.commanded_freq
    }

    #[inline]
    pub(crate) fn set_commanded_freq(&mut self, freq: f64) {
        self.commanded_freq = freq;
    }

    #[inline]
    pub fn accumulator(&self) -> i64 {
        self.accumulator
    }

    /// Engineering units per fixed-point step, `(1 / 2^22) / scale`.
    #[inline]
    pub fn scale_reciprocal(&self) -> f64 {
        self.scale_reciprocal
    }

    #[inline]
    pub fn command_derivative(&self) -> f64 {
        self.command_derivative
    }
}
