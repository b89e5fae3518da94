//! Step generator model.
//!
//! The firmware turns each joint's frequency word into a step rate of
//! `oscillator / word` and counts the steps it emits.

/// One emulated step generator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepGenerator {
    /// Emitted steps, fractional part included.
    position: f64,
    /// Step rate in Hz, signed by direction.
    frequency: f64,
    enabled: bool,
}

impl StepGenerator {
    /// Latch a frequency word. Word 0 stops the generator.
    pub fn latch(&mut self, word: i32, enabled: bool, oscillator_hz: f64) {
        self.frequency = if word == 0 {
            0.0
        } else {
            oscillator_hz / f64::from(word)
        };
        self.enabled = enabled;
    }

    /// Emit steps for `dt` seconds.
    #[inline]
    pub fn advance(&mut self, dt: f64) {
        if self.enabled {
            self.position += self.frequency * dt;
        }
    }

    /// Counter as the firmware reports it: whole steps, wrapping at 32 bits.
    #[inline]
    pub fn count(&self) -> i32 {
        self.position.floor() as i64 as i32
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Move the counter without stepping.
    pub fn preload(&mut self, steps: f64) {
        self.position = steps;
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}
