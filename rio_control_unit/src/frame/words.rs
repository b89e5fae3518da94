//! Joint frequency words.
//!
//! The firmware steps a joint at `oscillator / word` Hz, the sign of the word
//! giving the direction. Word 0 means no pulses.

/// Reserved word: step generator idle.
pub const NO_PULSES: i32 = 0;

/// Frequency in Hz → period word in oscillator ticks.
///
/// Zero, non-finite and frequencies too low for a 32-bit period all map to
/// [`NO_PULSES`]. Frequencies above the oscillator map to the shortest
/// period, ±1.
#[inline]
pub fn encode_frequency(oscillator_hz: f64, freq: f64) -> i32 {
    if freq == 0.0 || !freq.is_finite() {
        return NO_PULSES;
    }
    let period = oscillator_hz / freq;
    if !period.is_finite() || period.abs() > i32::MAX as f64 {
        return NO_PULSES;
    }
    match period.round() as i32 {
        0 if freq > 0.0 => 1,
        0 => -1,
        word => word,
    }
}

/// Period word → frequency in Hz. [`NO_PULSES`] decodes to 0.
#[inline]
pub fn decode_frequency(oscillator_hz: f64, word: i32) -> f64 {
    if word == NO_PULSES {
        0.0
    } else {
        oscillator_hz / f64::from(word)
    }
}
