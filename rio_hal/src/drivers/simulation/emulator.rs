//! FPGA firmware emulator.
//!
//! Behaves like the firmware on the far side of the bus:
//! - a WRITE frame latches frequency words, joint enables, setpoints and
//!   digital outputs; a READ frame latches nothing
//! - every strobed transfer advances the step generators by one period
//! - the reply carries step counters, setpoint words echoed as process
//!   variables and digital outputs looped back to the inputs
//!
//! E-stop, forced headers and bus faults can be injected for testing.

use super::stepgen::StepGenerator;
use heapless::Vec;
use rio_common::bits::{DigitalBits, JointEnableBits};
use rio_common::config::BridgeConfig;
use rio_common::consts::{
    HEADER_DATA, HEADER_ESTOP, HEADER_READ, HEADER_WRITE, MAX_JOINTS, MAX_SETPOINTS,
};
use rio_common::frame::{FrameLayout, get_i32, get_u32, put_i32, put_u32};
use rio_common::hal::transport::{HalError, Transport, check_frame_lengths};
use tracing::{debug, trace};

/// Transfer counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmulatorStats {
    pub transfers: u64,
    pub write_frames: u64,
    pub read_frames: u64,
    /// Frames with neither WRITE nor READ header.
    pub unknown_frames: u64,
    /// Transfers clocked without the strobe asserted.
    pub unstrobed: u64,
    pub injected_faults: u64,
}

/// Software stand-in for the step/IO firmware.
pub struct FirmwareEmulator {
    layout: FrameLayout,
    oscillator_hz: f64,
    period_s: f64,
    feedback_scales: Vec<i32, MAX_JOINTS>,
    generators: Vec<StepGenerator, MAX_JOINTS>,
    setpoint_words: [i32; MAX_SETPOINTS],
    outputs: DigitalBits,
    strobe: bool,
    device_reset: bool,
    estop: bool,
    forced_header: Option<u32>,
    pending_faults: u32,
    stats: EmulatorStats,
}

impl FirmwareEmulator {
    /// `feedback_scales` multiplies each counter before it is reported;
    /// missing entries default to 1.
    pub fn new(
        layout: FrameLayout,
        oscillator_hz: u32,
        period_s: f64,
        feedback_scales: &[i32],
    ) -> Self {
        let mut scales = Vec::new();
        let mut generators = Vec::new();
        for j in 0..layout.joints() {
            let _ = scales.push(feedback_scales.get(j).copied().unwrap_or(1).max(1));
            let _ = generators.push(StepGenerator::default());
        }
        Self {
            layout,
            oscillator_hz: f64::from(oscillator_hz),
            period_s,
            feedback_scales: scales,
            generators,
            setpoint_words: [0; MAX_SETPOINTS],
            outputs: DigitalBits::new(),
            strobe: false,
            device_reset: false,
            estop: false,
            forced_header: None,
            pending_faults: 0,
            stats: EmulatorStats::default(),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        let scales: std::vec::Vec<i32> = config.joints.iter().map(|j| j.feedback_scale).collect();
        Self::new(
            FrameLayout::from_config(config),
            config.bus.oscillator_hz,
            f64::from(config.bus.cycle_time_us) * 1e-6,
            &scales,
        )
    }

    // ─── Fault injection ────────────────────────────────────────────

    /// Answer with ESTOP until cleared.
    pub fn set_estop(&mut self, active: bool) {
        self.estop = active;
    }

    /// Answer with `header` regardless of state, or `None` to stop forcing.
    pub fn force_header(&mut self, header: Option<u32>) {
        self.forced_header = header;
    }

    /// Fail the next `count` transfers with a communication error.
    pub fn inject_faults(&mut self, count: u32) {
        self.pending_faults = count;
    }

    /// Set joint `joint`'s step counter without stepping.
    pub fn preload_steps(&mut self, joint: usize, steps: f64) {
        if let Some(generator) = self.generators.get_mut(joint) {
            generator.preload(steps);
        }
    }

    // ─── Inspection ─────────────────────────────────────────────────

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn stats(&self) -> EmulatorStats {
        self.stats
    }

    pub fn generator(&self, joint: usize) -> Option<&StepGenerator> {
        self.generators.get(joint)
    }

    pub fn setpoint_word(&self, index: usize) -> i32 {
        self.setpoint_words.get(index).copied().unwrap_or(0)
    }

    pub fn outputs(&self) -> &DigitalBits {
        &self.outputs
    }

    pub fn device_reset(&self) -> bool {
        self.device_reset
    }

    // ─── Firmware behaviour ─────────────────────────────────────────

    fn latch_write(&mut self, tx: &[u8]) {
        let layout = self.layout;
        let enable_off = layout.tx_enable_offset();
        let enables =
            JointEnableBits::from_bytes(&tx[enable_off..enable_off + layout.enable_bytes()]);
        for (j, generator) in self.generators.iter_mut().enumerate() {
            let word = get_i32(tx, layout.tx_freq_offset(j));
            generator.latch(word, enables.get(j), self.oscillator_hz);
        }
        for i in 0..layout.setpoints() {
            self.setpoint_words[i] = get_i32(tx, layout.tx_setpoint_offset(i));
        }
        let out_off = layout.tx_output_offset();
        self.outputs = DigitalBits::from_bytes(&tx[out_off..out_off + layout.output_bytes()]);
    }

    fn respond(&self, rx: &mut [u8]) {
        let layout = self.layout;
        rx.fill(0);

        let header = self.forced_header.unwrap_or(if self.estop {
            HEADER_ESTOP
        } else {
            HEADER_DATA
        });
        put_u32(rx, 0, header);

        for (j, generator) in self.generators.iter().enumerate() {
            let raw = generator.count().wrapping_mul(self.feedback_scales[j]);
            put_i32(rx, layout.rx_feedback_offset(j), raw);
        }
        for i in 0..layout.process_variables() {
            put_i32(rx, layout.rx_pv_offset(i), self.setpoint_word(i));
        }

        let mut inputs = DigitalBits::new();
        for i in 0..layout.inputs() {
            inputs.set(i, self.outputs.get(i));
        }
        let in_off = layout.rx_input_offset();
        let n = layout.input_bytes();
        rx[in_off..in_off + n].copy_from_slice(&inputs.as_bytes()[..n]);
    }
}

impl Transport for FirmwareEmulator {
    fn name(&self) -> &'static str {
        "emulator"
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), HalError> {
        check_frame_lengths(tx, rx)?;
        let expected = self.layout.exchange_len();
        if tx.len() < expected {
            return Err(HalError::FrameLength {
                expected,
                actual: tx.len(),
            });
        }
        if self.pending_faults > 0 {
            self.pending_faults -= 1;
            self.stats.injected_faults += 1;
            return Err(HalError::Communication("injected bus fault".to_string()));
        }

        self.stats.transfers += 1;
        if !self.strobe {
            // Firmware ignores the bus while the strobe is released.
            self.stats.unstrobed += 1;
            rx.fill(0);
            return Ok(());
        }

        match get_u32(tx, 0) {
            HEADER_WRITE => {
                self.stats.write_frames += 1;
                self.latch_write(tx);
            }
            HEADER_READ => self.stats.read_frames += 1,
            other => {
                self.stats.unknown_frames += 1;
                trace!("emulator ignoring frame header {other:#010x}");
            }
        }

        if self.device_reset {
            for generator in self.generators.iter_mut() {
                generator.reset();
            }
        }
        for generator in self.generators.iter_mut() {
            generator.advance(self.period_s);
        }

        self.respond(rx);
        Ok(())
    }

    fn set_strobe(&mut self, asserted: bool) -> Result<(), HalError> {
        self.strobe = asserted;
        Ok(())
    }

    fn set_device_reset(&mut self, asserted: bool) -> Result<(), HalError> {
        if asserted != self.device_reset {
            debug!("emulator device reset {}", if asserted { "asserted" } else { "released" });
        }
        self.device_reset = asserted;
        Ok(())
    }
}
