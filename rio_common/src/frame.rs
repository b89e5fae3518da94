//! Wire frame layout.
//!
//! Both directions are packed little-endian and share one exchange length.
//!
//! ```text
//! outbound: header | freq[joints] i32 | enable bits | setpoint[n] i32 | output bits
//! inbound:  header | feedback[joints] i32 | pv[n] i32 | input bits
//! ```

use crate::bits::bytes_for_bits;
use crate::config::BridgeConfig;
use crate::consts::{
    HEADER_BYTES, MAX_DIGITAL_BITS, MAX_FRAME_BYTES, MAX_JOINTS, MAX_PROCESS_VARIABLES,
    MAX_SETPOINTS, WORD_BYTES,
};

/// Byte offsets of every field, fixed for the lifetime of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    joints: usize,
    setpoints: usize,
    process_variables: usize,
    outputs: usize,
    inputs: usize,
}

impl FrameLayout {
    /// Counts are clamped to their capacities.
    pub fn new(
        joints: usize,
        setpoints: usize,
        process_variables: usize,
        outputs: usize,
        inputs: usize,
    ) -> Self {
        let layout = Self {
            joints: joints.min(MAX_JOINTS),
            setpoints: setpoints.min(MAX_SETPOINTS),
            process_variables: process_variables.min(MAX_PROCESS_VARIABLES),
            outputs: outputs.min(MAX_DIGITAL_BITS),
            inputs: inputs.min(MAX_DIGITAL_BITS),
        };
        debug_assert!(layout.exchange_len() <= MAX_FRAME_BYTES);
        layout
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            config.joints.len(),
            config.setpoints.len(),
            config.io.process_variables,
            config.io.digital_outputs,
            config.io.digital_inputs,
        )
    }

    #[inline]
    pub fn joints(&self) -> usize {
        self.joints
    }

    #[inline]
    pub fn setpoints(&self) -> usize {
        self.setpoints
    }

    #[inline]
    pub fn process_variables(&self) -> usize {
        self.process_variables
    }

    #[inline]
    pub fn outputs(&self) -> usize {
        self.outputs
    }

    #[inline]
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn enable_bytes(&self) -> usize {
        bytes_for_bits(self.joints)
    }

    pub fn output_bytes(&self) -> usize {
        bytes_for_bits(self.outputs)
    }

    pub fn input_bytes(&self) -> usize {
        bytes_for_bits(self.inputs)
    }

    // ─── Outbound ───────────────────────────────────────────────────

    #[inline]
    pub fn tx_freq_offset(&self, joint: usize) -> usize {
        HEADER_BYTES + joint * WORD_BYTES
    }

    #[inline]
    pub fn tx_enable_offset(&self) -> usize {
        HEADER_BYTES + self.joints * WORD_BYTES
    }

    #[inline]
    pub fn tx_setpoint_offset(&self, index: usize) -> usize {
        self.tx_enable_offset() + self.enable_bytes() + index * WORD_BYTES
    }

    #[inline]
    pub fn tx_output_offset(&self) -> usize {
        self.tx_setpoint_offset(self.setpoints)
    }

    pub fn tx_len(&self) -> usize {
        self.tx_output_offset() + self.output_bytes()
    }

    // ─── Inbound ────────────────────────────────────────────────────

    #[inline]
    pub fn rx_feedback_offset(&self, joint: usize) -> usize {
        HEADER_BYTES + joint * WORD_BYTES
    }

    #[inline]
    pub fn rx_pv_offset(&self, index: usize) -> usize {
        HEADER_BYTES + (self.joints + index) * WORD_BYTES
    }

    #[inline]
    pub fn rx_input_offset(&self) -> usize {
        self.rx_pv_offset(self.process_variables)
    }

    pub fn rx_len(&self) -> usize {
        self.rx_input_offset() + self.input_bytes()
    }

    /// Bytes clocked in each direction per transfer.
    pub fn exchange_len(&self) -> usize {
        self.tx_len().max(self.rx_len())
    }
}

// ─── Word helpers ───────────────────────────────────────────────────

#[inline]
pub fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + WORD_BYTES].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn get_u32(buf: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; WORD_BYTES];
    word.copy_from_slice(&buf[offset..offset + WORD_BYTES]);
    u32::from_le_bytes(word)
}

#[inline]
pub fn put_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + WORD_BYTES].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn get_i32(buf: &[u8], offset: usize) -> i32 {
    let mut word = [0u8; WORD_BYTES];
    word.copy_from_slice(&buf[offset..offset + WORD_BYTES]);
    i32::from_le_bytes(word)
}
