//! Outbound and inbound frame packing.

use super::setpoint::EncodeSetpoint;
use super::words::encode_frequency;
use crate::joint::JointState;
use heapless::Vec;
use rio_common::bits::{DigitalBits, JointEnableBits};
use rio_common::config::{BridgeConfig, SetpointEncoding};
use rio_common::consts::{HEADER_READ, HEADER_WRITE, MAX_DIGITAL_BITS, MAX_JOINTS, MAX_SETPOINTS};
use rio_common::frame::{FrameLayout, get_i32, get_u32, put_i32, put_u32};
use rio_common::pins::BridgePins;
use static_assertions::const_assert;

// Bit banks must hold every pin the host can size.
const_assert!(JointEnableBits::CAPACITY >= MAX_JOINTS);
const_assert!(DigitalBits::CAPACITY >= MAX_DIGITAL_BITS);

/// Packs and unpacks frames for one fixed layout.
///
/// Every buffer passed in must hold at least [`FrameCodec::frame_len`]
/// bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCodec {
    layout: FrameLayout,
    oscillator_hz: f64,
    setpoints: Vec<SetpointEncoding, MAX_SETPOINTS>,
}

impl FrameCodec {
    /// Setpoint encodings beyond the layout's setpoint count are ignored.
    pub fn new(layout: FrameLayout, oscillator_hz: u32, setpoints: &[SetpointEncoding]) -> Self {
        let mut encodings = Vec::new();
        for encoding in setpoints.iter().take(layout.setpoints()) {
            let _ = encodings.push(*encoding);
        }
        Self {
            layout,
            oscillator_hz: f64::from(oscillator_hz),
            setpoints: encodings,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            FrameLayout::from_config(config),
            config.bus.oscillator_hz,
            &config.setpoints,
        )
    }

    #[inline]
    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Bytes exchanged per transfer.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.layout.exchange_len()
    }

    #[inline]
    pub fn oscillator_hz(&self) -> f64 {
        self.oscillator_hz
    }

    /// Synchronized command frame: frequencies, joint enables, setpoints
    /// and digital outputs.
    pub fn encode_write(&self, pins: &BridgePins, joints: &[JointState], tx: &mut [u8]) {
        let layout = &self.layout;
        tx[..layout.exchange_len()].fill(0);
        put_u32(tx, 0, HEADER_WRITE);

        let mut enables = JointEnableBits::new();
        for (j, joint) in joints.iter().enumerate().take(layout.joints()) {
            let word = encode_frequency(self.oscillator_hz, joint.commanded_freq());
            put_i32(tx, layout.tx_freq_offset(j), word);
            enables.set(j, pins.joints.get(j).is_some_and(|p| p.enable));
        }
        let offset = layout.tx_enable_offset();
        let n = layout.enable_bytes();
        tx[offset..offset + n].copy_from_slice(&enables.as_bytes()[..n]);

        for (i, encoding) in self.setpoints.iter().enumerate() {
            let value = pins.setpoints.get(i).copied().unwrap_or(0.0);
            put_i32(
                tx,
                layout.tx_setpoint_offset(i),
                encoding.encode(value, self.oscillator_hz),
            );
        }

        let mut outputs = DigitalBits::new();
        let count = layout.outputs().min(pins.outputs.len());
        outputs.pack(&pins.outputs[..count]);
        let offset = layout.tx_output_offset();
        let n = layout.output_bytes();
        tx[offset..offset + n].copy_from_slice(&outputs.as_bytes()[..n]);
    }

    /// Resynchronisation request: READ header, zero payload.
    pub fn encode_read(&self, tx: &mut [u8]) {
        tx[..self.layout.exchange_len()].fill(0);
        put_u32(tx, 0, HEADER_READ);
    }

    #[inline]
    pub fn header(&self, rx: &[u8]) -> u32 {
        get_u32(rx, 0)
    }

    /// Unpack a DATA frame into the feedback pins.
    pub fn decode_data(&self, rx: &[u8], pins: &mut BridgePins, joints: &mut [JointState]) {
        let layout = &self.layout;

        for (j, (joint, joint_pins)) in joints
            .iter_mut()
            .zip(pins.joints.iter_mut())
            .enumerate()
            .take(layout.joints())
        {
            joint.apply_feedback(get_i32(rx, layout.rx_feedback_offset(j)), joint_pins);
        }

        for (i, pv) in pins
            .process_variables
            .iter_mut()
            .enumerate()
            .take(layout.process_variables())
        {
            *pv = f64::from(get_i32(rx, layout.rx_pv_offset(i)));
        }

        let offset = layout.rx_input_offset();
        let bank = DigitalBits::from_bytes(&rx[offset..offset + layout.input_bytes()]);
        let count = layout.inputs().min(pins.inputs.len());
        for i in 0..count {
            let level = bank.get(i);
            pins.inputs[i] = level;
            if let Some(complement) = pins.inputs_not.get_mut(i) {
                *complement = !level;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rio_common::config::{ControlMode, FeedbackKind};
    use rio_common::consts::{HEADER_DATA, MAX_FRAME_BYTES};
    use rio_common::pins::JointPins;

    fn codec() -> FrameCodec {
        FrameCodec::new(
            FrameLayout::new(2, 1, 2, 3, 10),
            48_000_000,
            &[SetpointEncoding::Pwm {
                frequency_hz: 10_000.0,
            }],
        )
    }

    fn pins() -> BridgePins {
        let mut pins = BridgePins::default();
        for _ in 0..2 {
            pins.joints
                .push(JointPins {
                    scale: 10.0,
                    ..JointPins::default()
                })
                .unwrap();
        }
        pins.setpoints.push(25.0).unwrap();
        pins.process_variables.extend([0.0, 0.0]);
        pins.outputs.extend([true, false, true]);
        pins.inputs.extend([false; 10]);
        pins.inputs_not.extend([true; 10]);
        pins
    }

    fn joints() -> [JointState; 2] {
        [
            JointState::new(ControlMode::Position, FeedbackKind::Incremental, 1),
            JointState::new(ControlMode::Velocity, FeedbackKind::Absolute, 4),
        ]
    }

    #[test]
    fn write_frame_fields() {
        let codec = codec();
        let layout = *codec.layout();
        let mut pins = pins();
        pins.joints[1].enable = true;
        let mut joints = joints();
        joints[0].set_commanded_freq(1000.0);
        joints[1].set_commanded_freq(0.0);

        let mut tx = [0xAAu8; MAX_FRAME_BYTES];
        codec.encode_write(&pins, &joints, &mut tx);

        assert_eq!(get_u32(&tx, 0), HEADER_WRITE);
        assert_eq!(get_i32(&tx, layout.tx_freq_offset(0)), 48_000);
        assert_eq!(get_i32(&tx, layout.tx_freq_offset(1)), 0);
        assert_eq!(tx[layout.tx_enable_offset()], 0b10);
        assert_eq!(get_i32(&tx, layout.tx_setpoint_offset(0)), 1200);
        assert_eq!(tx[layout.tx_output_offset()], 0b101);
        // padding up to the exchange length is zeroed
        assert!(tx[layout.tx_len()..layout.exchange_len()].iter().all(|&b| b == 0));
    }

    #[test]
    fn read_frame_is_header_only() {
        let codec = codec();
        let mut tx = [0xFFu8; MAX_FRAME_BYTES];
        codec.encode_read(&mut tx);
        assert_eq!(get_u32(&tx, 0), HEADER_READ);
        assert!(tx[4..codec.frame_len()].iter().all(|&b| b == 0));
    }

    #[test]
    fn data_frame_decodes() {
        let codec = codec();
        let layout = *codec.layout();
        let mut pins = pins();
        let mut joints = joints();

        let mut rx = [0u8; MAX_FRAME_BYTES];
        put_u32(&mut rx, 0, HEADER_DATA);
        put_i32(&mut rx, layout.rx_feedback_offset(0), 1234);
        put_i32(&mut rx, layout.rx_feedback_offset(1), -400);
        put_i32(&mut rx, layout.rx_pv_offset(0), 7);
        put_i32(&mut rx, layout.rx_pv_offset(1), -7);
        rx[layout.rx_input_offset()] = 0b1000_0001;
        rx[layout.rx_input_offset() + 1] = 0b10;

        assert_eq!(codec.header(&rx), HEADER_DATA);
        codec.decode_data(&rx, &mut pins, &mut joints);

        assert_eq!(pins.joints[0].counts, 1234);
        assert!((pins.joints[0].pos_fb - 123.45).abs() < 1e-9);
        // absolute joint, feedback scale 4: -400 / 4 = -100 counts
        assert_eq!(pins.joints[1].counts, -100);
        assert!((pins.joints[1].pos_fb + 10.0).abs() < 1e-12);
        assert_eq!(pins.process_variables[0], 7.0);
        assert_eq!(pins.process_variables[1], -7.0);
        assert!(pins.inputs[0] && pins.inputs[7] && pins.inputs[9]);
        assert!(!pins.inputs[1] && !pins.inputs[8]);
        assert!(!pins.inputs_not[0] && pins.inputs_not[1]);
    }

    #[test]
    fn divided_incremental_feedback_crosses_counter_wrap() {
        let codec = codec();
        let layout = *codec.layout();
        let mut pins = pins();
        let mut joints = [
            JointState::new(ControlMode::Velocity, FeedbackKind::Incremental, 4),
            JointState::new(ControlMode::Velocity, FeedbackKind::Incremental, 1),
        ];

        let mut rx = [0u8; MAX_FRAME_BYTES];
        put_u32(&mut rx, 0, HEADER_DATA);
        put_i32(&mut rx, layout.rx_feedback_offset(0), i32::MAX - 3);
        codec.decode_data(&rx, &mut pins, &mut joints);
        let before = pins.joints[0].counts;

        put_i32(&mut rx, layout.rx_feedback_offset(0), (i32::MAX - 3).wrapping_add(8));
        codec.decode_data(&rx, &mut pins, &mut joints);
        assert_eq!(pins.joints[0].counts - before, 2);
        assert!(pins.joints[0].counts > 0);
    }
}
