//! Bridge context.
//!
//! Owns every piece of per-cycle state: joints, codec, transfer machine,
//! period cache and both frame buffers. The host calls [`Bridge::update`]
//! and [`Bridge::exchange`] once per cycle, in that order.

use crate::control::limits::JointLimits;
use crate::control::{PeriodCache, update_joint};
use crate::fault::Diagnostics;
use crate::frame::FrameCodec;
use crate::joint::JointState;
use crate::transfer::{TransferMachine, TransferState};
use heapless::Vec;
use rio_common::config::{BridgeConfig, ConfigError};
use rio_common::consts::{MAX_FRAME_BYTES, MAX_JOINTS};
use rio_common::hal::transport::Transport;
use rio_common::pins::BridgePins;
use tracing::info;

pub struct Bridge {
    joints: Vec<JointState, MAX_JOINTS>,
    /// Limits computed on the last update pass.
    limits: Vec<JointLimits, MAX_JOINTS>,
    codec: FrameCodec,
    transfer: TransferMachine,
    period: PeriodCache,
    base_freq_hz: f64,
    tx: [u8; MAX_FRAME_BYTES],
    rx: [u8; MAX_FRAME_BYTES],
}

impl Bridge {
    /// Validate `config` and build all runtime state.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidControlType` for a bad control token, or
    /// `ConfigError::ValidationError` for counts out of range.
    pub fn new(config: &BridgeConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut joints = Vec::new();
        for (i, joint_config) in config.joints.iter().enumerate() {
            joints
                .push(JointState::from_config(i, joint_config)?)
                .map_err(|_| {
                    ConfigError::ValidationError(format!("more than {MAX_JOINTS} joints"))
                })?;
        }

        let codec = FrameCodec::from_config(config);
        info!(
            "Bridge: {} joints, {} setpoints, {} pv, {} do, {} di, {} byte frames",
            joints.len(),
            codec.layout().setpoints(),
            codec.layout().process_variables(),
            codec.layout().outputs(),
            codec.layout().inputs(),
            codec.frame_len()
        );

        Ok(Self {
            joints,
            limits: Vec::new(),
            codec,
            transfer: TransferMachine::new(),
            period: PeriodCache::new(),
            base_freq_hz: f64::from(config.bus.base_freq_hz),
            tx: [0; MAX_FRAME_BYTES],
            rx: [0; MAX_FRAME_BYTES],
        })
    }

    /// Control pass: compute every joint's commanded frequency.
    ///
    /// Returns `false` and changes nothing when `period_ns` is not positive.
    pub fn update(&mut self, pins: &mut BridgePins, period_ns: i64) -> bool {
        if !self.period.refresh(period_ns) {
            return false;
        }
        self.limits.clear();
        for (joint, joint_pins) in self.joints.iter_mut().zip(pins.joints.iter_mut()) {
            let limits = update_joint(joint, joint_pins, self.base_freq_hz, &self.period);
            let _ = self.limits.push(limits);
        }
        true
    }

    /// Exchange pass: send the frame and process the reply.
    pub fn exchange<T: Transport + ?Sized>(
        &mut self,
        pins: &mut BridgePins,
        transport: &mut T,
    ) -> TransferState {
        self.transfer.step(
            pins,
            transport,
            &self.codec,
            &mut self.joints,
            &mut self.tx,
            &mut self.rx,
        )
    }

    /// `update` followed by `exchange`.
    pub fn cycle<T: Transport + ?Sized>(
        &mut self,
        pins: &mut BridgePins,
        transport: &mut T,
        period_ns: i64,
    ) -> TransferState {
        self.update(pins, period_ns);
        self.exchange(pins, transport)
    }

    pub fn joints(&self) -> &[JointState] {
        &self.joints
    }

    pub fn limits(&self) -> &[JointLimits] {
        &self.limits
    }

    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    pub fn state(&self) -> TransferState {
        self.transfer.state()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.transfer.diagnostics()
    }

    pub fn period(&self) -> &PeriodCache {
        &self.period
    }

    /// Outbound frame of the last transfer.
    pub fn last_tx(&self) -> &[u8] {
        &self.tx[..self.codec.frame_len()]
    }

    /// Inbound frame of the last transfer.
    pub fn last_rx(&self) -> &[u8] {
        &self.rx[..self.codec.frame_len()]
    }
}
