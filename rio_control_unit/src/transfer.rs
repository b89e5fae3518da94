//! Transfer state machine.
//!
//! Decides each cycle whether a frame goes out, frames the exchange with
//! the strobe and turns the reply header into the status flag.
//!
//! ```text
//!            enable=0                      reply
//!   any ───────────────► Faulted(BusDisabled)
//!   any ── no edge, status=0 ──► Idle
//!   any ── reset edge | status ──► Transferring ──┬─ DATA  ──► DataValid
//!                                                 ├─ ESTOP ──► Faulted(EStop)
//!                                                 ├─ other ──► Faulted(Malformed)
//!                                                 └─ error ──► Faulted(Transport)
//! ```
//!
//! While `status` is false the outbound frame is a READ request; once the
//! firmware answers with DATA the bridge is synchronized and sends WRITE
//! frames every cycle.

use crate::fault::{Diagnostics, Fault, HeaderClass, classify};
use crate::frame::FrameCodec;
use crate::joint::JointState;
use rio_common::hal::transport::{HalError, Transport};
use rio_common::pins::BridgePins;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferState {
    /// No transfer this cycle.
    #[default]
    Idle,
    /// A frame is on the bus.
    Transferring,
    /// The last reply carried valid feedback.
    DataValid,
    Faulted(Fault),
}

/// Transfer gating and reply handling, one per bridge.
#[derive(Debug, Clone, Default)]
pub struct TransferMachine {
    state: TransferState,
    /// `reset_request` as seen on the previous pass.
    reset_old: bool,
    in_estop: bool,
    diagnostics: Diagnostics,
}

impl TransferMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transfer is due on a rising reset edge or while synchronized.
    #[inline]
    pub fn should_transfer(&self, pins: &BridgePins) -> bool {
        (pins.reset_request && !self.reset_old) || pins.status
    }

    /// Run one exchange pass.
    ///
    /// `tx` and `rx` must hold at least `codec.frame_len()` bytes. Feedback
    /// pins are only written when the reply is a DATA frame.
    pub fn step<T: Transport + ?Sized>(
        &mut self,
        pins: &mut BridgePins,
        transport: &mut T,
        codec: &FrameCodec,
        joints: &mut [JointState],
        tx: &mut [u8],
        rx: &mut [u8],
    ) -> TransferState {
        let previous = self.state;

        if let Err(e) = transport.set_device_reset(pins.device_reset) {
            self.transport_fault(pins, previous, &e);
        } else if !pins.enable {
            pins.status = false;
            self.state = TransferState::Faulted(Fault::BusDisabled);
        } else if self.should_transfer(pins) {
            self.state = TransferState::Transferring;
            if pins.status {
                codec.encode_write(pins, joints, tx);
            } else {
                codec.encode_read(tx);
            }

            let len = codec.frame_len();
            self.diagnostics.transfers += 1;
            match exchange(transport, &tx[..len], &mut rx[..len]) {
                Ok(()) => self.handle_reply(pins, codec, joints, rx),
                Err(e) => self.transport_fault(pins, previous, &e),
            }
        } else {
            self.state = TransferState::Idle;
        }

        self.reset_old = pins.reset_request;
        self.state
    }

    fn handle_reply(
        &mut self,
        pins: &mut BridgePins,
        codec: &FrameCodec,
        joints: &mut [JointState],
        rx: &[u8],
    ) {
        match classify(codec.header(rx)) {
            HeaderClass::Data => {
                pins.status = true;
                if self.in_estop {
                    self.in_estop = false;
                    info!("E-stop cleared");
                }
                self.diagnostics.data_frames += 1;
                codec.decode_data(rx, pins, joints);
                self.state = TransferState::DataValid;
            }
            HeaderClass::EStop => {
                pins.status = false;
                self.diagnostics.estop_frames += 1;
                if !self.in_estop {
                    self.in_estop = true;
                    self.diagnostics.estop_events += 1;
                    error!("An E-stop is active");
                }
                self.state = TransferState::Faulted(Fault::EStop);
            }
            HeaderClass::Malformed(header) => {
                pins.status = false;
                self.diagnostics.malformed_frames += 1;
                self.diagnostics.last_bad_header = Some(header);
                if self.diagnostics.should_log_malformed() {
                    warn!(
                        count = self.diagnostics.malformed_frames,
                        "Bad SPI payload = {header:#010x}"
                    );
                }
                self.state = TransferState::Faulted(Fault::Malformed { header });
            }
        }
    }

    fn transport_fault(&mut self, pins: &mut BridgePins, previous: TransferState, err: &HalError) {
        pins.status = false;
        self.diagnostics.transport_errors += 1;
        if previous != TransferState::Faulted(Fault::Transport) {
            warn!("Transport failure: {err}");
        }
        self.state = TransferState::Faulted(Fault::Transport);
    }

    #[inline]
    pub fn state(&self) -> TransferState {
        self.state
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[inline]
    pub fn in_estop(&self) -> bool {
        self.in_estop
    }
}

/// Strobe, exchange, release. The strobe is released even when the
/// exchange fails.
fn exchange<T: Transport + ?Sized>(
    transport: &mut T,
    tx: &[u8],
    rx: &mut [u8],
) -> Result<(), HalError> {
    let result = transport
        .set_strobe(true)
        .and_then(|()| transport.transfer(tx, rx));
    let released = transport.set_strobe(false);
    result.and(released)
}
