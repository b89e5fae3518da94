//! # RIO Control Unit Library
//!
//! Real-time core of the bridge between a motion host and the RIO FPGA
//! step/IO firmware. Every cycle it turns per-joint commands into step
//! frequencies, packs them into one outbound SPI frame, exchanges it for an
//! inbound frame and turns the reply back into feedback.
//!
//! ## Per-Cycle Data Flow
//!
//! 1. **Control law** ([`control`]): position or velocity command → limited
//!    step frequency per joint
//! 2. **Frame codec** ([`frame`]): frequencies, enables, setpoints and
//!    outputs → outbound frame
//! 3. **Transfer machine** ([`transfer`]): gating, strobe, duplex exchange
//! 4. **Fault classification** ([`fault`]): DATA / ESTOP / malformed
//! 5. **Frame codec** again: inbound DATA frame → feedback pins, via the
//!    joint scaling in [`joint`]
//!
//! ## Zero-Allocation RT Path
//!
//! [`bridge::Bridge`] owns all runtime state in fixed-capacity collections
//! sized at startup. `update` and `exchange` never allocate.

pub mod bridge;
pub mod control;
pub mod cycle;
pub mod fault;
pub mod frame;
pub mod joint;
pub mod transfer;
