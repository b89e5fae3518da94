//! # RIO HAL Library
//!
//! Transports that carry bridge frames to the FPGA firmware. Each one
//! implements [`rio_common::hal::transport::Transport`].
//!
//! # Module Structure
//!
//! - [`drivers`] - Transport implementations
//!   - [`drivers::spi`] - `embedded-hal` 1.0 SPI bus with strobe and reset lines
//!   - [`drivers::simulation`] - Software emulation of the step/IO firmware
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   frame    ┌──────────────────────────────┐
//! │  rio_control_unit    │──────────►│  Transport (trait object)     │
//! │  (TransferMachine)   │◄──────────│  ├─ SpiTransport<Bus, Pin>    │
//! └──────────────────────┘   frame    │  └─ FirmwareEmulator          │
//!                                     └──────────────────────────────┘
//! ```

pub mod drivers;

pub use crate::drivers::simulation::FirmwareEmulator;
pub use crate::drivers::spi::{NoResetPin, SpiTransport};
