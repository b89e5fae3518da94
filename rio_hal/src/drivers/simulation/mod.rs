//! Firmware emulator module.
//!
//! This module emulates the FPGA step/IO firmware behind the bus so the
//! bridge can run end to end without hardware.

mod emulator;
mod stepgen;

pub use emulator::{EmulatorStats, FirmwareEmulator};
pub use stepgen::StepGenerator;
