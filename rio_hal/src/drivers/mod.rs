//! Transport implementations.
//!
//! - [`spi`] - Hardware transport over an `embedded-hal` SPI bus
//! - [`simulation`] - Firmware emulator for development and testing
//!
//! # Adding New Transports
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `Transport` trait from `rio_common::hal::transport`
//! 3. Add a constructor below if the binary should be able to select it

pub mod simulation;
pub mod spi;

use rio_common::config::BridgeConfig;
use rio_common::hal::transport::Transport;
use tracing::info;

/// Build a boxed firmware emulator sized for `config`.
pub fn create_emulator(config: &BridgeConfig) -> Box<dyn Transport> {
    let emulator = simulation::FirmwareEmulator::from_config(config);
    info!(
        "Firmware emulator: {} joints, {} byte frames",
        config.joints.len(),
        emulator.layout().exchange_len()
    );
    Box::new(emulator)
}
