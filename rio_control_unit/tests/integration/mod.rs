//! Shared rig: one bridge wired to one emulator.

mod io_loopback;
mod motion;
mod sync;

use rio_common::config::BridgeConfig;
use rio_common::pins::BridgePins;
use rio_control_unit::bridge::Bridge;
use rio_control_unit::transfer::TransferState;
use rio_hal::FirmwareEmulator;

/// 1 kHz cycle.
pub const PERIOD_NS: i64 = 1_000_000;

pub struct Rig {
    pub bridge: Bridge,
    pub pins: BridgePins,
    pub emulator: FirmwareEmulator,
}

impl Rig {
    /// Bus and every joint enabled, not yet synchronized.
    pub fn new(toml: &str) -> Self {
        let config = BridgeConfig::from_toml(toml).unwrap();
        let bridge = Bridge::new(&config).unwrap();
        let emulator = FirmwareEmulator::from_config(&config);
        let mut pins = BridgePins::from_config(&config);
        pins.enable = true;
        pins.enable_all_joints();
        Self {
            bridge,
            pins,
            emulator,
        }
    }

    pub fn cycle(&mut self) -> TransferState {
        self.bridge
            .cycle(&mut self.pins, &mut self.emulator, PERIOD_NS)
    }

    pub fn run(&mut self, cycles: usize) -> TransferState {
        let mut state = self.bridge.state();
        for _ in 0..cycles {
            state = self.cycle();
        }
        state
    }

    /// Drop and raise `reset_request`, producing one rising edge.
    pub fn resync(&mut self) -> TransferState {
        self.pins.reset_request = false;
        self.cycle();
        self.pins.reset_request = true;
        self.cycle()
    }
}
