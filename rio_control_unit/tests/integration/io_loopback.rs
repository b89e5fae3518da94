//! Integration test: digital I/O and auxiliary setpoints.
//!
//! The emulator loops digital outputs back to its inputs and echoes each
//! setpoint word as the matching process variable.

use super::Rig;

const IO_BOARD: &str = r#"
[[joints]]
control = "v"

[[setpoints]]
kind = "pwm"
frequency_hz = 10000.0

[[setpoints]]
kind = "rc_servo"

[io]
process_variables = 2
digital_outputs = 8
digital_inputs = 12
"#;

fn synced() -> Rig {
    let mut rig = Rig::new(IO_BOARD);
    rig.pins.reset_request = true;
    rig.cycle();
    assert!(rig.pins.status);
    rig
}

#[test]
fn read_request_latches_nothing() {
    let mut rig = Rig::new(IO_BOARD);
    rig.pins.outputs[0] = true;
    rig.pins.setpoints[0] = 50.0;
    rig.pins.reset_request = true;
    rig.cycle();

    assert_eq!(rig.emulator.outputs().count_set(), 0);
    assert_eq!(rig.emulator.setpoint_word(0), 0);
    assert!(!rig.pins.inputs[0]);
}

#[test]
fn outputs_loop_back_to_inputs() {
    let mut rig = synced();
    for i in 0..8 {
        rig.pins.outputs[i] = i % 3 == 0;
    }
    rig.cycle();

    for i in 0..8 {
        assert_eq!(rig.pins.inputs[i], i % 3 == 0, "input {i}");
        assert_eq!(rig.pins.inputs_not[i], i % 3 != 0, "input_not {i}");
    }
    // inputs with no matching output read low
    for i in 8..12 {
        assert!(!rig.pins.inputs[i]);
        assert!(rig.pins.inputs_not[i]);
    }
}

#[test]
fn setpoints_echo_as_process_variables() {
    let mut rig = synced();
    rig.pins.setpoints[0] = 50.0;
    rig.pins.setpoints[1] = 0.0;
    rig.cycle();

    // 50 % of a 4800-tick carrier period
    assert_eq!(rig.emulator.setpoint_word(0), 2400);
    // servo centre: 1.5 ms at 48 MHz
    assert_eq!(rig.emulator.setpoint_word(1), 72_000);
    assert_eq!(rig.pins.process_variables[0], 2400.0);
    assert_eq!(rig.pins.process_variables[1], 72_000.0);
}

#[test]
fn out_of_range_setpoints_are_clamped() {
    let mut rig = synced();
    rig.pins.setpoints[0] = 250.0;
    rig.pins.setpoints[1] = -1000.0;
    rig.cycle();

    assert_eq!(rig.emulator.setpoint_word(0), 4800);
    assert_eq!(rig.emulator.setpoint_word(1), 48_000);
}
