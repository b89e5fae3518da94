//! Integration test: synchronization handshake and fault recovery.
//!
//! The bridge starts unsynchronized, syncs on a reset edge with a READ
//! request, then streams WRITE frames. Every fault drops `status` and only
//! a new reset edge brings it back.

use super::Rig;
use rio_control_unit::fault::Fault;
use rio_control_unit::transfer::TransferState;

const ONE_JOINT: &str = r#"
[[joints]]
control = "v"
"#;

const WITH_IO: &str = r#"
[[joints]]
control = "v"

[io]
digital_outputs = 4
digital_inputs = 4
"#;

// ── Handshake ───────────────────────────────────────────────────────

#[test]
fn no_transfer_before_reset_edge() {
    let mut rig = Rig::new(ONE_JOINT);

    assert_eq!(rig.run(5), TransferState::Idle);
    assert!(!rig.pins.status);
    assert_eq!(rig.emulator.stats().transfers, 0);
    assert_eq!(rig.bridge.diagnostics().transfers, 0);
}

#[test]
fn reset_edge_reads_then_writes() {
    let mut rig = Rig::new(ONE_JOINT);

    rig.pins.reset_request = true;
    assert_eq!(rig.cycle(), TransferState::DataValid);
    assert!(rig.pins.status);
    assert_eq!(rig.emulator.stats().read_frames, 1);
    assert_eq!(rig.emulator.stats().write_frames, 0);
    assert_eq!(&rig.bridge.last_tx()[..4], b"daer");

    // reset_request held high: status keeps the transfers going
    assert_eq!(rig.run(3), TransferState::DataValid);
    assert_eq!(rig.emulator.stats().write_frames, 3);
    assert_eq!(&rig.bridge.last_tx()[..4], b"tirw");
    assert_eq!(&rig.bridge.last_rx()[..4], b"atad");
    assert_eq!(rig.bridge.diagnostics().data_frames, 4);
}

#[test]
fn strobe_frames_every_transfer() {
    let mut rig = Rig::new(ONE_JOINT);
    rig.pins.reset_request = true;
    rig.run(10);

    let stats = rig.emulator.stats();
    assert_eq!(stats.transfers, 10);
    assert_eq!(stats.unstrobed, 0);
    assert_eq!(stats.unknown_frames, 0);
}

// ── E-stop ──────────────────────────────────────────────────────────

#[test]
fn estop_drops_status_until_cleared_and_resynced() {
    let mut rig = Rig::new(ONE_JOINT);
    rig.pins.reset_request = true;
    rig.cycle();
    assert!(rig.pins.status);

    rig.emulator.set_estop(true);
    assert_eq!(rig.cycle(), TransferState::Faulted(Fault::EStop));
    assert!(!rig.pins.status);
    assert_eq!(rig.bridge.diagnostics().estop_events, 1);
    assert_eq!(rig.bridge.diagnostics().estop_frames, 1);

    // no edge and no status: the bridge stays quiet
    assert_eq!(rig.run(3), TransferState::Idle);
    assert_eq!(rig.bridge.diagnostics().estop_frames, 1);

    // resync while the e-stop is still active is one occurrence, not two
    assert_eq!(rig.resync(), TransferState::Faulted(Fault::EStop));
    assert_eq!(rig.bridge.diagnostics().estop_frames, 2);
    assert_eq!(rig.bridge.diagnostics().estop_events, 1);

    rig.emulator.set_estop(false);
    assert_eq!(rig.resync(), TransferState::DataValid);
    assert!(rig.pins.status);

    rig.emulator.set_estop(true);
    rig.cycle();
    assert_eq!(rig.bridge.diagnostics().estop_events, 2);
}

// ── Bus enable ──────────────────────────────────────────────────────

#[test]
fn bus_disabled_keeps_last_inputs() {
    let mut rig = Rig::new(WITH_IO);
    rig.pins.reset_request = true;
    rig.pins.outputs[1] = true;
    rig.run(2);
    assert!(rig.pins.inputs[1]);

    rig.pins.enable = false;
    rig.pins.outputs[1] = false;
    let transfers = rig.emulator.stats().transfers;

    assert_eq!(rig.run(4), TransferState::Faulted(Fault::BusDisabled));
    assert!(!rig.pins.status);
    assert_eq!(rig.emulator.stats().transfers, transfers);
    assert!(rig.pins.inputs[1]);
    assert!(!rig.pins.inputs_not[1]);

    // re-enabling alone does not resync
    rig.pins.enable = true;
    assert_eq!(rig.cycle(), TransferState::Idle);
    assert_eq!(rig.resync(), TransferState::DataValid);
}

// ── Malformed replies ───────────────────────────────────────────────

#[test]
fn malformed_header_leaves_feedback_untouched() {
    let mut rig = Rig::new(ONE_JOINT);
    rig.pins.reset_request = true;
    rig.cycle();
    assert_eq!(rig.pins.joints[0].counts, 0);

    rig.emulator.preload_steps(0, 500.0);
    rig.emulator.force_header(Some(0xDEAD_BEEF));
    assert_eq!(
        rig.cycle(),
        TransferState::Faulted(Fault::Malformed {
            header: 0xDEAD_BEEF
        })
    );
    assert!(!rig.pins.status);
    assert_eq!(rig.pins.joints[0].counts, 0);

    let diag = rig.bridge.diagnostics();
    assert_eq!(diag.malformed_frames, 1);
    assert_eq!(diag.last_bad_header, Some(0xDEAD_BEEF));

    rig.emulator.force_header(None);
    assert_eq!(rig.resync(), TransferState::DataValid);
    assert_eq!(rig.pins.joints[0].counts, 500);
}

#[test]
fn zero_header_is_malformed() {
    let mut rig = Rig::new(ONE_JOINT);
    rig.emulator.force_header(Some(0));
    rig.pins.reset_request = true;

    assert_eq!(
        rig.cycle(),
        TransferState::Faulted(Fault::Malformed { header: 0 })
    );
    assert!(!rig.pins.status);
}

// ── Transport errors ────────────────────────────────────────────────

#[test]
fn transport_error_recovers_on_reset_edge() {
    let mut rig = Rig::new(ONE_JOINT);
    rig.pins.reset_request = true;
    rig.cycle();

    rig.emulator.inject_faults(2);
    assert_eq!(rig.cycle(), TransferState::Faulted(Fault::Transport));
    assert!(!rig.pins.status);
    assert_eq!(rig.cycle(), TransferState::Idle);

    // the second injected fault hits the resync READ
    assert_eq!(rig.resync(), TransferState::Faulted(Fault::Transport));
    assert_eq!(rig.bridge.diagnostics().transport_errors, 2);

    assert_eq!(rig.resync(), TransferState::DataValid);
    assert!(rig.pins.status);
    assert_eq!(rig.emulator.stats().injected_faults, 2);
}

// ── Device reset ────────────────────────────────────────────────────

#[test]
fn device_reset_is_forwarded_every_cycle() {
    let mut rig = Rig::new(ONE_JOINT);
    rig.pins.reset_request = true;
    rig.cycle();
    rig.emulator.preload_steps(0, 100.0);
    rig.cycle();
    assert_eq!(rig.pins.joints[0].counts, 100);

    rig.pins.device_reset = true;
    rig.cycle();
    assert!(rig.emulator.device_reset());
    assert_eq!(rig.pins.joints[0].counts, 0);

    rig.pins.device_reset = false;
    rig.cycle();
    assert!(!rig.emulator.device_reset());
}
