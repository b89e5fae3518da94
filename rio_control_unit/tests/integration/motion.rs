//! Integration test: closed-loop motion against emulated step generators.

use super::Rig;
use rio_control_unit::transfer::TransferState;

const POSITION_AXIS: &str = r#"
[[joints]]
control = "p"
scale = 100.0
max_velocity = 10.0
max_accel = 10000.0
pgain = 50.0
"#;

const VELOCITY_AXIS: &str = r#"
[[joints]]
control = "v"
scale = 200.0
max_velocity = 5.0
max_accel = 50.0
"#;

const FAST_SPINDLE: &str = r#"
[[joints]]
control = "v"
max_accel = 1000000.0
"#;

const SCALED_SPINDLE: &str = r#"
[[joints]]
control = "v"
feedback_scale = 4
max_accel = 1000000.0
"#;

const SCALED_FEEDBACK: &str = r#"
[[joints]]
control = "v"
feedback_scale = 4

[[joints]]
control = "v"
feedback = "absolute"
scale = 10.0
"#;

#[test]
fn position_loop_converges_on_command() {
    let mut rig = Rig::new(POSITION_AXIS);
    rig.pins.joints[0].pos_cmd = 1.0;
    rig.pins.reset_request = true;

    let mut peak_freq: f64 = 0.0;
    for _ in 0..2000 {
        assert_eq!(rig.cycle(), TransferState::DataValid);
        peak_freq = peak_freq.max(rig.pins.joints[0].freq_cmd.abs());
    }

    let joint = &rig.pins.joints[0];
    assert!(
        (joint.pos_fb - 1.0).abs() < 0.02,
        "pos_fb = {}",
        joint.pos_fb
    );
    assert_eq!(joint.freq_cmd, 0.0);
    // 10 units/s at 100 steps/unit
    assert!(peak_freq <= 1000.0 + 1e-9, "peak {peak_freq}");
}

#[test]
fn frequency_and_slew_stay_within_limits() {
    let mut rig = Rig::new(VELOCITY_AXIS);
    rig.pins.reset_request = true;

    let mut seed: u32 = 0x1234_5678;
    let mut previous = 0.0;
    for _ in 0..500 {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        rig.pins.joints[0].vel_cmd = (f64::from(seed >> 8) / f64::from(1u32 << 24)) * 40.0 - 20.0;
        rig.cycle();

        let limits = rig.bridge.limits()[0];
        assert_eq!(limits.max_freq, 1000.0);
        let freq = rig.pins.joints[0].freq_cmd;
        assert!(freq.abs() <= limits.max_freq + 1e-9);
        // 50 units/s² at 200 steps/unit over 1 ms
        assert!((freq - previous).abs() <= 10.0 + 1e-9, "{previous} -> {freq}");
        previous = freq;
    }
}

#[test]
fn standstill_reports_identical_feedback() {
    let mut rig = Rig::new(VELOCITY_AXIS);
    rig.pins.reset_request = true;
    rig.cycle();
    let counts = rig.pins.joints[0].counts;
    let pos_fb = rig.pins.joints[0].pos_fb;

    rig.run(10);
    assert_eq!(rig.pins.joints[0].counts, counts);
    assert_eq!(rig.pins.joints[0].pos_fb, pos_fb);
    assert_eq!(pos_fb, 0.5 / 200.0);
}

#[test]
fn counter_wraparound_extends_position() {
    let mut rig = Rig::new(FAST_SPINDLE);
    rig.emulator.preload_steps(0, f64::from(i32::MAX) - 2.0);
    rig.pins.joints[0].vel_cmd = 1000.0;
    rig.pins.reset_request = true;

    rig.cycle();
    assert_eq!(rig.pins.joints[0].counts, i64::from(i32::MAX) - 2);

    rig.run(20);
    let generator = rig.emulator.generator(0).unwrap();
    assert!(generator.count() < 0, "device counter should have wrapped");

    let counts = rig.pins.joints[0].counts;
    assert!(counts > i64::from(i32::MAX));
    assert_eq!(counts, generator.position().floor() as i64);
    assert_eq!(rig.pins.joints[0].pos_fb, (counts as f64 + 0.5) / 1.0);
}

#[test]
fn scaled_feedback_survives_device_word_wrap() {
    let mut rig = Rig::new(SCALED_SPINDLE);
    let start = f64::from(i32::MAX / 4) - 2.0;
    rig.emulator.preload_steps(0, start);
    rig.pins.joints[0].vel_cmd = 1000.0;
    rig.pins.reset_request = true;

    rig.cycle();
    assert_eq!(rig.pins.joints[0].counts, start as i64);

    // the device reports count × 4, which wraps after a few steps
    rig.run(10);
    let generator = rig.emulator.generator(0).unwrap();
    assert!(generator.count().wrapping_mul(4) < 0);

    let counts = rig.pins.joints[0].counts;
    assert_eq!(counts, generator.position().floor() as i64);
    assert!(counts > start as i64);
}

#[test]
fn feedback_scale_and_absolute_feedback() {
    let mut rig = Rig::new(SCALED_FEEDBACK);
    rig.emulator.preload_steps(0, 1000.0);
    rig.emulator.preload_steps(1, 250.0);
    rig.pins.reset_request = true;
    rig.cycle();

    // reported ×4 by the device, divided back by the bridge
    assert_eq!(rig.pins.joints[0].counts, 1000);
    assert_eq!(rig.pins.joints[1].counts, 250);
    assert_eq!(rig.pins.joints[1].pos_fb, 25.0);
}

#[test]
fn disabled_joint_is_held_at_zero() {
    let mut rig = Rig::new(SCALED_FEEDBACK);
    rig.pins.joints[0].vel_cmd = 0.5;
    rig.pins.joints[1].vel_cmd = 0.5;
    rig.pins.joints[1].enable = false;
    rig.pins.reset_request = true;
    rig.run(5);

    assert!(rig.pins.joints[0].freq_cmd > 0.0);
    assert_eq!(rig.pins.joints[1].freq_cmd, 0.0);
    assert!(rig.emulator.generator(0).unwrap().enabled());
    assert!(!rig.emulator.generator(1).unwrap().enabled());
    assert_eq!(rig.emulator.generator(1).unwrap().frequency(), 0.0);
}
