//! Bridge constants.
//!
//! Capacities of the fixed-size collections, the header tags of the wire
//! protocol and the constants used by the frequency and setpoint encoders.

use static_assertions::const_assert;

// ─── Capacities ─────────────────────────────────────────────────────

/// Maximum number of step/dir joints.
pub const MAX_JOINTS: usize = 16;

/// Bytes needed for the joint enable bitmask at full capacity.
pub const MAX_JOINT_ENABLE_BYTES: usize = MAX_JOINTS.div_ceil(8);

/// Maximum number of auxiliary setpoint outputs.
pub const MAX_SETPOINTS: usize = 16;

/// Maximum number of process variable inputs.
pub const MAX_PROCESS_VARIABLES: usize = 16;

/// Bytes reserved for each digital bitmask (outputs and inputs).
pub const MAX_DIGITAL_BYTES: usize = 8;

/// Maximum number of digital outputs or inputs.
pub const MAX_DIGITAL_BITS: usize = MAX_DIGITAL_BYTES * 8;

// ─── Frame ──────────────────────────────────────────────────────────

/// Size of the frame header.
pub const HEADER_BYTES: usize = 4;

/// Size of every 32-bit word in the payload.
pub const WORD_BYTES: usize = 4;

/// Largest outbound frame: header, frequency words, enables, setpoints, outputs.
pub const MAX_TX_BYTES: usize = HEADER_BYTES
    + MAX_JOINTS * WORD_BYTES
    + MAX_JOINT_ENABLE_BYTES
    + MAX_SETPOINTS * WORD_BYTES
    + MAX_DIGITAL_BYTES;

/// Largest inbound frame: header, feedback words, process variables, inputs.
pub const MAX_RX_BYTES: usize = HEADER_BYTES
    + MAX_JOINTS * WORD_BYTES
    + MAX_PROCESS_VARIABLES * WORD_BYTES
    + MAX_DIGITAL_BYTES;

/// Buffer size of both frame directions.
pub const MAX_FRAME_BYTES: usize = MAX_TX_BYTES;

const_assert!(MAX_RX_BYTES <= MAX_FRAME_BYTES);
const_assert!(MAX_JOINT_ENABLE_BYTES * 8 >= MAX_JOINTS);

/// Host → device: synchronized command frame ("writ").
pub const HEADER_WRITE: u32 = 0x7772_6974;

/// Host → device: resynchronisation request ("read").
pub const HEADER_READ: u32 = 0x7265_6164;

/// Device → host: valid feedback frame ("data").
pub const HEADER_DATA: u32 = 0x6461_7461;

/// Device → host: emergency stop active ("estp").
pub const HEADER_ESTOP: u32 = 0x6573_7470;

// ─── Scaling ────────────────────────────────────────────────────────

/// Full range of the device's fixed-point position counter (2^22).
pub const FULL_RANGE_MASK: f64 = (1u32 << 22) as f64;

/// Scale magnitudes below this are treated as unset and replaced by 1.0.
pub const MIN_SCALE_MAGNITUDE: f64 = 1e-20;

// ─── Defaults ───────────────────────────────────────────────────────

/// Default device oscillator frequency in Hz.
pub const DEFAULT_OSCILLATOR_HZ: u32 = 48_000_000;

/// Default device base frequency in Hz (max step rate is half of this).
pub const DEFAULT_BASE_FREQ_HZ: u32 = 48_000_000;

/// Default control cycle time in microseconds.
pub const DEFAULT_CYCLE_TIME_US: u32 = 1000;

/// Default acceleration limit in engineering units per second squared.
pub const DEFAULT_MAX_ACCEL: f64 = 1.0;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rio/bridge.toml";

// ─── Setpoint encoding ──────────────────────────────────────────────

/// Upper end of the linear setpoint range.
pub const LINEAR_FULL_SCALE: f64 = 0x7FFF_FFFF as f64;

/// Offset added to an RC servo setpoint (-100..100) before scaling.
pub const RC_SERVO_OFFSET: f64 = 300.0;

/// Divisor applied to the oscillator for one RC servo step.
pub const RC_SERVO_DIVISOR: f64 = 200_000.0;

/// PWM duty is given in percent.
pub const PWM_PERCENT: f64 = 100.0;
