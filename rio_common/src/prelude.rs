//! Common re-exports for convenience.
//!
//! ```rust
//! use rio_common::prelude::*;
//! ```

// ─── Capacities & wire constants ────────────────────────────────────
pub use crate::consts::{
    FULL_RANGE_MASK, HEADER_DATA, HEADER_ESTOP, HEADER_READ, HEADER_WRITE, MAX_DIGITAL_BITS,
    MAX_FRAME_BYTES, MAX_JOINTS, MAX_PROCESS_VARIABLES, MAX_SETPOINTS,
};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    BridgeConfig, ConfigError, ControlMode, FeedbackKind, JointConfig, SetpointEncoding,
};

// ─── Runtime surface ────────────────────────────────────────────────
pub use crate::bits::{DigitalBits, JointEnableBits};
pub use crate::frame::FrameLayout;
pub use crate::hal::transport::{HalError, Transport};
pub use crate::pins::{BridgePins, JointPins};
