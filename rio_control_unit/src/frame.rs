//! Frame codec.
//!
//! Packs the outbound command frame and unpacks the inbound feedback frame.
//! Offsets come from [`rio_common::frame::FrameLayout`].

pub mod codec;
pub mod setpoint;
pub mod words;

pub use codec::FrameCodec;
pub use setpoint::{EncodeSetpoint, encode_setpoint};
pub use words::{NO_PULSES, decode_frequency, encode_frequency};
