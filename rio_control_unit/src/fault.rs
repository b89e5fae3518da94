//! Fault classification.
//!
//! The inbound header alone decides what a reply means. None of the faults
//! are fatal: they drop the status flag and the bridge keeps cycling.

use rio_common::consts::{HEADER_DATA, HEADER_ESTOP};
use std::fmt;

/// Meaning of an inbound frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderClass {
    /// Valid feedback follows.
    Data,
    /// The firmware reports an active emergency stop.
    EStop,
    /// Anything else; the header is kept for diagnostics.
    Malformed(u32),
}

#[inline]
pub fn classify(header: u32) -> HeaderClass {
    match header {
        HEADER_DATA => HeaderClass::Data,
        HEADER_ESTOP => HeaderClass::EStop,
        other => HeaderClass::Malformed(other),
    }
}

/// Why the bridge is not synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The host holds the bus disabled.
    BusDisabled,
    EStop,
    Malformed { header: u32 },
    /// The transport failed to exchange the frame.
    Transport,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusDisabled => write!(f, "bus disabled"),
            Self::EStop => write!(f, "e-stop active"),
            Self::Malformed { header } => write!(f, "bad payload header {header:#010x}"),
            Self::Transport => write!(f, "transport failure"),
        }
    }
}

/// Running fault counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Transfers attempted.
    pub transfers: u64,
    pub data_frames: u64,
    /// E-stop occurrences (entries into the e-stop condition).
    pub estop_events: u64,
    /// Replies with an e-stop header, every one counted.
    pub estop_frames: u64,
    pub malformed_frames: u64,
    pub transport_errors: u64,
    pub last_bad_header: Option<u32>,
}

impl Diagnostics {
    /// Malformed headers are logged for the first 10, then every 1000th.
    #[inline]
    pub fn should_log_malformed(&self) -> bool {
        self.malformed_frames <= 10 || self.malformed_frames % 1000 == 0
    }
}
