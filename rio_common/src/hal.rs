//! Hardware abstraction seam.
//!
//! This module defines the byte-exchange interface that bus backends
//! implement and the errors they report.

pub mod transport;
