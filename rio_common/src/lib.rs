//! RIO Common Library
//!
//! Shared building blocks for the RIO bridge workspace: capacities and wire
//! constants, the TOML configuration model, the per-cycle pin surface, the
//! packed frame layout and the [`hal::transport::Transport`] seam that bus
//! implementations plug into.
//!
//! # Module Structure
//!
//! - [`consts`] - Capacities, header tags, encoding constants
//! - [`config`] - Bridge configuration and TOML loading
//! - [`pins`] - Pin/parameter surface exchanged with the host every cycle
//! - [`bits`] - Fixed-size bit sets for enables and digital IO
//! - [`frame`] - Outbound/inbound frame layout and little-endian word helpers
//! - [`hal`] - Transport trait and transport errors
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! rio = { package = "rio_common", path = "../rio_common" }
//! ```

pub mod bits;
pub mod config;
pub mod consts;
pub mod frame;
pub mod hal;
pub mod pins;
pub mod prelude;
