//! Transport trait and error types.
//!
//! A transport clocks one outbound frame out while clocking one inbound
//! frame in, and drives the side-band lines around it. Bus and GPIO
//! peripheral setup happens before a transport is constructed.

use thiserror::Error;

/// Error types for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Transport construction failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Bus exchange failed
    #[error("Bus communication error: {0}")]
    Communication(String),

    /// Strobe or reset line could not be driven
    #[error("Pin error: {0}")]
    Pin(String),

    /// Outbound and inbound buffers differ in length
    #[error("Frame length mismatch: expected {expected} bytes, got {actual}")]
    FrameLength { expected: usize, actual: usize },
}

/// Duplex byte-exchange primitive with a strobe line.
///
/// # Contract
///
/// | Operation | Blocking | RT Constraint |
/// |-----------|----------|---------------|
/// | `transfer()` | until all bytes are clocked | **HARD** |
/// | `set_strobe()` | no | **HARD** |
/// | `set_device_reset()` | no | **HARD** |
///
/// `tx` and `rx` always have the same length. Implementations must not
/// allocate.
pub trait Transport: Send {
    /// Short identifier used in logs (e.g. "spi", "emulator").
    fn name(&self) -> &'static str;

    /// Exchange `tx.len()` bytes: `tx` goes out while `rx` fills.
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), HalError>;

    /// Assert (`true`) or release (`false`) the frame strobe.
    fn set_strobe(&mut self, asserted: bool) -> Result<(), HalError>;

    /// Drive the device reset line. Transports without one ignore it.
    fn set_device_reset(&mut self, _asserted: bool) -> Result<(), HalError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), HalError> {
        (**self).transfer(tx, rx)
    }

    fn set_strobe(&mut self, asserted: bool) -> Result<(), HalError> {
        (**self).set_strobe(asserted)
    }

    fn set_device_reset(&mut self, asserted: bool) -> Result<(), HalError> {
        (**self).set_device_reset(asserted)
    }
}

/// Reject mismatched buffers before touching the bus.
#[inline]
pub fn check_frame_lengths(tx: &[u8], rx: &[u8]) -> Result<(), HalError> {
    if tx.len() != rx.len() {
        return Err(HalError::FrameLength {
            expected: tx.len(),
            actual: rx.len(),
        });
    }
    Ok(())
}
