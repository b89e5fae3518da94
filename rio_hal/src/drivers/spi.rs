//! SPI transport over `embedded-hal` 1.0.
//!
//! The bus must already be configured (mode, clock divider, chip select).
//! The strobe is active low and frames every transfer; the optional reset
//! line follows the host's device-reset pin level.

use embedded_hal::digital::{self, Error as _, OutputPin};
use embedded_hal::spi::{Error as _, SpiBus};
use rio_common::hal::transport::{HalError, Transport, check_frame_lengths};
use std::convert::Infallible;

/// Placeholder for boards without a device reset line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResetPin;

impl digital::ErrorType for NoResetPin {
    type Error = Infallible;
}

impl OutputPin for NoResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Frame transport over an SPI bus plus GPIO side-band lines.
pub struct SpiTransport<B, S, R = NoResetPin> {
    bus: B,
    strobe: S,
    reset: R,
    /// Last level written to the reset line, to skip redundant GPIO writes.
    reset_level: Option<bool>,
}

impl<B, S> SpiTransport<B, S, NoResetPin>
where
    B: SpiBus<u8>,
    S: OutputPin,
{
    pub fn new(bus: B, strobe: S) -> Self {
        Self {
            bus,
            strobe,
            reset: NoResetPin,
            reset_level: None,
        }
    }
}

impl<B, S, R> SpiTransport<B, S, R>
where
    B: SpiBus<u8>,
    S: OutputPin,
    R: OutputPin,
{
    /// Attach a device reset line.
    pub fn with_reset_pin<R2: OutputPin>(self, reset: R2) -> SpiTransport<B, S, R2> {
        SpiTransport {
            bus: self.bus,
            strobe: self.strobe,
            reset,
            reset_level: None,
        }
    }

    /// Give the peripherals back.
    pub fn release(self) -> (B, S, R) {
        (self.bus, self.strobe, self.reset)
    }
}

impl<B, S, R> Transport for SpiTransport<B, S, R>
where
    B: SpiBus<u8> + Send,
    S: OutputPin + Send,
    R: OutputPin + Send,
{
    fn name(&self) -> &'static str {
        "spi"
    }

    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), HalError> {
        check_frame_lengths(tx, rx)?;
        self.bus
            .transfer(rx, tx)
            .map_err(|e| HalError::Communication(format!("{:?}", e.kind())))?;
        self.bus
            .flush()
            .map_err(|e| HalError::Communication(format!("{:?}", e.kind())))
    }

    fn set_strobe(&mut self, asserted: bool) -> Result<(), HalError> {
        let result = if asserted {
            self.strobe.set_low()
        } else {
            self.strobe.set_high()
        };
        result.map_err(|e| HalError::Pin(format!("strobe: {:?}", e.kind())))
    }

    fn set_device_reset(&mut self, asserted: bool) -> Result<(), HalError> {
        if self.reset_level == Some(asserted) {
            return Ok(());
        }
        let result = if asserted {
            self.reset.set_high()
        } else {
            self.reset.set_low()
        };
        result.map_err(|e| HalError::Pin(format!("reset: {:?}", e.kind())))?;
        self.reset_level = Some(asserted);
        Ok(())
    }
}
