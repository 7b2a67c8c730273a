//! Single-colour status LED driver.
//!
//! Wraps any `embedded_hal::digital::OutputPin` and remembers the level it
//! last drove, so the worker can assert LED/phase consistency without
//! reading the pin back.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: the pin is [`RawOutputPin`](crate::adapters::esp::gpio::RawOutputPin).
//! On host/test: any mock `OutputPin`.

use embedded_hal::digital::OutputPin;

use crate::error::GpioError;

pub struct Led<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> Led<P> {
    /// The LED is assumed off until first driven.
    pub fn new(pin: P) -> Self {
        Self { pin, on: false }
    }

    pub fn on(&mut self) -> Result<(), GpioError> {
        self.pin.set_high().map_err(|_| GpioError::WriteFailed)?;
        self.on = true;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), GpioError> {
        self.pin.set_low().map_err(|_| GpioError::WriteFailed)?;
        self.on = false;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Borrow the underlying pin (tests inspect mock history through this).
    pub fn pin(&self) -> &P {
        &self.pin
    }
}
