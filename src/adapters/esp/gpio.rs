//! GPIO adapter: pin configuration, per-pin edge interrupts, LED output.

use core::ffi::c_void;

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use esp_idf_svc::sys::*;
use log::{debug, info};

use crate::app::ports::{Edge, GpioPort, PinMode};
use crate::error::GpioError;
use crate::pins::{MAX_GPIO, is_valid_gpio};
use crate::wake::{HandlerSlot, WakeCallback};

use super::WAKE_LATCH;

/// One callback slot per GPIO, indexed by pin number.
static PIN_HANDLERS: [HandlerSlot; MAX_GPIO as usize + 1] =
    [const { HandlerSlot::new() }; MAX_GPIO as usize + 1];

/// The pin number travels through the ISR argument pointer.
unsafe extern "C" fn pin_isr(arg: *mut c_void) {
    fire_pin_handler(arg as usize as i32);
}

/// Run the callback registered for `pin`.  Also used after a GPIO wakeup,
/// when the level interrupt that woke the chip was consumed by the sleep
/// controller.
pub(crate) fn fire_pin_handler(pin: i32) -> bool {
    usize::try_from(pin)
        .ok()
        .and_then(|i| PIN_HANDLERS.get(i))
        .is_some_and(|slot| slot.fire(&WAKE_LATCH))
}

pub(crate) fn intr_type(edge: Edge) -> gpio_int_type_t {
    match edge {
        Edge::Rising => gpio_int_type_t_GPIO_INTR_POSEDGE,
        Edge::Falling => gpio_int_type_t_GPIO_INTR_NEGEDGE,
        Edge::Change => gpio_int_type_t_GPIO_INTR_ANYEDGE,
    }
}

fn check_pin(pin: i32) -> Result<(), GpioError> {
    if is_valid_gpio(pin) {
        Ok(())
    } else {
        Err(GpioError::InvalidPin(pin))
    }
}

/// Register `callback` for `pin` and enable its edge interrupt.
pub(crate) fn attach_isr(pin: i32, callback: WakeCallback, edge: Edge) -> Result<(), GpioError> {
    check_pin(pin)?;
    PIN_HANDLERS[pin as usize].set(callback);

    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed.  `pin_isr` is a static function that
    // only reads a HandlerSlot and stores to an atomic.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(GpioError::IsrAttachFailed(ret));
        }
        let ret = gpio_set_intr_type(pin, intr_type(edge));
        if ret != ESP_OK as i32 {
            return Err(GpioError::IsrAttachFailed(ret));
        }
        // Re-adding a handler for the same pin replaces it.
        gpio_isr_handler_remove(pin);
        let ret = gpio_isr_handler_add(pin, Some(pin_isr), pin as usize as *mut c_void);
        if ret != ESP_OK as i32 {
            return Err(GpioError::IsrAttachFailed(ret));
        }
        gpio_intr_enable(pin);
    }
    debug!("gpio: GPIO{} interrupt on {:?}", pin, edge);
    Ok(())
}

// ── GpioPort ──────────────────────────────────────────────────

/// Zero-sized handle over the GPIO matrix.
#[derive(Debug, Default)]
pub struct EspGpio;

impl EspGpio {
    pub fn new() -> Self {
        Self
    }
}

impl GpioPort for EspGpio {
    fn pin_mode(&mut self, pin: i32, mode: PinMode) -> Result<(), GpioError> {
        check_pin(pin)?;
        let (gpio_mode, pull_up) = match mode {
            PinMode::Output => (gpio_mode_t_GPIO_MODE_OUTPUT, gpio_pullup_t_GPIO_PULLUP_DISABLE),
            PinMode::Input => (gpio_mode_t_GPIO_MODE_INPUT, gpio_pullup_t_GPIO_PULLUP_DISABLE),
            PinMode::InputPullUp => (gpio_mode_t_GPIO_MODE_INPUT, gpio_pullup_t_GPIO_PULLUP_ENABLE),
        };
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode,
            pull_up_en: pull_up,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            ..Default::default()
        };
        // SAFETY: cfg is a fully initialised stack value; gpio_config only
        // reads it.  The pin number was range-checked above.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(GpioError::ConfigFailed(ret));
        }
        info!("gpio: GPIO{} as {:?}", pin, mode);
        Ok(())
    }

    fn attach_interrupt(
        &mut self,
        pin: i32,
        callback: WakeCallback,
        edge: Edge,
    ) -> Result<(), GpioError> {
        attach_isr(pin, callback, edge)
    }
}

// ── LED output pin ────────────────────────────────────────────

/// Failed `gpio_set_level`, carrying the ESP-IDF return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelWriteError(pub i32);

impl embedded_hal::digital::Error for LevelWriteError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// `OutputPin` over a GPIO already configured by [`EspGpio::pin_mode`].
#[derive(Debug)]
pub struct RawOutputPin {
    pin: i32,
}

impl RawOutputPin {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }

    fn write(&mut self, level: u32) -> Result<(), LevelWriteError> {
        // SAFETY: gpio_set_level is a single register write.
        let ret = unsafe { gpio_set_level(self.pin, level) };
        if ret != ESP_OK as i32 {
            return Err(LevelWriteError(ret));
        }
        Ok(())
    }
}

impl ErrorType for RawOutputPin {
    type Error = LevelWriteError;
}

impl OutputPin for RawOutputPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(0)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(1)
    }
}
