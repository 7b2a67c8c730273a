//! GPIO pin assignments for the ESP32-S3 demo board.
//!
//! Single source of truth — [`DemoConfig`](crate::config::DemoConfig)
//! defaults reference these rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// Discrete user LED, active HIGH.
pub const LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// User button (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// BOOT push-button (GPIO0).  Usable as a user button once booted.
pub const BUTTON_GPIO: i32 = 0;

// ---------------------------------------------------------------------------
// UART console
// ---------------------------------------------------------------------------

/// Console UART port number.
pub const CONSOLE_UART_NUM: i32 = 0;

/// Highest GPIO number on the ESP32-S3.
pub const MAX_GPIO: i32 = 48;

/// Whether `pin` names a GPIO that exists on this chip.
pub const fn is_valid_gpio(pin: i32) -> bool {
    pin >= 0 && pin <= MAX_GPIO
}
