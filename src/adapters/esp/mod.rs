//! ESP-IDF implementations of the board ports.
//!
//! | Adapter      | Implements     | Connects to                          |
//! |--------------|----------------|--------------------------------------|
//! | `gpio`       | GpioPort       | GPIO matrix, per-pin ISR service     |
//! |              | OutputPin      | `gpio_set_level`                     |
//! | `rtc`        | RtcPort        | RTC-backed system time, `esp_timer`  |
//! | `low_power`  | LowPowerPort   | `esp_sleep` light sleep              |
//!
//! ISR trampolines cannot capture state, so every callback registered
//! through these adapters records into the single [`WAKE_LATCH`].

use crate::wake::WakeLatch;

pub mod gpio;
pub mod low_power;
pub mod rtc;

/// Process-wide wake latch shared by all interrupt trampolines.
pub static WAKE_LATCH: WakeLatch = WakeLatch::new();
