//! Port traits — the hexagonal boundary between the worker and the vendor services.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Worker (domain)
//! ```
//!
//! ESP-IDF adapters (GPIO, RTC, low-power) implement these traits; the
//! [`Worker`](super::worker::Worker) consumes them via generics, so the
//! blink/sleep sequencing never touches registers directly and runs
//! unchanged against the mock board in `tests/`.
//!
//! The LED and the blocking delay use the `embedded-hal` 1.0 traits
//! (`OutputPin`, `DelayNs`) instead of a bespoke port.

use crate::error::{GpioError, PowerError, RtcError};
use crate::wake::WakeCallback;

// ───────────────────────────────────────────────────────────────
// Shared vocabulary
// ───────────────────────────────────────────────────────────────

/// Electrical configuration of a GPIO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Output,
    Input,
    InputPullUp,
}

/// Which transitions trigger an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    /// Both rising and falling.
    Change,
}

/// How deep a wake source is able to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepDepth {
    /// Clocks gated, RAM and peripherals retained.
    Light,
    /// Deepest mode that still resumes after the sleep call.
    Deep,
}

// ───────────────────────────────────────────────────────────────
// GPIO port
// ───────────────────────────────────────────────────────────────

/// Pin configuration and interrupt attachment.
pub trait GpioPort {
    /// Configure direction and pull for `pin`.
    fn pin_mode(&mut self, pin: i32, mode: PinMode) -> Result<(), GpioError>;

    /// Bind `callback` to `edge` transitions on `pin`.
    fn attach_interrupt(
        &mut self,
        pin: i32,
        callback: WakeCallback,
        edge: Edge,
    ) -> Result<(), GpioError>;
}

// ───────────────────────────────────────────────────────────────
// RTC port
// ───────────────────────────────────────────────────────────────

/// Real-time clock with a single one-shot alarm.
pub trait RtcPort {
    /// Start the clock source.
    fn begin(&mut self) -> Result<(), RtcError>;

    /// Set the time of day, keeping the date.
    fn set_time(&mut self, hour: u8, minute: u8, second: u8) -> Result<(), RtcError>;

    /// Set the date (two-digit year), keeping the time of day.
    fn set_date(&mut self, day: u8, month: u8, year: u8) -> Result<(), RtcError>;

    /// Current time as seconds since the Unix epoch.
    fn epoch(&self) -> u32;

    /// Arm the alarm for `epoch`.  Replaces any pending alarm.
    fn set_alarm_epoch(&mut self, epoch: u32) -> Result<(), RtcError>;

    /// Pending alarm deadline, `None` once it has fired or if never armed.
    fn alarm_epoch(&self) -> Option<u32>;

    /// Callback invoked when the alarm fires.
    fn attach_alarm(&mut self, callback: WakeCallback);
}

// ───────────────────────────────────────────────────────────────
// Low-power port
// ───────────────────────────────────────────────────────────────

/// Sleep-mode controller and wake-source registry.
pub trait LowPowerPort {
    fn begin(&mut self) -> Result<(), PowerError>;

    /// Register the RTC alarm as a wake source bound to `callback`.
    fn enable_wakeup_from_rtc<R: RtcPort>(
        &mut self,
        rtc: &mut R,
        callback: WakeCallback,
    ) -> Result<(), PowerError>;

    /// Register `pin` edges as a wake source reaching `depth`.
    fn attach_interrupt_wakeup(
        &mut self,
        pin: i32,
        callback: WakeCallback,
        edge: Edge,
        depth: SleepDepth,
    ) -> Result<(), PowerError>;

    /// Block until a registered wake source fires.
    ///
    /// Returns once execution resumes; the wake reason is delivered through
    /// the registered callbacks, not the return value.
    fn deep_sleep(&mut self) -> Result<(), PowerError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port
// ───────────────────────────────────────────────────────────────

/// The worker emits [`AppEvent`](super::events::AppEvent)s through this
/// port.  The serial console is one implementation.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
