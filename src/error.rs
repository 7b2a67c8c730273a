//! Unified error types for the firmware.
//!
//! Every port returns one of the subsystem enums below; all of them convert
//! into the top-level [`Error`].  Variants are `Copy` so the worker can
//! collect them in a fixed-capacity list without allocating.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Pin configuration or interrupt attachment failed.
    Gpio(GpioError),
    /// The real-time clock rejected a command.
    Rtc(RtcError),
    /// The low-power controller failed to arm or enter sleep.
    Power(PowerError),
    /// The serial console could not be configured.
    Serial(i32),
    /// The worker thread could not be created or stopped unexpectedly.
    Thread(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(e) => write!(f, "gpio: {e}"),
            Self::Rtc(e) => write!(f, "rtc: {e}"),
            Self::Power(e) => write!(f, "power: {e}"),
            Self::Serial(rc) => write!(f, "serial: console config failed (rc={rc})"),
            Self::Thread(msg) => write!(f, "thread: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// GPIO errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// `gpio_config` (or equivalent) returned a non-OK code.
    ConfigFailed(i32),
    /// The ISR service or handler registration failed.
    IsrAttachFailed(i32),
    /// Driving an output pin failed.
    WriteFailed,
    /// Pin number is not usable on this board.
    InvalidPin(i32),
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigFailed(rc) => write!(f, "pin config failed (rc={rc})"),
            Self::IsrAttachFailed(rc) => write!(f, "ISR attach failed (rc={rc})"),
            Self::WriteFailed => write!(f, "output write failed"),
            Self::InvalidPin(pin) => write!(f, "invalid pin {pin}"),
        }
    }
}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Self::Gpio(e)
    }
}

// ---------------------------------------------------------------------------
// RTC errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcError {
    /// The clock source could not be started.
    NotRunning,
    /// A time or date field is out of range.
    InvalidDateTime,
    /// The alarm timer could not be created or started.
    AlarmFailed(i32),
}

impl fmt::Display for RtcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRunning => write!(f, "clock not running"),
            Self::InvalidDateTime => write!(f, "invalid date/time"),
            Self::AlarmFailed(rc) => write!(f, "alarm programming failed (rc={rc})"),
        }
    }
}

impl From<RtcError> for Error {
    fn from(e: RtcError) -> Self {
        Self::Rtc(e)
    }
}

// ---------------------------------------------------------------------------
// Low-power errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerError {
    /// `begin()` has not been called yet.
    NotInitialised,
    /// The wake-source set is already full.
    TooManyWakeSources,
    /// A wake source could not be enabled.
    WakeupConfigFailed(i32),
    /// The sleep call was rejected by the power manager.
    SleepRejected(i32),
}

impl fmt::Display for PowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialised => write!(f, "low-power controller not initialised"),
            Self::TooManyWakeSources => write!(f, "wake-source set full"),
            Self::WakeupConfigFailed(rc) => write!(f, "wakeup config failed (rc={rc})"),
            Self::SleepRejected(rc) => write!(f, "sleep rejected (rc={rc})"),
        }
    }
}

impl From<PowerError> for Error {
    fn from(e: PowerError) -> Self {
        Self::Power(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
