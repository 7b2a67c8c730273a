//! Demo configuration parameters
//!
//! Every timing constant, pin and start-up value the worker uses lives here,
//! so the three 3 s delays and the 5 s alarm offset cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::pins;

/// How the RTC alarm is programmed across sleep cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMode {
    /// Program the alarm once during arming and never again.  After it has
    /// fired, only the button can wake the device.
    OneShot,
    /// Reprogram the alarm to `now + alarm_offset_secs` right before every
    /// sleep call.
    RearmOnSleep,
}

/// Core demo configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoConfig {
    // --- Console ---
    /// Serial console baud rate
    pub serial_baud: u32,

    // --- Worker thread ---
    /// FreeRTOS priority of the worker task
    pub worker_priority: u8,
    /// Fixed stack allocation for the worker task (bytes)
    pub worker_stack_bytes: usize,

    // --- Pins ---
    pub led_gpio: i32,
    pub button_gpio: i32,

    // --- Timing ---
    /// Settle delay before touching peripherals (milliseconds)
    pub boot_delay_ms: u32,
    /// LED-on phase length (milliseconds)
    pub awake_ms: u32,
    /// LED-off phase length before entering sleep (milliseconds)
    pub pre_sleep_ms: u32,
    /// Alarm deadline relative to the RTC's current epoch (seconds)
    pub alarm_offset_secs: u32,
    pub alarm_mode: AlarmMode,

    // --- RTC start value (demo, not wall-clock accurate) ---
    /// (hour, minute, second)
    pub initial_time: (u8, u8, u8),
    /// (day, month, two-digit year)
    pub initial_date: (u8, u8, u8),
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            serial_baud: 115_200,

            worker_priority: 5,
            worker_stack_bytes: 4096,

            led_gpio: pins::LED_GPIO,
            button_gpio: pins::BUTTON_GPIO,

            boot_delay_ms: 3000,
            awake_ms: 3000,
            pre_sleep_ms: 3000,
            alarm_offset_secs: 5,
            alarm_mode: AlarmMode::RearmOnSleep,

            initial_time: (8, 30, 58),
            initial_date: (21, 4, 24),
        }
    }
}

/// Reasons a configuration is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// The JSON document could not be parsed.
    Malformed,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Malformed => write!(f, "malformed config document"),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::Malformed => Self::Config("malformed config document"),
        }
    }
}

impl DemoConfig {
    /// Reject values that would make the demo misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial_baud == 0 {
            return Err(ConfigError::ValidationFailed("serial_baud must be > 0"));
        }
        if self.worker_stack_bytes < 2048 {
            return Err(ConfigError::ValidationFailed(
                "worker_stack_bytes must be >= 2048",
            ));
        }
        if !pins::is_valid_gpio(self.led_gpio) || !pins::is_valid_gpio(self.button_gpio) {
            return Err(ConfigError::ValidationFailed("pin out of range"));
        }
        if self.led_gpio == self.button_gpio {
            return Err(ConfigError::ValidationFailed("led and button share a pin"));
        }
        if self.alarm_offset_secs == 0 {
            return Err(ConfigError::ValidationFailed("alarm_offset_secs must be > 0"));
        }
        let (h, m, s) = self.initial_time;
        let (day, month, year) = self.initial_date;
        if crate::datetime::RtcDateTime::new(year, month, day, h, m, s).is_err() {
            return Err(ConfigError::ValidationFailed("initial date/time invalid"));
        }
        Ok(())
    }

    /// Parse and validate a JSON override document.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(doc).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Compact JSON rendering for the boot banner.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
