//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements     | Connects to                    |
//! |-------------|----------------|--------------------------------|
//! | `log_sink`  | EventSink      | Serial log output              |
//! | `esp`       | GpioPort       | ESP32-S3 GPIO + ISR service    |
//! |             | RtcPort        | RTC system time + esp_timer    |
//! |             | LowPowerPort   | ESP-IDF light sleep            |

#[cfg(target_os = "espidf")]
pub mod esp;
pub mod log_sink;
