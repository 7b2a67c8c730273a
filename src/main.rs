//! Low-power blink demo — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  EspGpio      EspRtc       EspLowPower    LogEventSink         │
//! │  (GpioPort)   (RtcPort)    (LowPowerPort) (EventSink)          │
//! │  RawOutputPin (OutputPin)  FreeRtos (DelayNs)                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          Worker (pure sequencing, own thread)          │    │
//! │  │  boot · arm · awake ⇄ sleep                            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_svc::hal::delay::FreeRtos;
use log::info;

use lowpower_demo::adapters::esp::WAKE_LATCH;
use lowpower_demo::adapters::esp::gpio::{EspGpio, RawOutputPin};
use lowpower_demo::adapters::esp::low_power::EspLowPower;
use lowpower_demo::adapters::esp::rtc::EspRtc;
use lowpower_demo::adapters::log_sink::LogEventSink;
use lowpower_demo::app::worker::{Board, Worker};
use lowpower_demo::config::DemoConfig;
use lowpower_demo::startup::{self, WORKER_NAME};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    // ── 2. Console ────────────────────────────────────────────
    let config = DemoConfig::default();
    startup::init_serial(config.serial_baud)?;

    info!("╔══════════════════════════════════════╗");
    info!("║  lowpower-demo v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    info!("Config: {}", config.to_json());

    config.validate().map_err(lowpower_demo::error::Error::from)?;

    // ── 3. Worker thread ──────────────────────────────────────
    let worker_config = config.clone();
    let handle = startup::spawn_worker(
        config.worker_priority,
        config.worker_stack_bytes,
        WORKER_NAME,
        move || {
            let board = Board::new(
                RawOutputPin::new(worker_config.led_gpio),
                EspGpio::new(),
                EspRtc::new(),
                EspLowPower::new(),
                FreeRtos,
            );
            let worker = Worker::new(worker_config, board, &WAKE_LATCH);
            worker.run(&mut LogEventSink::new());
        },
    )?;

    // ── 4. Scheduler ──────────────────────────────────────────
    // Only returns if the worker ends.
    Err(startup::start_scheduler(handle).into())
}
