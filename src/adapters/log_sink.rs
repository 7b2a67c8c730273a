//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing worker events to the `log` facade
//! (bound to the ESP-IDF logger, i.e. the UART console, in production).
//! Status events go out at `info`, so the info-level console carries only
//! `Starting thread...`, `Running...` and `Sleeping...`.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::ThreadStarted | AppEvent::Running | AppEvent::Sleeping => {
                info!("{}", event);
            }
            AppEvent::Armed { .. } | AppEvent::Woke(_) => {
                debug!("{}", event);
            }
            AppEvent::Fault(_) => {
                warn!("{}", event);
            }
        }
    }
}
