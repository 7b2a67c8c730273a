//! Outbound application events.
//!
//! The [`Worker`](super::worker::Worker) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  The three status events
//! render to the exact console lines the demo prints.

use core::fmt;

use crate::error::Error;
use crate::wake::WakeReason;

/// Structured events emitted by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Worker thread entered; printed before the boot delay.
    ThreadStarted,

    /// Arming finished.  Carries the first alarm deadline, if one was set.
    Armed { alarm_epoch: Option<u32> },

    /// Awake phase began (LED on).
    Running,

    /// Sleeping phase began (LED off).
    Sleeping,

    /// The sleep call returned.  `None` when no callback recorded a reason.
    Woke(Option<WakeReason>),

    /// A peripheral call failed; the sequence carried on.
    Fault(Error),
}

impl AppEvent {
    /// Whether this event belongs on the primary status stream.
    pub fn is_status(&self) -> bool {
        matches!(self, Self::ThreadStarted | Self::Running | Self::Sleeping)
    }
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThreadStarted => write!(f, "Starting thread..."),
            Self::Running => write!(f, "Running..."),
            Self::Sleeping => write!(f, "Sleeping..."),
            Self::Armed {
                alarm_epoch: Some(epoch),
            } => write!(f, "Armed, first alarm at epoch {}", epoch),
            Self::Armed { alarm_epoch: None } => write!(f, "Armed, no alarm programmed"),
            Self::Woke(Some(reason)) => write!(f, "Woke: {:?}", reason),
            Self::Woke(None) => write!(f, "Woke: unknown source"),
            Self::Fault(e) => write!(f, "Fault: {}", e),
        }
    }
}
