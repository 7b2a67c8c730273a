//! Wake reasons and the interrupt-context callbacks that record them.
//!
//! ```text
//! ┌──────────────┐   on_alarm_wakeup   ┌────────────┐
//! │ RTC alarm    │────────────────────▶│            │   take()   ┌────────┐
//! └──────────────┘                     │ WakeLatch  │───────────▶│ Worker │
//! ┌──────────────┐   on_button_press   │ (AtomicU8) │            └────────┘
//! │ Button edge  │────────────────────▶│            │
//! └──────────────┘                     └────────────┘
//! ```
//!
//! Callbacks run in ISR (or timer-task) context: they do a single atomic
//! store and return.  The worker takes the latch once after the blocking
//! sleep call returns.

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::app::ports::{Edge, SleepDepth};
use crate::error::PowerError;

/// Why the worker came back from sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WakeReason {
    /// The RTC alarm epoch was reached.
    RtcAlarm = 1,
    /// The user button changed level.
    Button = 2,
}

impl WakeReason {
    fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::RtcAlarm),
            2 => Some(Self::Button),
            _ => None,
        }
    }
}

const LATCH_EMPTY: u8 = 0;

/// Single-slot, lock-free record of the most recent wake reason.
///
/// Producers: ISR callbacks.  Consumer: the worker thread.  A later record
/// overwrites an earlier one that has not been taken yet.
pub struct WakeLatch {
    reason: AtomicU8,
}

impl WakeLatch {
    pub const fn new() -> Self {
        Self {
            reason: AtomicU8::new(LATCH_EMPTY),
        }
    }

    /// Record a wake reason.  Safe from interrupt context.
    pub fn record(&self, reason: WakeReason) {
        self.reason.store(reason as u8, Ordering::Release);
    }

    /// Take the recorded reason, leaving the latch empty.
    pub fn take(&self) -> Option<WakeReason> {
        WakeReason::from_u8(self.reason.swap(LATCH_EMPTY, Ordering::AcqRel))
    }

    /// Read without clearing.
    pub fn peek(&self) -> Option<WakeReason> {
        WakeReason::from_u8(self.reason.load(Ordering::Acquire))
    }

    /// Drop any stale reason (e.g. an alarm that fired while awake).
    pub fn clear(&self) {
        self.reason.store(LATCH_EMPTY, Ordering::Release);
    }
}

impl Default for WakeLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Signature shared by every wake callback.
pub type WakeCallback = fn(&WakeLatch);

/// RTC alarm interrupt callback.
pub fn on_alarm_wakeup(latch: &WakeLatch) {
    latch.record(WakeReason::RtcAlarm);
}

/// Button edge interrupt callback.  Fires on every edge, undebounced.
pub fn on_button_press(latch: &WakeLatch) {
    latch.record(WakeReason::Button);
}

// ── Handler slots ─────────────────────────────────────────────

/// A registered callback that an ISR trampoline can look up.
///
/// Written once from the worker during arming, read from interrupt context.
/// `const`-constructible so adapters can keep one in a `static`.
pub struct HandlerSlot {
    inner: Mutex<CriticalSectionRawMutex, Cell<Option<WakeCallback>>>,
}

impl HandlerSlot {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(None)),
        }
    }

    pub fn set(&self, callback: WakeCallback) {
        self.inner.lock(|slot| slot.set(Some(callback)));
    }

    pub fn get(&self) -> Option<WakeCallback> {
        self.inner.lock(Cell::get)
    }

    /// Invoke the registered callback, if any.  Returns whether one ran.
    pub fn fire(&self, latch: &WakeLatch) -> bool {
        match self.get() {
            Some(callback) => {
                callback(latch);
                true
            }
            None => false,
        }
    }
}

impl Default for HandlerSlot {
    fn default() -> Self {
        Self::new()
    }
}

// ── Wake-source registration set ──────────────────────────────

/// A hardware event registered as able to end a sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeSource {
    RtcAlarm,
    Pin {
        pin: i32,
        edge: Edge,
        depth: SleepDepth,
    },
}

/// RTC alarm plus one button.
pub const MAX_WAKE_SOURCES: usize = 2;

/// Registered wake sources.  Entries are never removed; registering the
/// same source again updates it in place.
#[derive(Debug, Default, Clone)]
pub struct WakeSourceSet {
    sources: heapless::Vec<WakeSource, MAX_WAKE_SOURCES>,
}

impl WakeSourceSet {
    pub const fn new() -> Self {
        Self {
            sources: heapless::Vec::new(),
        }
    }

    pub fn register(&mut self, source: WakeSource) -> Result<(), PowerError> {
        let existing = self.sources.iter_mut().find(|s| match (**s, source) {
            (WakeSource::RtcAlarm, WakeSource::RtcAlarm) => true,
            (WakeSource::Pin { pin: a, .. }, WakeSource::Pin { pin: b, .. }) => a == b,
            _ => false,
        });
        match existing {
            Some(slot) => {
                *slot = source;
                Ok(())
            }
            None => self
                .sources
                .push(source)
                .map_err(|_| PowerError::TooManyWakeSources),
        }
    }

    pub fn has_rtc_alarm(&self) -> bool {
        self.sources.contains(&WakeSource::RtcAlarm)
    }

    /// Registered pin sources as `(pin, edge, depth)`.
    pub fn pins(&self) -> impl Iterator<Item = (i32, Edge, SleepDepth)> + '_ {
        self.sources.iter().filter_map(|s| match *s {
            WakeSource::Pin { pin, edge, depth } => Some((pin, edge, depth)),
            WakeSource::RtcAlarm => None,
        })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

// ── Alarm and sleep planning ──────────────────────────────────

/// The single pending RTC alarm deadline (Unix seconds), shared between
/// the worker and interrupt context.  0 means nothing is armed.
pub struct PendingAlarm {
    deadline: AtomicU32,
}

impl PendingAlarm {
    pub const fn new() -> Self {
        Self {
            deadline: AtomicU32::new(0),
        }
    }

    /// Arm for `epoch`, replacing any pending deadline.  0 disarms.
    pub fn arm(&self, epoch: u32) {
        self.deadline.store(epoch, Ordering::Release);
    }

    pub fn disarm(&self) {
        self.deadline.store(0, Ordering::Release);
    }

    pub fn deadline(&self) -> Option<u32> {
        match self.deadline.load(Ordering::Acquire) {
            0 => None,
            epoch => Some(epoch),
        }
    }

    /// Claim the pending alarm.  Returns `true` exactly once per arming,
    /// no matter how many contexts race to fire it.
    pub fn claim(&self) -> bool {
        self.deadline.swap(0, Ordering::AcqRel) != 0
    }

    /// Claim the alarm and run `slot`'s callback.  Returns whether it ran.
    pub fn fire(&self, slot: &HandlerSlot, latch: &WakeLatch) -> bool {
        self.claim() && slot.fire(latch)
    }
}

impl Default for PendingAlarm {
    fn default() -> Self {
        Self::new()
    }
}

/// What the sleep controller does with the RTC alarm before sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPlan {
    /// No alarm pending; no timer wakeup.
    Idle,
    /// The deadline has already passed: fire now instead of sleeping.
    FireNow,
    /// Program a timer wakeup this many seconds out.
    WakeIn(u32),
}

pub fn timer_plan(deadline: Option<u32>, now: u32) -> TimerPlan {
    match deadline {
        None => TimerPlan::Idle,
        Some(epoch) if epoch <= now => TimerPlan::FireNow,
        Some(epoch) => TimerPlan::WakeIn(epoch - now),
    }
}

/// Level a GPIO wakeup is armed on.  Sleep wakeups are level-triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeLevel {
    High,
    Low,
}

/// Level that signals `edge` given the pin's level when sleep is entered.
/// `Change` arms the opposite of the current level.
pub fn wake_level(edge: Edge, currently_high: bool) -> WakeLevel {
    match edge {
        Edge::Rising => WakeLevel::High,
        Edge::Falling => WakeLevel::Low,
        Edge::Change if currently_high => WakeLevel::Low,
        Edge::Change => WakeLevel::High,
    }
}
