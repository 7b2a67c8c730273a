//! Virtual-time mock board for integration tests.
//!
//! Every mock shares one [`SimState`]: a millisecond clock that only moves
//! when the worker calls `delay_ms` or `deep_sleep`.  While time advances,
//! the RTC alarm and scheduled button edges fire the registered callbacks
//! exactly like the interrupt trampolines do on target.  Every port call is
//! recorded so tests can assert on the full history.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use lowpower_demo::app::events::AppEvent;
use lowpower_demo::app::ports::{
    Edge, EventSink, GpioPort, LowPowerPort, PinMode, RtcPort, SleepDepth,
};
use lowpower_demo::app::worker::{Board, Worker};
use lowpower_demo::config::DemoConfig;
use lowpower_demo::datetime::RtcDateTime;
use lowpower_demo::error::{GpioError, PowerError, RtcError};
use lowpower_demo::wake::{WakeCallback, WakeLatch, WakeSource, WakeSourceSet};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    PinMode(i32, PinMode),
    AttachInterrupt(i32, Edge),
    RtcBegin,
    SetTime(u8, u8, u8),
    SetDate(u8, u8, u8),
    PowerBegin,
    EnableRtcWake,
    AttachWake(i32, Edge, SleepDepth),
    SetAlarm(u32),
    DeepSleep,
}

/// Port operations a test can make fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Fault {
    LedPinMode,
    RtcBegin,
    PowerBegin,
    LedWrite,
}

// ── Shared simulation state ───────────────────────────────────

#[derive(Default)]
pub struct SimState {
    pub now_ms: u64,
    /// RTC epoch at `now_ms == 0`.
    clock_base: i64,
    pub alarm: Option<u32>,
    alarm_cb: Option<WakeCallback>,
    pin_irqs: Vec<(i32, WakeCallback)>,
    pin_wakes: Vec<(i32, WakeCallback)>,
    wake_sources: WakeSourceSet,
    power_begun: bool,
    /// Pending button edges, ascending ms.
    button_edges: VecDeque<u64>,
    button_pin: i32,
    pub calls: Vec<Call>,
    pub led_history: Vec<(u64, bool)>,
    pub sleeps: Vec<(u64, u64)>,
    pub stuck: bool,
    pub faults: BTreeSet<Fault>,
}

impl SimState {
    pub fn epoch(&self) -> u32 {
        (self.clock_base + (self.now_ms / 1000) as i64) as u32
    }

    /// First millisecond at which the RTC reads `epoch`.
    fn ms_at_epoch(&self, epoch: u32) -> u64 {
        ((i64::from(epoch) - self.clock_base).max(0) as u64) * 1000
    }

    fn next_alarm_ms(&self) -> Option<u64> {
        self.alarm.map(|a| self.ms_at_epoch(a))
    }

    fn fire_alarm(&mut self, latch: &WakeLatch) {
        self.alarm = None;
        if let Some(cb) = self.alarm_cb {
            cb(latch);
        }
    }

    fn fire_button(&mut self, latch: &WakeLatch, asleep: bool) {
        let handlers = if asleep { &self.pin_wakes } else { &self.pin_irqs };
        for (pin, cb) in handlers {
            if *pin == self.button_pin {
                cb(latch);
            }
        }
    }

    /// Move the clock to `target_ms`, firing awake-side interrupts on the way.
    fn advance_awake(&mut self, target_ms: u64, latch: &WakeLatch) {
        loop {
            let alarm = self.next_alarm_ms().filter(|&t| t <= target_ms);
            let edge = self.button_edges.front().copied().filter(|&t| t <= target_ms);
            match earliest(alarm, edge) {
                Some(Next::Alarm(t)) => {
                    self.now_ms = self.now_ms.max(t);
                    self.fire_alarm(latch);
                }
                Some(Next::Edge(t)) => {
                    self.now_ms = self.now_ms.max(t);
                    self.button_edges.pop_front();
                    self.fire_button(latch, false);
                }
                None => break,
            }
        }
        self.now_ms = target_ms;
    }

    fn sleep(&mut self, latch: &WakeLatch) {
        let start = self.now_ms;
        let alarm = if self.wake_sources.has_rtc_alarm() {
            self.next_alarm_ms()
        } else {
            None
        };
        let button_armed = self.wake_sources.pins().any(|(p, _, _)| p == self.button_pin);
        let edge = if button_armed {
            self.button_edges.iter().copied().find(|&t| t >= start)
        } else {
            None
        };
        match earliest(alarm, edge) {
            Some(Next::Alarm(t)) => {
                self.now_ms = start.max(t);
                self.fire_alarm(latch);
            }
            Some(Next::Edge(t)) => {
                self.now_ms = t;
                self.button_edges.retain(|&b| b > t);
                self.fire_button(latch, true);
            }
            // Nothing can wake the chip.
            None => self.stuck = true,
        }
        self.sleeps.push((start, self.now_ms));
    }
}

enum Next {
    Alarm(u64),
    Edge(u64),
}

/// The alarm wins a tie.
fn earliest(alarm: Option<u64>, edge: Option<u64>) -> Option<Next> {
    match (alarm, edge) {
        (Some(a), Some(e)) if e < a => Some(Next::Edge(e)),
        (Some(a), _) => Some(Next::Alarm(a)),
        (None, Some(e)) => Some(Next::Edge(e)),
        (None, None) => None,
    }
}

pub type Shared = Rc<RefCell<SimState>>;

// ── LED pin ───────────────────────────────────────────────────

pub struct MockLed(Shared);

impl ErrorType for MockLed {
    type Error = Infallible;
}

impl OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut s = self.0.borrow_mut();
        let t = s.now_ms;
        s.led_history.push((t, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut s = self.0.borrow_mut();
        let t = s.now_ms;
        s.led_history.push((t, true));
        Ok(())
    }
}

/// LED pin whose writes fail while [`Fault::LedWrite`] is injected.
pub struct FlakyLed(Shared);

#[derive(Debug)]
pub struct WriteError;

impl embedded_hal::digital::Error for WriteError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl ErrorType for FlakyLed {
    type Error = WriteError;
}

impl OutputPin for FlakyLed {
    fn set_low(&mut self) -> Result<(), WriteError> {
        if self.0.borrow().faults.contains(&Fault::LedWrite) {
            return Err(WriteError);
        }
        MockLed(Rc::clone(&self.0)).set_low().map_err(|_| WriteError)
    }

    fn set_high(&mut self) -> Result<(), WriteError> {
        if self.0.borrow().faults.contains(&Fault::LedWrite) {
            return Err(WriteError);
        }
        MockLed(Rc::clone(&self.0)).set_high().map_err(|_| WriteError)
    }
}

// ── GPIO ──────────────────────────────────────────────────────

pub struct MockGpio(Shared);

impl GpioPort for MockGpio {
    fn pin_mode(&mut self, pin: i32, mode: PinMode) -> Result<(), GpioError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::PinMode(pin, mode));
        if mode == PinMode::Output && s.faults.contains(&Fault::LedPinMode) {
            return Err(GpioError::ConfigFailed(-1));
        }
        Ok(())
    }

    fn attach_interrupt(
        &mut self,
        pin: i32,
        callback: WakeCallback,
        edge: Edge,
    ) -> Result<(), GpioError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(Call::AttachInterrupt(pin, edge));
        s.pin_irqs.push((pin, callback));
        Ok(())
    }
}

// ── RTC ───────────────────────────────────────────────────────

pub struct MockRtc {
    state: Shared,
}

impl MockRtc {
    fn now(&self) -> RtcDateTime {
        RtcDateTime::from_epoch_or_base(self.state.borrow().epoch())
    }

    fn write(&mut self, dt: RtcDateTime) {
        let mut s = self.state.borrow_mut();
        let secs = (s.now_ms / 1000) as i64;
        s.clock_base = i64::from(dt.to_epoch()) - secs;
    }
}

impl RtcPort for MockRtc {
    fn begin(&mut self) -> Result<(), RtcError> {
        let mut s = self.state.borrow_mut();
        s.calls.push(Call::RtcBegin);
        if s.faults.contains(&Fault::RtcBegin) {
            return Err(RtcError::NotRunning);
        }
        Ok(())
    }

    fn set_time(&mut self, hour: u8, minute: u8, second: u8) -> Result<(), RtcError> {
        self.state.borrow_mut().calls.push(Call::SetTime(hour, minute, second));
        let dt = self.now().with_time(hour, minute, second)?;
        self.write(dt);
        Ok(())
    }

    fn set_date(&mut self, day: u8, month: u8, year: u8) -> Result<(), RtcError> {
        self.state.borrow_mut().calls.push(Call::SetDate(day, month, year));
        let dt = self.now().with_date(day, month, year)?;
        self.write(dt);
        Ok(())
    }

    fn epoch(&self) -> u32 {
        self.state.borrow().epoch()
    }

    fn set_alarm_epoch(&mut self, epoch: u32) -> Result<(), RtcError> {
        let mut s = self.state.borrow_mut();
        s.calls.push(Call::SetAlarm(epoch));
        s.alarm = Some(epoch);
        Ok(())
    }

    fn alarm_epoch(&self) -> Option<u32> {
        self.state.borrow().alarm
    }

    fn attach_alarm(&mut self, callback: WakeCallback) {
        self.state.borrow_mut().alarm_cb = Some(callback);
    }
}

// ── Low power ─────────────────────────────────────────────────

pub struct MockLowPower {
    state: Shared,
    latch: Rc<WakeLatch>,
}

impl LowPowerPort for MockLowPower {
    fn begin(&mut self) -> Result<(), PowerError> {
        let mut s = self.state.borrow_mut();
        s.calls.push(Call::PowerBegin);
        if s.faults.contains(&Fault::PowerBegin) {
            return Err(PowerError::NotInitialised);
        }
        s.power_begun = true;
        Ok(())
    }

    fn enable_wakeup_from_rtc<R: RtcPort>(
        &mut self,
        rtc: &mut R,
        callback: WakeCallback,
    ) -> Result<(), PowerError> {
        self.state.borrow_mut().calls.push(Call::EnableRtcWake);
        if !self.state.borrow().power_begun {
            return Err(PowerError::NotInitialised);
        }
        rtc.attach_alarm(callback);
        self.state
            .borrow_mut()
            .wake_sources
            .register(WakeSource::RtcAlarm)
    }

    fn attach_interrupt_wakeup(
        &mut self,
        pin: i32,
        callback: WakeCallback,
        edge: Edge,
        depth: SleepDepth,
    ) -> Result<(), PowerError> {
        let mut s = self.state.borrow_mut();
        s.calls.push(Call::AttachWake(pin, edge, depth));
        if !s.power_begun {
            return Err(PowerError::NotInitialised);
        }
        s.pin_wakes.push((pin, callback));
        s.wake_sources.register(WakeSource::Pin { pin, edge, depth })
    }

    fn deep_sleep(&mut self) -> Result<(), PowerError> {
        let mut s = self.state.borrow_mut();
        s.calls.push(Call::DeepSleep);
        if !s.power_begun {
            return Err(PowerError::NotInitialised);
        }
        s.sleep(&self.latch);
        Ok(())
    }
}

// ── Delay ─────────────────────────────────────────────────────

pub struct MockDelay {
    state: Shared,
    latch: Rc<WakeLatch>,
    sub_ms_ns: u32,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        let total = u64::from(self.sub_ms_ns) + u64::from(ns);
        self.sub_ms_ns = (total % 1_000_000) as u32;
        let mut s = self.state.borrow_mut();
        let target = s.now_ms + total / 1_000_000;
        s.advance_awake(target, &self.latch);
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut s = self.state.borrow_mut();
        let target = s.now_ms + u64::from(ms);
        s.advance_awake(target, &self.latch);
    }
}

// ── Event sink ────────────────────────────────────────────────

/// Records every event with the virtual time it was emitted at.
pub struct RecordingSink {
    state: Shared,
    pub events: Vec<(u64, AppEvent)>,
}

impl RecordingSink {
    /// Time of the `n`th (0-based) occurrence of `event`.
    pub fn time_of(&self, event: &AppEvent, n: usize) -> Option<u64> {
        self.events
            .iter()
            .filter(|(_, e)| e == event)
            .nth(n)
            .map(|(t, _)| *t)
    }

    /// Display text of the status lines, in order.
    pub fn status_lines(&self) -> Vec<String> {
        self.events
            .iter()
            .filter(|(_, e)| e.is_status())
            .map(|(_, e)| e.to_string())
            .collect()
    }

    pub fn faults(&self) -> usize {
        self.events
            .iter()
            .filter(|(_, e)| matches!(e, AppEvent::Fault(_)))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        let t = self.state.borrow().now_ms;
        self.events.push((t, *event));
    }
}

// ── Board assembly ────────────────────────────────────────────

pub type SimWorker<'a, P = MockLed> = Worker<'a, P, MockGpio, MockRtc, MockLowPower, MockDelay>;

/// Test fixture owning the shared state and the wake latch.
pub struct Sim {
    pub state: Shared,
    pub latch: Rc<WakeLatch>,
}

#[allow(dead_code)]
impl Sim {
    pub fn new() -> Self {
        let state = SimState {
            button_pin: DemoConfig::default().button_gpio,
            ..SimState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            latch: Rc::new(WakeLatch::new()),
        }
    }

    pub fn inject(&self, fault: Fault) -> &Self {
        self.state.borrow_mut().faults.insert(fault);
        self
    }

    /// Schedule a button edge at absolute virtual time `at_ms`.
    pub fn press_button_at(&self, at_ms: u64) -> &Self {
        let mut s = self.state.borrow_mut();
        s.button_edges.push_back(at_ms);
        s.button_edges.make_contiguous().sort_unstable();
        self
    }

    pub fn sink(&self) -> RecordingSink {
        RecordingSink {
            state: Rc::clone(&self.state),
            events: Vec::new(),
        }
    }

    fn parts(&self) -> (MockGpio, MockRtc, MockLowPower, MockDelay) {
        (
            MockGpio(Rc::clone(&self.state)),
            MockRtc {
                state: Rc::clone(&self.state),
            },
            MockLowPower {
                state: Rc::clone(&self.state),
                latch: Rc::clone(&self.latch),
            },
            MockDelay {
                state: Rc::clone(&self.state),
                latch: Rc::clone(&self.latch),
                sub_ms_ns: 0,
            },
        )
    }

    pub fn worker(&self, config: DemoConfig) -> SimWorker<'_> {
        let (gpio, rtc, power, delay) = self.parts();
        let board = Board::new(MockLed(Rc::clone(&self.state)), gpio, rtc, power, delay);
        Worker::new(config, board, &self.latch)
    }

    pub fn flaky_worker(&self, config: DemoConfig) -> SimWorker<'_, FlakyLed> {
        let (gpio, rtc, power, delay) = self.parts();
        let board = Board::new(FlakyLed(Rc::clone(&self.state)), gpio, rtc, power, delay);
        Worker::new(config, board, &self.latch)
    }

    pub fn now_ms(&self) -> u64 {
        self.state.borrow().now_ms
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn led_history(&self) -> Vec<(u64, bool)> {
        self.state.borrow().led_history.clone()
    }

    pub fn sleeps(&self) -> Vec<(u64, u64)> {
        self.state.borrow().sleeps.clone()
    }

    pub fn stuck(&self) -> bool {
        self.state.borrow().stuck
    }

    pub fn epoch(&self) -> u32 {
        self.state.borrow().epoch()
    }

    pub fn alarm(&self) -> Option<u32> {
        self.state.borrow().alarm
    }
}
