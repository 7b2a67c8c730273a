//! Application worker — the blink / sleep duty cycle.
//!
//! [`Worker`] owns the board's peripherals for the lifetime of the worker
//! thread and walks this sequence:
//!
//! ```text
//!  Booting ──▶ Arming ──▶ Awake ──▶ Sleeping ─┐
//!                           ▲                 │ deep_sleep() returns
//!                           └─────────────────┘
//! ```
//!
//! - **Booting**: print the start banner, wait for the host to settle.
//! - **Arming** (once): pins, button interrupt, RTC start value, low-power
//!   controller, both wake sources, first alarm.
//! - **Awake**: LED on, wait.
//! - **Sleeping**: LED off, wait, apply the alarm policy, block in
//!   `deep_sleep()` until the alarm or the button fires.
//!
//! Peripheral failures never stop the sequence.  Each one is logged,
//! emitted as [`AppEvent::Fault`], and the next step runs anyway.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, warn};

use crate::config::{AlarmMode, DemoConfig};
use crate::drivers::led::Led;
use crate::error::Error;
use crate::wake::{WakeLatch, WakeReason, on_alarm_wakeup, on_button_press};

use super::events::AppEvent;
use super::ports::{Edge, EventSink, GpioPort, LowPowerPort, PinMode, RtcPort, SleepDepth};

/// Arming has ten fallible steps.
pub const MAX_ARM_FAULTS: usize = 10;

/// Where the worker is in its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Booting,
    Arming,
    Awake,
    Sleeping,
}

/// Outcome of [`Worker::arm`].
#[derive(Debug, Clone)]
pub struct ArmReport {
    /// Deadline of the first alarm, `None` if programming it failed.
    pub alarm_epoch: Option<u32>,
    /// Every step that failed, in execution order.
    pub faults: heapless::Vec<Error, MAX_ARM_FAULTS>,
}

impl ArmReport {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Every peripheral the worker drives.
pub struct Board<P, G, R, L, D> {
    pub led: Led<P>,
    pub gpio: G,
    pub rtc: R,
    pub power: L,
    pub delay: D,
}

impl<P, G, R, L, D> Board<P, G, R, L, D>
where
    P: OutputPin,
    G: GpioPort,
    R: RtcPort,
    L: LowPowerPort,
    D: DelayNs,
{
    pub fn new(led_pin: P, gpio: G, rtc: R, power: L, delay: D) -> Self {
        Self {
            led: Led::new(led_pin),
            gpio,
            rtc,
            power,
            delay,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Worker
// ───────────────────────────────────────────────────────────────

pub struct Worker<'a, P, G, R, L, D> {
    config: DemoConfig,
    board: Board<P, G, R, L, D>,
    latch: &'a WakeLatch,
    phase: Phase,
    cycles: u32,
    last_wake: Option<WakeReason>,
}

impl<'a, P, G, R, L, D> Worker<'a, P, G, R, L, D>
where
    P: OutputPin,
    G: GpioPort,
    R: RtcPort,
    L: LowPowerPort,
    D: DelayNs,
{
    pub fn new(config: DemoConfig, board: Board<P, G, R, L, D>, latch: &'a WakeLatch) -> Self {
        Self {
            config,
            board,
            latch,
            phase: Phase::Booting,
            cycles: 0,
            last_wake: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Thread entry: boot, arm, then duty-cycle forever.
    pub fn run(mut self, sink: &mut impl EventSink) -> ! {
        self.boot(sink);
        let report = self.arm(sink);
        if !report.is_clean() {
            warn!(
                "Arming finished with {} fault(s); continuing",
                report.faults.len()
            );
        }
        loop {
            self.cycle(sink);
        }
    }

    /// Print the start banner and wait for the host side to settle.
    pub fn boot(&mut self, sink: &mut impl EventSink) {
        self.phase = Phase::Booting;
        sink.emit(&AppEvent::ThreadStarted);
        self.board.delay.delay_ms(self.config.boot_delay_ms);
    }

    /// Configure peripherals and wake sources, program the first alarm.
    pub fn arm(&mut self, sink: &mut impl EventSink) -> ArmReport {
        self.phase = Phase::Arming;
        let mut faults = heapless::Vec::new();
        let led = self.config.led_gpio;
        let button = self.config.button_gpio;
        let board = &mut self.board;

        let r = board.gpio.pin_mode(led, PinMode::Output);
        record(&mut faults, sink, "led pin mode", r);

        let r = board.gpio.pin_mode(button, PinMode::InputPullUp);
        record(&mut faults, sink, "button pin mode", r);

        let r = board.gpio.attach_interrupt(button, on_button_press, Edge::Change);
        record(&mut faults, sink, "button interrupt", r);

        let r = board.rtc.begin();
        record(&mut faults, sink, "rtc begin", r);

        let (hour, minute, second) = self.config.initial_time;
        let r = board.rtc.set_time(hour, minute, second);
        record(&mut faults, sink, "rtc set_time", r);

        let (day, month, year) = self.config.initial_date;
        let r = board.rtc.set_date(day, month, year);
        record(&mut faults, sink, "rtc set_date", r);

        let r = board.power.begin();
        record(&mut faults, sink, "low-power begin", r);

        let r = board
            .power
            .enable_wakeup_from_rtc(&mut board.rtc, on_alarm_wakeup);
        record(&mut faults, sink, "rtc wake source", r);

        let r = board
            .power
            .attach_interrupt_wakeup(button, on_button_press, Edge::Change, SleepDepth::Deep);
        record(&mut faults, sink, "button wake source", r);

        let deadline = board.rtc.epoch().saturating_add(self.config.alarm_offset_secs);
        let r = board.rtc.set_alarm_epoch(deadline);
        let alarm_epoch = r.is_ok().then_some(deadline);
        record(&mut faults, sink, "first alarm", r);

        sink.emit(&AppEvent::Armed { alarm_epoch });
        ArmReport {
            alarm_epoch,
            faults,
        }
    }

    /// One full duty cycle: awake phase, then sleeping phase.
    pub fn cycle(&mut self, sink: &mut impl EventSink) -> Option<WakeReason> {
        self.awake(sink);
        self.sleep(sink)
    }

    /// LED on for `awake_ms`.
    pub fn awake(&mut self, sink: &mut impl EventSink) {
        self.phase = Phase::Awake;
        sink.emit(&AppEvent::Running);
        let r = self.board.led.on();
        report(sink, "led on", r);
        self.board.delay.delay_ms(self.config.awake_ms);
    }

    /// LED off for `pre_sleep_ms`, then block until a wake source fires.
    ///
    /// Returns the reason recorded by the wake callbacks while asleep.
    pub fn sleep(&mut self, sink: &mut impl EventSink) -> Option<WakeReason> {
        self.phase = Phase::Sleeping;
        sink.emit(&AppEvent::Sleeping);
        let r = self.board.led.off();
        report(sink, "led off", r);
        self.board.delay.delay_ms(self.config.pre_sleep_ms);

        // Anything recorded while awake is not a reason for this wakeup.
        self.latch.clear();

        if self.config.alarm_mode == AlarmMode::RearmOnSleep {
            let deadline = self
                .board
                .rtc
                .epoch()
                .saturating_add(self.config.alarm_offset_secs);
            let r = self.board.rtc.set_alarm_epoch(deadline);
            if report(sink, "alarm re-arm", r) {
                debug!("Alarm re-armed for epoch {}", deadline);
            }
        }

        let r = self.board.power.deep_sleep();
        report(sink, "deep sleep", r);

        let reason = self.latch.take();
        self.cycles = self.cycles.wrapping_add(1);
        self.last_wake = reason;
        sink.emit(&AppEvent::Woke(reason));
        reason
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed sleep cycles.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn led_is_on(&self) -> bool {
        self.board.led.is_on()
    }

    pub fn last_wake(&self) -> Option<WakeReason> {
        self.last_wake
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    pub fn board(&self) -> &Board<P, G, R, L, D> {
        &self.board
    }
}

// ── Internal ──────────────────────────────────────────────────

/// Log and emit a failed step.  Returns `true` if the step succeeded.
fn report<E: Into<Error>>(sink: &mut impl EventSink, step: &str, result: Result<(), E>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            let e = e.into();
            warn!("{} failed: {}", step, e);
            sink.emit(&AppEvent::Fault(e));
            false
        }
    }
}

fn record<E: Into<Error>>(
    faults: &mut heapless::Vec<Error, MAX_ARM_FAULTS>,
    sink: &mut impl EventSink,
    step: &str,
    result: Result<(), E>,
) {
    if let Err(e) = result {
        let e = e.into();
        let _ = faults.push(e);
        report::<Error>(sink, step, Err(e));
    }
}
