//! RTC adapter: calendar time on the RTC-backed system clock plus a
//! one-shot alarm.
//!
//! The alarm has two halves:
//!
//! - while awake, an `esp_timer` one-shot fires the alarm callback from the
//!   timer task;
//! - while asleep, [`EspLowPower`](super::low_power::EspLowPower) programs
//!   the sleep timer from [`alarm_plan`] and calls
//!   [`fire_alarm`] after a timer wakeup.
//!
//! Both halves go through [`fire_alarm`], which claims the pending
//! deadline first, so the callback runs at most once per armed alarm.

use core::ffi::c_void;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use esp_idf_svc::sys::*;
use log::{debug, info, warn};

use crate::app::ports::RtcPort;
use crate::datetime::RtcDateTime;
use crate::error::RtcError;
use crate::wake::{HandlerSlot, PendingAlarm, TimerPlan, WakeCallback, timer_plan};

use super::WAKE_LATCH;

static ALARM: PendingAlarm = PendingAlarm::new();
static ALARM_HANDLER: HandlerSlot = HandlerSlot::new();
static ALARM_TIMER: AtomicPtr<esp_timer> = AtomicPtr::new(ptr::null_mut());

unsafe extern "C" fn alarm_timer_cb(_arg: *mut c_void) {
    fire_alarm();
}

/// Fire the alarm callback if an alarm is pending.  Returns whether it ran.
pub(crate) fn fire_alarm() -> bool {
    ALARM.fire(&ALARM_HANDLER, &WAKE_LATCH)
}

/// What to do with the pending alarm if the chip slept now.
pub(crate) fn alarm_plan() -> TimerPlan {
    timer_plan(ALARM.deadline(), now_epoch())
}

/// Stop the awake-side timer (the sleep timer took over).
pub(crate) fn stop_alarm_timer() {
    let timer = ALARM_TIMER.load(Ordering::Acquire);
    if !timer.is_null() {
        // SAFETY: the handle was created by `EspRtc::begin` and is never
        // deleted.  Stopping an idle timer returns ESP_ERR_INVALID_STATE.
        unsafe { esp_timer_stop(timer) };
    }
}

/// Restart the awake-side timer after a wakeup that left the alarm pending.
pub(crate) fn resume_alarm_timer() {
    if ALARM.deadline().is_some() {
        if let Err(e) = schedule_timer() {
            warn!("rtc: alarm timer not resumed: {}", e);
        }
    }
}

fn now_epoch() -> u32 {
    let mut tv = timeval {
        tv_sec: 0,
        tv_usec: 0,
    };
    // SAFETY: tv is a valid out-pointer; a null timezone is allowed.
    unsafe { gettimeofday(&mut tv, ptr::null_mut()) };
    u32::try_from(tv.tv_sec).unwrap_or(0)
}

fn write_epoch(epoch: u32) -> Result<(), RtcError> {
    let tv = timeval {
        tv_sec: epoch as _,
        tv_usec: 0,
    };
    // SAFETY: tv is a valid in-pointer; a null timezone is allowed.
    let ret = unsafe { settimeofday(&tv, ptr::null()) };
    if ret != 0 {
        return Err(RtcError::NotRunning);
    }
    Ok(())
}

/// (Re)start the awake-side timer for the pending deadline.
fn schedule_timer() -> Result<(), RtcError> {
    let timer = ALARM_TIMER.load(Ordering::Acquire);
    if timer.is_null() {
        return Err(RtcError::NotRunning);
    }
    stop_alarm_timer();
    let secs = match alarm_plan() {
        TimerPlan::Idle => return Ok(()),
        TimerPlan::FireNow => 1,
        TimerPlan::WakeIn(secs) => secs,
    };
    let micros = u64::from(secs) * 1_000_000;
    // SAFETY: see `stop_alarm_timer`.
    let ret = unsafe { esp_timer_start_once(timer, micros) };
    if ret != ESP_OK as i32 {
        return Err(RtcError::AlarmFailed(ret));
    }
    Ok(())
}

// ── RtcPort ───────────────────────────────────────────────────

/// Handle over the process-wide clock.  Keep one per program.
#[derive(Debug, Default)]
pub struct EspRtc;

impl EspRtc {
    pub fn new() -> Self {
        Self
    }

    fn now(&self) -> RtcDateTime {
        RtcDateTime::from_epoch_or_base(now_epoch())
    }

    fn write(&mut self, dt: RtcDateTime) -> Result<(), RtcError> {
        write_epoch(dt.to_epoch())?;
        info!("rtc: time set to {}", dt);
        // Deadlines are absolute; the timer delay depends on the new time.
        if ALARM.deadline().is_some() {
            schedule_timer()?;
        }
        Ok(())
    }
}

impl RtcPort for EspRtc {
    fn begin(&mut self) -> Result<(), RtcError> {
        if !ALARM_TIMER.load(Ordering::Acquire).is_null() {
            return Ok(());
        }
        let args = esp_timer_create_args_t {
            callback: Some(alarm_timer_cb),
            arg: ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"rtc_alarm\0".as_ptr().cast(),
            skip_unhandled_events: false,
        };
        let mut handle: esp_timer_handle_t = ptr::null_mut();
        // SAFETY: args outlives the call; handle is a valid out-pointer.
        let ret = unsafe { esp_timer_create(&args, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(RtcError::AlarmFailed(ret));
        }
        ALARM_TIMER.store(handle, Ordering::Release);
        debug!("rtc: clock running, now {}", self.now());
        Ok(())
    }

    fn set_time(&mut self, hour: u8, minute: u8, second: u8) -> Result<(), RtcError> {
        let dt = self.now().with_time(hour, minute, second)?;
        self.write(dt)
    }

    fn set_date(&mut self, day: u8, month: u8, year: u8) -> Result<(), RtcError> {
        let dt = self.now().with_date(day, month, year)?;
        self.write(dt)
    }

    fn epoch(&self) -> u32 {
        now_epoch()
    }

    fn set_alarm_epoch(&mut self, epoch: u32) -> Result<(), RtcError> {
        if epoch == 0 {
            return Err(RtcError::InvalidDateTime);
        }
        ALARM.arm(epoch);
        if let Err(e) = schedule_timer() {
            ALARM.disarm();
            warn!("rtc: alarm for epoch {} not armed: {}", epoch, e);
            return Err(e);
        }
        debug!("rtc: alarm armed for epoch {}", epoch);
        Ok(())
    }

    fn alarm_epoch(&self) -> Option<u32> {
        ALARM.deadline()
    }

    fn attach_alarm(&mut self, callback: WakeCallback) {
        ALARM_HANDLER.set(callback);
    }
}
