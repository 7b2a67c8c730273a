//! Low-power adapter: light sleep with RTC-timer and GPIO wakeups.
//!
//! ESP-IDF deep sleep resets the chip, so it cannot return to the caller.
//! `deep_sleep()` therefore enters light sleep, the deepest mode that
//! resumes execution after the call with RAM and the worker stack intact.
//!
//! ## Sleep sequence
//!
//! 1. Program the sleep timer from the pending RTC alarm (if registered).
//! 2. Mask each registered pin's interrupt and program a level wakeup
//!    opposite to its current level, so any change wakes the chip.
//! 3. `esp_light_sleep_start()`.
//! 4. Dispatch the wakeup cause to the registered callbacks, then restore
//!    and unmask the edge interrupts.

use esp_idf_svc::sys::*;
use log::{debug, info, warn};

use crate::app::ports::{Edge, LowPowerPort, RtcPort, SleepDepth};
use crate::error::{GpioError, PowerError};
use crate::wake::{
    TimerPlan, WakeCallback, WakeLevel, WakeSource, WakeSourceSet, wake_level,
};

use super::{gpio, rtc};

#[derive(Debug, Default)]
pub struct EspLowPower {
    initialised: bool,
    sources: WakeSourceSet,
}

impl EspLowPower {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_initialised(&self) -> Result<(), PowerError> {
        if self.initialised {
            Ok(())
        } else {
            Err(PowerError::NotInitialised)
        }
    }

    /// Returns `false` if the alarm is already due and was fired instead.
    fn arm_timer_wakeup(&self) -> Result<bool, PowerError> {
        let secs = match rtc::alarm_plan() {
            TimerPlan::Idle => return Ok(true),
            TimerPlan::FireNow => {
                rtc::stop_alarm_timer();
                rtc::fire_alarm();
                return Ok(false);
            }
            TimerPlan::WakeIn(secs) => secs,
        };
        // SAFETY: plain configuration call, no pointers involved.
        let ret = unsafe { esp_sleep_enable_timer_wakeup(u64::from(secs) * 1_000_000) };
        if ret != ESP_OK as i32 {
            return Err(PowerError::WakeupConfigFailed(ret));
        }
        debug!("power: timer wakeup in {}s", secs);
        Ok(true)
    }

    fn arm_pin_wakeups(&self) -> Result<(), PowerError> {
        for (pin, edge, _) in self.sources.pins() {
            // SAFETY: pins were validated when their interrupt was attached;
            // gpio_get_level is a register read.
            let high = unsafe { gpio_get_level(pin) } != 0;
            let level = match wake_level(edge, high) {
                WakeLevel::High => gpio_int_type_t_GPIO_INTR_HIGH_LEVEL,
                WakeLevel::Low => gpio_int_type_t_GPIO_INTR_LOW_LEVEL,
            };
            // The wakeup turns the pin level-triggered; with the interrupt
            // still enabled it would re-fire until the level drops.  The
            // wake is delivered by `dispatch_wakeup` instead.
            // SAFETY: as above.
            unsafe { gpio_intr_disable(pin) };
            // SAFETY: as above.
            let ret = unsafe { gpio_wakeup_enable(pin, level) };
            if ret != ESP_OK as i32 {
                return Err(PowerError::WakeupConfigFailed(ret));
            }
        }
        if self.sources.pins().next().is_some() {
            // SAFETY: plain configuration call.
            let ret = unsafe { esp_sleep_enable_gpio_wakeup() };
            if ret != ESP_OK as i32 {
                return Err(PowerError::WakeupConfigFailed(ret));
            }
        }
        Ok(())
    }

    /// Undo the per-sleep wakeup configuration and restore edge interrupts.
    fn disarm(&self) {
        // SAFETY: disabling wake sources and level wakeups is always valid.
        unsafe {
            esp_sleep_disable_wakeup_source(esp_sleep_source_t_ESP_SLEEP_WAKEUP_ALL);
            for (pin, edge, _) in self.sources.pins() {
                gpio_wakeup_disable(pin);
                gpio_set_intr_type(pin, gpio::intr_type(edge));
                gpio_intr_enable(pin);
            }
        }
    }

    #[allow(non_upper_case_globals)]
    fn dispatch_wakeup(&self) {
        // SAFETY: reads the cause latched by the sleep controller.
        let cause = unsafe { esp_sleep_get_wakeup_cause() };
        match cause {
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER => {
                rtc::stop_alarm_timer();
                rtc::fire_alarm();
            }
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_GPIO => {
                for (pin, _, _) in self.sources.pins() {
                    gpio::fire_pin_handler(pin);
                }
            }
            other => debug!("power: woke with cause {}", other),
        }
    }
}

impl LowPowerPort for EspLowPower {
    fn begin(&mut self) -> Result<(), PowerError> {
        if !self.initialised {
            self.initialised = true;
            info!("power: light-sleep controller ready");
        }
        Ok(())
    }

    fn enable_wakeup_from_rtc<R: RtcPort>(
        &mut self,
        rtc: &mut R,
        callback: WakeCallback,
    ) -> Result<(), PowerError> {
        self.ensure_initialised()?;
        rtc.attach_alarm(callback);
        self.sources.register(WakeSource::RtcAlarm)
    }

    fn attach_interrupt_wakeup(
        &mut self,
        pin: i32,
        callback: WakeCallback,
        edge: Edge,
        depth: SleepDepth,
    ) -> Result<(), PowerError> {
        self.ensure_initialised()?;
        gpio::attach_isr(pin, callback, edge).map_err(|e| {
            warn!("power: wake pin GPIO{} not attached: {}", pin, e);
            match e {
                GpioError::IsrAttachFailed(rc) | GpioError::ConfigFailed(rc) => {
                    PowerError::WakeupConfigFailed(rc)
                }
                _ => PowerError::WakeupConfigFailed(ESP_ERR_INVALID_ARG as i32),
            }
        })?;
        self.sources.register(WakeSource::Pin { pin, edge, depth })
    }

    fn deep_sleep(&mut self) -> Result<(), PowerError> {
        self.ensure_initialised()?;

        if self.sources.has_rtc_alarm() && !self.arm_timer_wakeup()? {
            // Alarm already due: the callback ran, no need to sleep.
            return Ok(());
        }
        if let Err(e) = self.arm_pin_wakeups() {
            self.disarm();
            rtc::resume_alarm_timer();
            return Err(e);
        }
        if self.sources.has_rtc_alarm() {
            rtc::stop_alarm_timer();
        }

        // SAFETY: blocks until a wake source fires; all Rust state stays in
        // retained RAM.
        let ret = unsafe { esp_light_sleep_start() };
        if ret != ESP_OK as i32 {
            self.disarm();
            rtc::resume_alarm_timer();
            return Err(PowerError::SleepRejected(ret));
        }

        self.dispatch_wakeup();
        self.disarm();
        rtc::resume_alarm_timer();
        Ok(())
    }
}
