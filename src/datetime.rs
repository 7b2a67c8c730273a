//! Calendar date/time as the RTC sees it, and conversion to epoch seconds.
//!
//! Years are stored the way RTC calendar registers hold them: two digits,
//! `0..=99` meaning 2000–2099.  Epoch values are seconds since
//! 1970-01-01T00:00:00Z; anything before 2000-01-01 is treated as an
//! unsynced clock.

use crate::error::RtcError;

/// 2000-01-01T00:00:00Z.
pub const EPOCH_2000: u32 = 946_684_800;

const SECS_PER_DAY: u32 = 86_400;

/// Broken-down RTC calendar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtcDateTime {
    /// Two-digit year, `0..=99` → 2000–2099.
    pub year: u8,
    /// `1..=12`
    pub month: u8,
    /// `1..=days_in_month`
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl RtcDateTime {
    /// Midnight, 2000-01-01 — what an unsynced RTC reads.
    pub const BASE: Self = Self {
        year: 0,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Build and validate a calendar value.
    pub fn new(
        year: u8,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, RtcError> {
        let dt = Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        };
        dt.validate()?;
        Ok(dt)
    }

    /// Replace the time-of-day fields, keeping the date.
    pub fn with_time(self, hour: u8, minute: u8, second: u8) -> Result<Self, RtcError> {
        Self::new(self.year, self.month, self.day, hour, minute, second)
    }

    /// Replace the date fields, keeping the time of day.
    ///
    /// Argument order follows the RTC driver convention: day, month, year.
    pub fn with_date(self, day: u8, month: u8, year: u8) -> Result<Self, RtcError> {
        Self::new(year, month, day, self.hour, self.minute, self.second)
    }

    /// Full four-digit year.
    pub fn full_year(&self) -> u32 {
        2000 + u32::from(self.year)
    }

    pub fn validate(&self) -> Result<(), RtcError> {
        if self.year > 99
            || !(1..=12).contains(&self.month)
            || self.day == 0
            || self.day > days_in_month(self.full_year(), self.month)
            || self.hour > 23
            || self.minute > 59
            || self.second > 59
        {
            return Err(RtcError::InvalidDateTime);
        }
        Ok(())
    }

    /// Seconds since the Unix epoch.
    pub fn to_epoch(&self) -> u32 {
        let days = days_from_civil(self.full_year() as i64, self.month as u32, self.day as u32);
        let secs_of_day =
            u32::from(self.hour) * 3600 + u32::from(self.minute) * 60 + u32::from(self.second);
        days as u32 * SECS_PER_DAY + secs_of_day
    }

    /// Break an epoch value down.  `None` before 2000-01-01 or after 2099.
    pub fn from_epoch(epoch: u32) -> Option<Self> {
        if epoch < EPOCH_2000 {
            return None;
        }
        let days = (epoch / SECS_PER_DAY) as i64;
        let secs = epoch % SECS_PER_DAY;
        let (y, m, d) = civil_from_days(days);
        if y > 2099 {
            return None;
        }
        Some(Self {
            year: (y - 2000) as u8,
            month: m as u8,
            day: d as u8,
            hour: (secs / 3600) as u8,
            minute: (secs % 3600 / 60) as u8,
            second: (secs % 60) as u8,
        })
    }

    /// Like [`from_epoch`](Self::from_epoch) but falls back to [`BASE`](Self::BASE)
    /// for an unsynced clock.
    pub fn from_epoch_or_base(epoch: u32) -> Self {
        Self::from_epoch(epoch).unwrap_or(Self::BASE)
    }
}

impl core::fmt::Display for RtcDateTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.full_year(),
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second
        )
    }
}

pub fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: u32, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

// Howard Hinnant's civil-calendar algorithms (proleptic Gregorian).

fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let mp = (m as i64 + 9) % 12;
    let doy = (153 * mp + 2) / 5 + d as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let y = yoe + era * 400 + i64::from(m <= 2);
    (y, m, d)
}
