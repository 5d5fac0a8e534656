//! Wall-clock source
//!
//! The access gate and the audit log both need local time. Tests pin it
//! with [`FixedClock`].

use chrono::{Local, NaiveDateTime, Timelike};

/// Source of the current local date and time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Current local hour, 0..=23
    fn hour(&self) -> u8 {
        self.now().hour() as u8
    }
}

/// Local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock stuck at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Fixed clock at `hour:00:00` on 2024-01-01
    pub fn at_hour(hour: u32) -> Self {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(hour.min(23), 0, 0))
            .unwrap_or_default();
        FixedClock(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
