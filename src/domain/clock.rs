//! Trading-timezone clock.
//!
//! Everything time-dependent in the strategies goes through [`Clock`], so tests
//! can pin "now" with [`FixedClock`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use std::cell::Cell;

/// Seoul has no daylight saving, so a fixed offset is exact.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;
pub const DEFAULT_SESSION_SPLIT_HOUR: u32 = 12;

pub trait Clock {
    /// Current instant in the trading timezone.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Local time at which the morning session ends and the afternoon begins.
    fn session_split(&self) -> NaiveTime;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Morning is `[00:00, split)` local time.
    fn is_morning_session(&self) -> bool {
        self.now().time() < self.session_split()
    }

    fn is_afternoon_session(&self) -> bool {
        !self.is_morning_session()
    }
}

pub fn session_split_at(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

pub fn utc_offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
    split: NaiveTime,
}

impl SystemClock {
    pub fn new(offset: FixedOffset, split: NaiveTime) -> Self {
        Self { offset, split }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(
            utc_offset(DEFAULT_UTC_OFFSET_HOURS),
            session_split_at(DEFAULT_SESSION_SPLIT_HOUR),
        )
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    fn session_split(&self) -> NaiveTime {
        self.split
    }
}

/// A clock frozen at a settable instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<FixedOffset>>,
    split: NaiveTime,
}

impl FixedClock {
    /// Instants in another offset are converted into the offset of `at`.
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self {
            now: Cell::new(at),
            split: session_split_at(DEFAULT_SESSION_SPLIT_HOUR),
        }
    }

    /// Local wall-clock time in the default trading offset.
    pub fn at_local(date: NaiveDate, time: NaiveTime) -> Self {
        let offset = utc_offset(DEFAULT_UTC_OFFSET_HOURS);
        let at = offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .unwrap_or_else(|| date.and_time(time).and_utc().with_timezone(&offset));
        Self::new(at)
    }

    pub fn with_split(mut self, split: NaiveTime) -> Self {
        self.split = split;
        self
    }

    pub fn set(&self, at: DateTime<FixedOffset>) {
        let offset = *self.now.get().offset();
        self.now.set(at.with_timezone(&offset));
    }

    pub fn set_local(&self, date: NaiveDate, time: NaiveTime) {
        let offset = *self.now.get().offset();
        if let Some(at) = offset.from_local_datetime(&date.and_time(time)).single() {
            self.now.set(at);
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now.get()
    }

    fn session_split(&self) -> NaiveTime {
        self.split
    }
}
