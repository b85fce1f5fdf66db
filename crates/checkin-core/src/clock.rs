//! Day-index arithmetic.
//!
//! A day index is `floor(unix_seconds / 86_400)`, i.e. whole days since the
//! Unix epoch in UTC. The ledger program computes the same value from its
//! own clock, so "once per day" is independent of the caller's time zone.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDate, Utc};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Sentinel stored on-chain for "never checked in".
pub const NEVER: i64 = -1;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;

    fn today(&self) -> i64 {
        day_index(self.now_unix())
    }
}

/// Wall-clock time from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_unix: i64) -> Self {
        Self {
            now: AtomicI64::new(now_unix),
        }
    }

    pub fn set(&self, now_unix: i64) {
        self.now.store(now_unix, Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i64) {
        self.now.fetch_add(days * SECONDS_PER_DAY, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub fn day_index(unix_seconds: i64) -> i64 {
    unix_seconds.div_euclid(SECONDS_PER_DAY)
}

/// UTC midnight at the start of `day`.
pub fn day_start(day: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(day.checked_mul(SECONDS_PER_DAY)?, 0)
}

pub fn day_date(day: i64) -> Option<NaiveDate> {
    day_start(day).map(|dt| dt.date_naive())
}
