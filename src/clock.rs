use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of "now" for everything that expires, is due, or gets timestamped.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// Pinned to one calendar day. Every `now()` call advances one second past noon so
/// creation timestamps still order deterministically.
pub struct FixedClock {
    today: NaiveDate,
    ticks: AtomicI64,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        FixedClock {
            today,
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        let noon = self.today.and_hms_opt(12, 0, 0).unwrap_or_default();
        noon + Duration::seconds(tick)
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}
