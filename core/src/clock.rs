//! Business clock. Owns the business time zone and the calculation date.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, PartialEq)]
pub struct BusinessClock {
    pub tz:     Tz,
    pub pinned: Option<NaiveDate>,
}

impl BusinessClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz, pinned: None }
    }

    /// A clock frozen at `date`. Used by tests and replays of past days.
    pub fn pinned(tz: Tz, date: NaiveDate) -> Self {
        Self { tz, pinned: Some(date) }
    }

    /// The business date "today" in the configured zone.
    pub fn today(&self) -> NaiveDate {
        match self.pinned {
            Some(date) => date,
            None       => Utc::now().with_timezone(&self.tz).date_naive(),
        }
    }

    pub fn yesterday(&self) -> NaiveDate {
        self.today() - Duration::days(1)
    }

    /// Wall-clock timestamp in the business zone, for ledger entries.
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}
