//! Calendar-month accounting periods.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

/// One calendar month in a fixed time zone.  Day-of-month never matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountingPeriod {
    pub year: i32,
    pub month: u32,
}

impl AccountingPeriod {
    /// The period `instant` falls in, as seen from `tz`.
    pub fn containing(instant: DateTime<Utc>, tz: Tz) -> Self {
        let local = instant.with_timezone(&tz);
        Self {
            year: local.year(),
            month: local.month(),
        }
    }
}

impl fmt::Display for AccountingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
