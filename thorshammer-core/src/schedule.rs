//! Once-a-day wall-clock trigger.

use chrono::{Days, NaiveDateTime, NaiveTime};

/// Recurring trigger that fires once per calendar day at `at` (local time).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
    next_due: NaiveDateTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime, now: NaiveDateTime) -> Self {
        Self { at, next_due: next_occurrence_after(at, now) }
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    pub fn next_due(&self) -> NaiveDateTime {
        self.next_due
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.next_due
    }

    /// Re-arm for the next occurrence strictly after `now`.
    pub fn rearm(&mut self, now: NaiveDateTime) {
        self.next_due = next_occurrence_after(self.at, now);
    }
}

/// First `at` strictly after `now`: later today, otherwise tomorrow.
pub fn next_occurrence_after(at: NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        // NaiveDate overflow is only reachable at the end of the calendar.
        now.date().checked_add_days(Days::new(1)).unwrap_or(now.date()).and_time(at)
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S").or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
}
