use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::timesheet::LoginLog;

pub const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

pub const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// The month on display, navigable within one year either side of the
/// year it was opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCursor {
    pub year: i32,
    /// 1-based.
    pub month: u32,
    pub min_year: i32,
    pub max_year: i32,
}

impl MonthCursor {
    pub fn around(today: NaiveDate) -> Self {
        Self {
            year: today.year(),
            month: today.month(),
            min_year: today.year() - 1,
            max_year: today.year() + 1,
        }
    }

    /// Moves to `year`/`month` if both are in range.
    pub fn seek(self, year: i32, month: u32) -> Option<Self> {
        if !(self.min_year..=self.max_year).contains(&year) || !(1..=12).contains(&month) {
            return None;
        }
        Some(Self {
            year,
            month,
            ..self
        })
    }

    /// January of the earliest year stays put.
    pub fn prev_month(mut self) -> Self {
        if self.month == 1 && self.year > self.min_year {
            self.year -= 1;
            self.month = 12;
        } else if self.month > 1 {
            self.month -= 1;
        }
        self
    }

    /// December of the latest year stays put.
    pub fn next_month(mut self) -> Self {
        if self.month == 12 && self.year < self.max_year {
            self.year += 1;
            self.month = 1;
        } else if self.month < 12 {
            self.month += 1;
        }
        self
    }

    pub fn prev_year(mut self) -> Self {
        if self.year > self.min_year {
            self.year -= 1;
        }
        self
    }

    pub fn next_year(mut self) -> Self {
        if self.year < self.max_year {
            self.year += 1;
        }
        self
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month as usize).saturating_sub(1) % 12]
    }

    pub fn grid(&self) -> Vec<Option<NaiveDate>> {
        month_grid(self.year, self.month).unwrap_or_default()
    }
}

/// Sunday-first month layout: one `None` per leading blank cell, then every
/// day of the month. `None` for an invalid year/month.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<Option<NaiveDate>>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    let offset = first.weekday().num_days_from_sunday() as usize;

    let mut cells = vec![None; offset];
    cells.extend(first.iter_days().take_while(|d| *d < next).map(Some));
    Some(cells)
}

pub fn is_today(date: NaiveDate, today: NaiveDate) -> bool {
    date == today
}

/// Only days up to today have a log worth showing.
pub fn can_hover(date: NaiveDate, today: NaiveDate) -> bool {
    date <= today
}

/// Calendar day (UTC) of a backend timestamp. Accepts RFC 3339 and the
/// backend's `YYYY-MM-DD HH:MM:SS`, the latter taken as UTC.
pub fn utc_day(timestamp: &str) -> Option<NaiveDate> {
    let timestamp = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.naive_utc().date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(timestamp.get(..10)?, "%Y-%m-%d").ok()
}

/// The log to show for a hovered day: the latest log, if it was opened that day.
pub fn log_for_day(latest: Option<LoginLog>, day: NaiveDate) -> Option<LoginLog> {
    latest.filter(|log| utc_day(&log.login_time) == Some(day))
}
