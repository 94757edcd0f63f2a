//! Journal entry domain model

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Maximum title length, in characters
pub const MAX_TITLE_LEN: usize = 200;

/// Years the store can write and read back as plain `YYYY-MM-DD`
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// A dated journal entry belonging to one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    /// Set on insert, never rewritten
    pub owner_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// Whether title, body or date differ from the given values
    pub fn differs_from(&self, title: &str, date: NaiveDate, body: &str) -> bool {
        self.title != title || self.body != body || self.date != date
    }
}

/// Fields of an entry that has not been stored yet
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub title: String,
    pub date: NaiveDate,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewEntry {
    /// Validate and normalize user input, stamping both timestamps with now
    pub fn new(title: &str, date: impl CalendarDay, body: &str) -> Result<Self> {
        let title = normalize_title(title)?;
        if title.is_empty() {
            return Err(Error::validation("title is required"));
        }
        let date = check_day(date.calendar_day())?;
        let now = timestamp_now();
        Ok(Self {
            title,
            date,
            body: body.trim().to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Anything that can be reduced to a calendar day.
///
/// Time-of-day is dropped; zoned values use their local date.
pub trait CalendarDay {
    fn calendar_day(&self) -> NaiveDate;
}

impl CalendarDay for NaiveDate {
    fn calendar_day(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDay for NaiveDateTime {
    fn calendar_day(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CalendarDay for DateTime<Tz> {
    fn calendar_day(&self) -> NaiveDate {
        self.date_naive()
    }
}

/// Trim a title and enforce the length limit
pub fn normalize_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(Error::validation(format!(
            "title is {} characters, maximum is {}",
            len, MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

/// Reject days outside `YEAR_RANGE`
pub fn check_day(date: NaiveDate) -> Result<NaiveDate> {
    if !YEAR_RANGE.contains(&date.year()) {
        return Err(Error::validation(format!(
            "date {} is outside years {}-{}",
            date,
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        )));
    }
    Ok(date)
}

/// Current time at the precision the store keeps (microseconds)
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
