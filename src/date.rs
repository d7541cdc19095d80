use std::fmt;
use std::str::FromStr;
use time::{Date, Month, OffsetDateTime};

/// Calendar day in Hacker News' unpadded "Y-M-D" form (e.g. `2023-1-5`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayDate(Date);

impl DayDate {
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, String> {
        let month = Month::try_from(month).map_err(|_| "month must be 1..=12".to_string())?;
        Date::from_calendar_date(year, month, day).map(Self).map_err(|e| e.to_string())
    }
    pub fn today_utc() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }
    pub fn next(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }
    pub fn year(self) -> i32 {
        self.0.year()
    }
    pub fn month(self) -> u8 {
        self.0.month() as u8
    }
    pub fn day(self) -> u8 {
        self.0.day()
    }
}

impl fmt::Display for DayDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.year(), self.month(), self.day())
    }
}

impl FromStr for DayDate {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<_> = s.trim().split('-').collect();
        if parts.len() != 3 {
            return Err(format!("expected Y-M-D, got {s:?}"));
        }
        let year: i32 = parts[0].parse().map_err(|_| "invalid year")?;
        let month: u8 = parts[1].parse().map_err(|_| "invalid month")?;
        let day: u8 = parts[2].parse().map_err(|_| "invalid day")?;
        Self::new(year, month, day)
    }
}

/// Inclusive iteration from `start` to `end` (if `start` <= `end`), else empty.
pub fn iter_days(start: DayDate, end: DayDate) -> impl Iterator<Item = DayDate> {
    let mut curr = if start <= end { Some(start) } else { None };
    std::iter::from_fn(move || {
        let ret = curr?;
        curr = ret.next().filter(|n| *n <= end);
        Some(ret)
    })
}

/// Dataset name covering a range of days.
pub fn range_name(start: DayDate, end: DayDate) -> String {
    format!("{start}to{end}")
}

/// Split the inclusive range into consecutive chunks of at most `days` days.
pub fn chunk_days(start: DayDate, end: DayDate, days: usize) -> Vec<Vec<DayDate>> {
    let all: Vec<DayDate> = iter_days(start, end).collect();
    all.chunks(days.max(1)).map(<[DayDate]>::to_vec).collect()
}

