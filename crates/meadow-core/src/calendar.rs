use std::fmt;

use serde::{Deserialize, Serialize};

/// Seconds per in-world minute.
pub const SECONDS_PER_MINUTE: u64 = 60;
/// Minutes per in-world hour.
pub const MINUTES_PER_HOUR: u64 = 60;
/// Hours per in-world day.
pub const HOURS_PER_DAY: u64 = 24;
/// Days per in-world month.
pub const DAYS_PER_MONTH: u64 = 30;
/// Months per in-world year.
pub const MONTHS_PER_YEAR: u64 = 12;

const SECONDS_PER_HOUR: u64 = SECONDS_PER_MINUTE * MINUTES_PER_HOUR;
const SECONDS_PER_DAY: u64 = SECONDS_PER_HOUR * HOURS_PER_DAY;
const SECONDS_PER_MONTH: u64 = SECONDS_PER_DAY * DAYS_PER_MONTH;
const SECONDS_PER_YEAR: u64 = SECONDS_PER_MONTH * MONTHS_PER_YEAR;

/// The twelve months of the simplified 360-day year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Month for a zero-based index, wrapping past December.
    pub fn from_index(index: u64) -> Self {
        Self::ALL[(index % MONTHS_PER_YEAR) as usize]
    }

    /// One-based month number.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// In-world time as total elapsed seconds since year 1, January 1st, 00:00:00.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CalendarTime(u64);

impl CalendarTime {
    /// Time from a total number of elapsed seconds.
    pub const fn from_seconds(seconds: u64) -> Self {
        Self(seconds)
    }

    /// Total elapsed seconds.
    pub const fn total_seconds(self) -> u64 {
        self.0
    }

    /// Advance by one second.
    pub fn advance_second(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// Second of the minute, `0..60`.
    pub fn second(self) -> u64 {
        self.0 % SECONDS_PER_MINUTE
    }

    /// Minute of the hour, `0..60`.
    pub fn minute(self) -> u64 {
        (self.0 / SECONDS_PER_MINUTE) % MINUTES_PER_HOUR
    }

    /// Hour of the day, `0..24`.
    pub fn hour(self) -> u64 {
        (self.0 / SECONDS_PER_HOUR) % HOURS_PER_DAY
    }

    /// Day of the month, `1..=30`.
    pub fn day(self) -> u64 {
        (self.0 / SECONDS_PER_DAY) % DAYS_PER_MONTH + 1
    }

    /// Month of the year.
    pub fn month(self) -> Month {
        Month::from_index(self.0 / SECONDS_PER_MONTH)
    }

    /// Year, starting at 1.
    pub fn year(self) -> u64 {
        self.0 / SECONDS_PER_YEAR + 1
    }
}

impl fmt::Display for CalendarTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Year {}, {} {}, {:02}:{:02}:{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_first_day() {
        let t = CalendarTime::default();
        assert_eq!(t.year(), 1);
        assert_eq!(t.month(), Month::January);
        assert_eq!(t.day(), 1);
        assert_eq!(t.to_string(), "Year 1, January 1, 00:00:00");
    }

    #[test]
    fn rolls_over_minute_and_hour() {
        let mut t = CalendarTime::from_seconds(3599);
        assert_eq!((t.hour(), t.minute(), t.second()), (0, 59, 59));
        t.advance_second();
        assert_eq!((t.hour(), t.minute(), t.second()), (1, 0, 0));
    }

    #[test]
    fn thirty_day_months() {
        let t = CalendarTime::from_seconds(30 * 86_400);
        assert_eq!(t.month(), Month::February);
        assert_eq!(t.month().number(), 2);
        assert_eq!(t.day(), 1);
    }

    #[test]
    fn year_has_360_days() {
        let t = CalendarTime::from_seconds(360 * 86_400 + 61);
        assert_eq!(t.year(), 2);
        assert_eq!(t.to_string(), "Year 2, January 1, 00:01:01");
    }
}
