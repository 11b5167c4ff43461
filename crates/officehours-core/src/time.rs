use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// Wall-clock time with second precision, independent of any date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Result<Self, DomainError> {
        NaiveTime::from_hms_opt(hour, minute, second)
            .map(Self)
            .ok_or_else(|| DomainError::InvalidTime(format!("{hour}:{minute}:{second}")))
    }

    /// Parses `HH:MM:SS`, or `HH:MM` with zero seconds.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        let time = NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
            .map_err(|_| DomainError::InvalidTime(s.to_string()))?;
        // chrono represents a leap second as an overflowing nanosecond field
        if time.nanosecond() != 0 {
            return Err(DomainError::InvalidTime(s.to_string()));
        }
        Ok(Self(time))
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }

    /// Adds whole minutes, returning `None` if the result would pass midnight.
    pub fn checked_add_minutes(&self, minutes: u32) -> Option<Self> {
        let (time, wrapped) = self
            .0
            .overflowing_add_signed(Duration::minutes(i64::from(minutes)));
        if wrapped != 0 {
            return None;
        }
        Some(Self(time))
    }

    pub fn duration_until(&self, later: &TimeOfDay) -> Duration {
        later.0.signed_duration_since(self.0)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Half-open window `[start, end)` within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TimeWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, DomainError> {
        if start >= end {
            return Err(DomainError::InvalidTimeWindow);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.start.duration_until(&self.end)
    }

    pub fn contains(&self, inner: &TimeWindow) -> bool {
        inner.start >= self.start && inner.end <= self.end
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        intervals_overlap(self.start, self.end, other.start, other.end)
    }
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::InvalidDateRange);
        }
        Ok(Self { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// True when both ranges share at least one day.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        intervals_overlap(
            self.start,
            exclusive_end(self.end),
            other.start,
            exclusive_end(other.end),
        )
    }
}

fn exclusive_end(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(NaiveDate::MAX)
}

/// Half-open overlap test: touching endpoints do not overlap.
pub fn intervals_overlap<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

pub fn weekday_of(date: NaiveDate) -> Weekday {
    date.weekday()
}

/// Parses `YYYY-MM-DD`, or an RFC 3339 timestamp normalized to its UTC date.
pub fn parse_date(s: &str) -> Result<NaiveDate, DomainError> {
    let trimmed = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| DomainError::InvalidDate(s.to_string()))
}

pub fn parse_weekday(s: &str) -> Result<Weekday, DomainError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "sun" | "sunday" => Ok(Weekday::Sun),
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tues" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thurs" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        _ => Err(DomainError::InvalidWeekday(s.to_string())),
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Set of weekdays stored as a bitmask, Sunday in bit 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn single(day: Weekday) -> Self {
        let mut set = Self::default();
        set.insert(day);
        set
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_sunday()
    }

    /// Returns `false` if the day was already present.
    pub fn insert(&mut self, day: Weekday) -> bool {
        let present = self.contains(day);
        self.0 |= Self::bit(day);
        !present
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn intersects(&self, other: &WeekdaySet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        SUNDAY_FIRST.into_iter().filter(|d| self.contains(*d))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::default();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl Serialize for WeekdaySet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter().map(weekday_name))
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        names
            .iter()
            .map(|n| parse_weekday(n))
            .collect::<Result<WeekdaySet, _>>()
            .map_err(serde::de::Error::custom)
    }
}
