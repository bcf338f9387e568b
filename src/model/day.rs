//! Calendar days, months and the timezone used to cut timestamps into days.

use crate::error::{CoreError, CoreResult};
use anyhow::{bail, Context};
use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A calendar day, displayed as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn month(&self) -> Month {
        Month {
            year: self.0.year(),
            month: self.0.month(),
        }
    }
}

impl Display for DayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))?;
        Ok(Self(date))
    }
}

impl Serialize for DayKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A requested reporting month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> crate::Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("Invalid month {month}, expected 1 through 12");
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn contains(&self, day: DayKey) -> bool {
        day.month() == *self
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .with_context(|| format!("Invalid month '{s}', expected YYYY-MM"))?;
        let year: i32 = year
            .parse()
            .with_context(|| format!("Invalid year in '{s}'"))?;
        let month: u32 = month
            .parse()
            .with_context(|| format!("Invalid month in '{s}'"))?;
        Month::new(year, month)
    }
}

impl Serialize for Month {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// The timezone in which record timestamps are truncated to calendar days.
///
/// Serialized as `"local"`, `"utc"` or a fixed offset such as `"+07:00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayZone {
    /// The timezone of the machine running the report.
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl DayZone {
    /// The calendar day on which `instant` falls in this zone.
    pub fn day_of<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> NaiveDate {
        match self {
            DayZone::Local => instant.with_timezone(&Local).date_naive(),
            DayZone::Utc => instant.with_timezone(&Utc).date_naive(),
            DayZone::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }
}

impl Display for DayZone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DayZone::Local => f.write_str("local"),
            DayZone::Utc => f.write_str("utc"),
            DayZone::Fixed(offset) => Display::fmt(offset, f),
        }
    }
}

impl FromStr for DayZone {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "local" => return Ok(DayZone::Local),
            "utc" | "z" => return Ok(DayZone::Utc),
            _ => {}
        }
        parse_offset(s)
            .map(DayZone::Fixed)
            .with_context(|| format!("Invalid day zone '{s}', expected local, utc or +HH:MM"))
    }
}

impl Serialize for DayZone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayZone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DayZone::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Parses `+HH:MM`, `-HH:MM` or `+HHMM`.
fn parse_offset(s: &str) -> crate::Result<FixedOffset> {
    let (sign, rest) = match s.chars().next() {
        Some('+') => (1, &s[1..]),
        Some('-') => (-1, &s[1..]),
        _ => bail!("An offset must start with + or -"),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        bail!("An offset must have the form +HH:MM");
    }
    let hours: i32 = digits[..2].parse()?;
    let minutes: i32 = digits[2..].parse()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).context("Offset is out of range")
}

/// The creation time of a financial record.
///
/// The record store mixes timestamp styles. Zoned timestamps are converted into the reporting
/// `DayZone` before truncation; naive ones are taken to already be wall-clock time and are
/// truncated as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

impl Timestamp {
    /// Parses a record timestamp. `id` is only used to report which record was bad.
    pub fn parse(id: &str, value: &str) -> CoreResult<Self> {
        let trimmed = value.trim();
        if let Ok(zoned) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Timestamp::Zoned(zoned));
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Timestamp::Naive(naive));
            }
        }
        if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(Timestamp::Naive(midnight));
        }
        Err(CoreError::InvalidTimestamp {
            id: id.to_string(),
            value: value.to_string(),
        })
    }

    /// Truncates this timestamp to the calendar day it falls on in `zone`.
    pub fn day_key(&self, zone: DayZone) -> DayKey {
        match self {
            Timestamp::Zoned(instant) => DayKey(zone.day_of(instant)),
            Timestamp::Naive(naive) => DayKey(naive.date()),
        }
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Timestamp::Zoned(instant) => write!(f, "{}", instant.to_rfc3339()),
            Timestamp::Naive(naive) => write!(f, "{}", naive.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
