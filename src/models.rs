// src/models.rs
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::HeatmapError;

pub const MONTHS: [Month; 12] = [
    Month::Jan,
    Month::Feb,
    Month::Mar,
    Month::Apr,
    Month::May,
    Month::Jun,
    Month::Jul,
    Month::Aug,
    Month::Sep,
    Month::Oct,
    Month::Nov,
    Month::Dec,
];

/// Calendar month; ordering follows the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub fn abbrev(self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }

    /// Zero-based slot in a `YearRecord`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Maps a 1-based calendar month number (as returned by `chrono::Datelike::month`).
    pub fn from_number(number: u32) -> Option<Month> {
        match number {
            1..=12 => Some(MONTHS[(number - 1) as usize]),
            _ => None,
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

impl FromStr for Month {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MONTHS
            .iter()
            .copied()
            .find(|m| m.abbrev() == s.trim())
            .ok_or_else(|| HeatmapError::ParseFailure(format!("unknown month label '{}'", s)))
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.abbrev())
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// One year's monthly percentage returns. `None` marks a month with no observation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YearRecord {
    months: [Option<f64>; 12],
}

impl YearRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, month: Month) -> Option<f64> {
        self.months[month.index()]
    }

    pub fn set(&mut self, month: Month, value: Option<f64>) {
        self.months[month.index()] = value;
    }

    pub fn with(mut self, month: Month, value: f64) -> Self {
        self.set(month, Some(value));
        self
    }

    /// Present months in calendar order.
    pub fn present(&self) -> impl Iterator<Item = (Month, f64)> + '_ {
        MONTHS
            .iter()
            .filter_map(move |m| self.get(*m).map(|v| (*m, v)))
    }

    pub fn present_count(&self) -> usize {
        self.months.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.present_count() == 0
    }
}

impl Serialize for YearRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.present_count()))?;
        for (month, value) in self.present() {
            map.serialize_entry(month.abbrev(), &value)?;
        }
        map.end()
    }
}

/// Year -> monthly returns. Immutable once loaded for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReturnDataset {
    years: BTreeMap<i32, YearRecord>,
}

impl ReturnDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, year: i32, record: YearRecord) {
        self.years.insert(year, record);
    }

    pub fn year(&self, year: i32) -> Option<&YearRecord> {
        self.years.get(&year)
    }

    pub fn year_mut(&mut self, year: i32) -> &mut YearRecord {
        self.years.entry(year).or_default()
    }

    pub fn value(&self, year: i32, month: Month) -> Option<f64> {
        self.years.get(&year).and_then(|r| r.get(month))
    }

    /// Years ascending.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (i32, &YearRecord)> + '_ {
        self.years.iter().map(|(y, r)| (*y, r))
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// Flattened present values, year ascending then calendar order.
    pub fn observations(&self) -> impl Iterator<Item = Observation> + '_ {
        self.iter().flat_map(|(year, record)| {
            record
                .present()
                .map(move |(month, value)| Observation { year, month, value })
        })
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

impl FromIterator<(i32, YearRecord)> for ReturnDataset {
    fn from_iter<T: IntoIterator<Item = (i32, YearRecord)>>(iter: T) -> Self {
        ReturnDataset {
            years: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub year: i32,
    pub month: Month,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub best: Observation,
    pub worst: Observation,
    pub average: f64,
}

/// A curated (year, month) flagged as a market event regardless of its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMarker {
    pub year: i32,
    pub month: Month,
    pub label: String,
}

impl EventMarker {
    pub fn new(year: i32, month: Month, label: impl Into<String>) -> Self {
        EventMarker {
            year,
            month,
            label: label.into(),
        }
    }
}
