// src/services/updater.rs
use chrono::{Datelike, NaiveDate};
use csv::Reader;
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::error::HeatmapError;
use crate::models::{Month, Observation, ReturnDataset};
use crate::services::loader::parse_dataset;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Reads a `Date,Close` CSV of daily index closes (ISO dates).
pub fn read_closes<R: Read>(reader: R) -> Result<Vec<DailyClose>, HeatmapError> {
    let mut rdr = Reader::from_reader(reader);

    let headers = rdr.headers()?.clone();
    let idx_date = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("Date"))
        .ok_or_else(|| HeatmapError::ParseFailure("No 'Date' column in closes CSV".to_string()))?;
    let idx_close = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("Close"))
        .ok_or_else(|| HeatmapError::ParseFailure("No 'Close' column in closes CSV".to_string()))?;

    let mut closes = Vec::new();
    for record in rdr.records() {
        let row = record?;
        let date_cell = row.get(idx_date).unwrap_or("").trim();
        let close_cell = row.get(idx_close).unwrap_or("").trim();
        if close_cell.is_empty() {
            warn!("Skipping {} with no close", date_cell);
            continue;
        }

        let date = NaiveDate::parse_from_str(date_cell, "%Y-%m-%d").map_err(|e| {
            HeatmapError::ParseFailure(format!("invalid date '{}': {}", date_cell, e))
        })?;
        let close = close_cell.parse::<f64>().map_err(|e| {
            HeatmapError::ParseFailure(format!(
                "invalid close '{}' on {}: {}",
                close_cell, date, e
            ))
        })?;
        if !close.is_finite() {
            warn!("Skipping {} with non-finite close '{}'", date, close_cell);
            continue;
        }
        closes.push(DailyClose { date, close });
    }

    info!("Read {} daily closes", closes.len());
    Ok(closes)
}

/// Rounds to cents, ties to the even cent (the rounding Python's `round` applies).
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Month-over-month percent change of month-end closes, rounded to 2 decimals.
///
/// The earliest month has no prior close and yields nothing, as does any month
/// whose preceding calendar month is missing from the input.
pub fn monthly_returns(closes: &[DailyClose]) -> Vec<Observation> {
    let mut month_end: BTreeMap<(i32, u32), DailyClose> = BTreeMap::new();
    for close in closes {
        let key = (close.date.year(), close.date.month());
        match month_end.get(&key) {
            Some(existing) if existing.date > close.date => {}
            _ => {
                month_end.insert(key, *close);
            }
        }
    }

    let mut out = Vec::new();
    for (&(year, month), close) in &month_end {
        let Some(prior) = month_end.get(&previous_month(year, month)) else {
            continue;
        };
        if prior.close == 0.0 {
            warn!(
                "Zero close at end of {}-{:02}, skipping next month",
                prior.date.year(),
                prior.date.month()
            );
            continue;
        }
        let Some(month_label) = Month::from_number(month) else {
            continue;
        };
        let change = (close.close / prior.close - 1.0) * 100.0;
        if !change.is_finite() {
            warn!("Non-finite return for {} {}, skipping", month_label, year);
            continue;
        }
        out.push(Observation {
            year,
            month: month_label,
            value: round2(change),
        });
    }
    out
}

/// Writes the computed returns into the dataset, replacing existing values.
/// Non-finite values never overwrite anything. Returns the number merged.
pub fn merge_returns(dataset: &mut ReturnDataset, returns: &[Observation]) -> usize {
    let mut merged = 0;
    for obs in returns {
        if !obs.value.is_finite() {
            warn!("Refusing non-finite return for {} {}", obs.month, obs.year);
            continue;
        }
        dataset.year_mut(obs.year).set(obs.month, Some(obs.value));
        merged += 1;
    }
    merged
}

/// Reads the dataset the updater merges into. Only a missing file starts an
/// empty dataset; any other read or parse failure is returned so the file is
/// never overwritten with partial history.
pub fn read_existing_dataset(path: impl AsRef<Path>) -> Result<ReturnDataset, HeatmapError> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => parse_dataset(&text),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{} not found, starting from an empty dataset", path.display());
            Ok(ReturnDataset::new())
        }
        Err(e) => Err(HeatmapError::ResourceUnavailable(format!(
            "{}: {}",
            path.display(),
            e
        ))),
    }
}

/// Four-space indented JSON in the input file's shape.
pub fn to_pretty_json(dataset: &ReturnDataset) -> Result<String, HeatmapError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    dataset.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| HeatmapError::ParseFailure(e.to_string()))
}

pub fn write_dataset(path: impl AsRef<Path>, dataset: &ReturnDataset) -> Result<(), HeatmapError> {
    let path = path.as_ref();
    fs::write(path, to_pretty_json(dataset)?)?;
    info!("Wrote {} years to {}", dataset.len(), path.display());
    Ok(())
}
