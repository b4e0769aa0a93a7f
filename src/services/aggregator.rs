// src/services/aggregator.rs
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::HeatmapError;
use crate::models::{EventMarker, Month, ReturnDataset, Statistics, YearRecord};

pub const LARGE_DROP_THRESHOLD: f64 = -15.0;

/// Shown wherever a value is absent; never rendered as `0.00`.
pub const EMPTY_MARKER: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorBucket {
    NoData,
    StrongPositive,
    Positive,
    MildPositive,
    MildNegative,
    Negative,
    StrongNegative,
}

impl ColorBucket {
    /// Value buckets from strongest gain to strongest loss.
    pub const SCALE: [ColorBucket; 6] = [
        ColorBucket::StrongPositive,
        ColorBucket::Positive,
        ColorBucket::MildPositive,
        ColorBucket::MildNegative,
        ColorBucket::Negative,
        ColorBucket::StrongNegative,
    ];

    pub fn range_label(self) -> &'static str {
        match self {
            ColorBucket::NoData => "no data",
            ColorBucket::StrongPositive => ">5%",
            ColorBucket::Positive => "2-5%",
            ColorBucket::MildPositive => "0-2%",
            ColorBucket::MildNegative => "0 to -2%",
            ColorBucket::Negative => "-2 to -5%",
            ColorBucket::StrongNegative => "<-5%",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            ColorBucket::NoData => "bg-gray-100",
            ColorBucket::StrongPositive => "bg-green-600 text-white",
            ColorBucket::Positive => "bg-green-500 text-white",
            ColorBucket::MildPositive => "bg-green-300",
            ColorBucket::MildNegative => "bg-red-300",
            ColorBucket::Negative => "bg-red-500 text-white",
            ColorBucket::StrongNegative => "bg-red-600 text-white",
        }
    }
}

/// Compounds the present months of a year into one percentage return.
///
/// Months are applied in calendar order starting from a unit growth factor.
/// Returns `None` when the year has no observations; such a year has no
/// yearly return at all, which is different from a flat 0% year.
pub fn compute_yearly_return(record: &YearRecord) -> Option<f64> {
    if record.is_empty() {
        return None;
    }

    let growth = record
        .present()
        .fold(1.0_f64, |acc, (_, value)| acc * (1.0 + value / 100.0));
    Some((growth - 1.0) * 100.0)
}

pub fn compute_yearly_returns(dataset: &ReturnDataset) -> BTreeMap<i32, Option<f64>> {
    dataset
        .iter()
        .map(|(year, record)| {
            let yearly = compute_yearly_return(record);
            if yearly.is_none() {
                warn!("Year {} has no monthly observations; yearly return left empty", year);
            }
            (year, yearly)
        })
        .collect()
}

/// Best month, worst month and the simple mean of every monthly observation.
///
/// Ties resolve to the first observation in year-ascending, calendar-month
/// order, for both the best and the worst month.
pub fn compute_statistics(dataset: &ReturnDataset) -> Result<Statistics, HeatmapError> {
    let mut observations = dataset.observations();
    let first = observations.next().ok_or_else(HeatmapError::empty_dataset)?;

    let mut best = first;
    let mut worst = first;
    let mut sum = first.value;
    let mut count = 1usize;

    for obs in observations {
        if obs.value > best.value {
            best = obs;
        }
        if obs.value < worst.value {
            worst = obs;
        }
        sum += obs.value;
        count += 1;
    }

    let average = sum / count as f64;
    debug!(
        "Computed statistics over {} observations: best={:?} worst={:?} average={}",
        count, best, worst, average
    );

    Ok(Statistics {
        best,
        worst,
        average,
    })
}

pub fn classify_return(value: Option<f64>) -> ColorBucket {
    match value {
        None => ColorBucket::NoData,
        Some(v) if v > 5.0 => ColorBucket::StrongPositive,
        Some(v) if v > 2.0 => ColorBucket::Positive,
        Some(v) if v > 0.0 => ColorBucket::MildPositive,
        Some(v) if v > -2.0 => ColorBucket::MildNegative,
        Some(v) if v > -5.0 => ColorBucket::Negative,
        Some(_) => ColorBucket::StrongNegative,
    }
}

/// Two-decimal percentage for display, or the empty marker.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => EMPTY_MARKER.to_string(),
    }
}

/// Decides which cells are flagged as significant: single-month drops at or
/// below a threshold, plus a configured list of curated event dates.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificanceRules {
    pub large_drop_threshold: f64,
    pub markers: Vec<EventMarker>,
}

impl Default for SignificanceRules {
    fn default() -> Self {
        SignificanceRules {
            large_drop_threshold: LARGE_DROP_THRESHOLD,
            markers: default_event_markers(),
        }
    }
}

impl SignificanceRules {
    pub fn new(large_drop_threshold: f64, markers: Vec<EventMarker>) -> Self {
        SignificanceRules {
            large_drop_threshold,
            markers,
        }
    }

    pub fn is_large_drop(&self, value: Option<f64>) -> bool {
        matches!(value, Some(v) if v <= self.large_drop_threshold)
    }

    pub fn marker_for(&self, year: i32, month: Month) -> Option<&EventMarker> {
        self.markers
            .iter()
            .find(|m| m.year == year && m.month == month)
    }

    pub fn is_significant_event(&self, year: i32, month: Month, value: Option<f64>) -> bool {
        self.is_large_drop(value) || self.marker_for(year, month).is_some()
    }
}

pub fn default_event_markers() -> Vec<EventMarker> {
    vec![
        EventMarker::new(2008, Month::Oct, "Financial Crisis"),
        EventMarker::new(2020, Month::Mar, "COVID Crash"),
    ]
}

pub fn is_significant_event(
    rules: &SignificanceRules,
    year: i32,
    month: Month,
    value: Option<f64>,
) -> bool {
    rules.is_significant_event(year, month, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_percent_uses_empty_marker_for_absent_values() {
        assert_eq!(format_percent(Some(-26.41)), "-26.41");
        assert_eq!(format_percent(Some(0.0)), "0.00");
        assert_eq!(format_percent(None), EMPTY_MARKER);
    }

    #[test]
    fn scale_excludes_no_data() {
        assert!(!ColorBucket::SCALE.contains(&ColorBucket::NoData));
        assert_eq!(ColorBucket::SCALE.len(), 6);
    }

    #[test]
    fn bucket_serializes_kebab_case() {
        let json = serde_json::to_string(&ColorBucket::StrongNegative).unwrap();
        assert_eq!(json, "\"strong-negative\"");
        let json = serde_json::to_string(&ColorBucket::NoData).unwrap();
        assert_eq!(json, "\"no-data\"");
    }

    #[test]
    fn injected_markers_replace_defaults() {
        let rules = SignificanceRules::new(
            -10.0,
            vec![EventMarker::new(2016, Month::Nov, "Demonetisation")],
        );
        assert!(rules.is_significant_event(2016, Month::Nov, Some(1.0)));
        assert!(!rules.is_significant_event(2008, Month::Oct, Some(-3.0)));
        assert!(rules.is_significant_event(2011, Month::Aug, Some(-10.0)));
    }
}
