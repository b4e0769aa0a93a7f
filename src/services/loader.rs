// src/services/loader.rs
use log::{debug, error, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::HeatmapError;
use crate::models::{Month, ReturnDataset, YearRecord};

/// Where the returns document lives.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl DataSource {
    /// `http(s)://` locations are fetched over the network, anything else is a path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            DataSource::Url(trimmed.to_string())
        } else {
            DataSource::File(PathBuf::from(trimmed))
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => f.write_str(url),
        }
    }
}

/// One-shot read of the returns document. No retry, no timeout.
pub async fn fetch_document(source: &DataSource) -> Result<String, HeatmapError> {
    match source {
        DataSource::File(path) => {
            info!("Reading returns data from file: {}", path.display());
            tokio::fs::read_to_string(path).await.map_err(|e| {
                error!("Failed to read {}: {}", path.display(), e);
                HeatmapError::ResourceUnavailable(format!("{}: {}", path.display(), e))
            })
        }
        DataSource::Url(url) => {
            info!("Fetching returns data from URL: {}", url);
            let response = reqwest::get(url).await?;
            let status = response.status();
            if !status.is_success() {
                error!("Returns data request failed with status {}", status);
                return Err(HeatmapError::ResourceUnavailable(format!(
                    "HTTP error! status: {}",
                    status.as_u16()
                )));
            }
            Ok(response.text().await?)
        }
    }
}

pub async fn load_dataset(source: &DataSource) -> Result<ReturnDataset, HeatmapError> {
    let text = fetch_document(source).await?;
    let dataset = parse_dataset(&text)?;
    info!("Data parsed successfully: {} years from {}", dataset.len(), source);
    Ok(dataset)
}

/// Decodes `{ "2008": { "Oct": -26.41, ... }, ... }`.
///
/// `null` values and omitted months both become absent months. Year keys must
/// be canonical integers (`"2008"`, not `" 2008"` or `"02008"`) so no two keys
/// name the same year, month keys must be calendar abbreviations and values
/// must be numbers.
pub fn parse_dataset(text: &str) -> Result<ReturnDataset, HeatmapError> {
    let raw: BTreeMap<String, BTreeMap<String, Value>> = serde_json::from_str(text)?;

    let mut dataset = ReturnDataset::new();
    for (year_label, months) in raw {
        let year = year_label
            .parse::<i32>()
            .ok()
            .filter(|y| y.to_string() == year_label)
            .ok_or_else(|| {
                HeatmapError::ParseFailure(format!("invalid year label '{}'", year_label))
            })?;

        let mut record = YearRecord::new();
        for (month_label, value) in months {
            let month: Month = month_label.parse()?;
            let value = match value {
                Value::Null => None,
                Value::Number(n) => n.as_f64(),
                other => {
                    return Err(HeatmapError::ParseFailure(format!(
                        "{} {}: expected a number, got {}",
                        month, year, other
                    )))
                }
            };
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(HeatmapError::ParseFailure(format!(
                        "{} {}: non-finite return",
                        month, year
                    )));
                }
            }
            record.set(month, value);
        }

        if record.is_empty() {
            warn!("Year {} has no monthly values", year);
        }
        debug!("Parsed {} months for {}", record.present_count(), year);
        dataset.insert(year, record);
    }

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_parse_distinguishes_urls_from_paths() {
        assert_eq!(
            DataSource::parse("https://example.org/data/nifty_returns.json"),
            DataSource::Url("https://example.org/data/nifty_returns.json".to_string())
        );
        assert_eq!(
            DataSource::parse("data/nifty_returns.json"),
            DataSource::File(PathBuf::from("data/nifty_returns.json"))
        );
    }

    #[test]
    fn null_and_missing_months_are_both_absent() {
        let dataset = parse_dataset(r#"{"2024": {"Jan": 1.5, "Feb": null}}"#).unwrap();
        let record = dataset.year(2024).unwrap();
        assert_eq!(record.get(Month::Jan), Some(1.5));
        assert_eq!(record.get(Month::Feb), None);
        assert_eq!(record.get(Month::Mar), None);
        assert_eq!(record.present_count(), 1);
    }

    #[test]
    fn zero_is_kept_distinct_from_absent() {
        let dataset = parse_dataset(r#"{"2024": {"Jan": 0}}"#).unwrap();
        assert_eq!(dataset.value(2024, Month::Jan), Some(0.0));
        assert_eq!(dataset.value(2024, Month::Feb), None);
    }

    #[test]
    fn rejects_unknown_month_label() {
        let err = parse_dataset(r#"{"2024": {"January": 1.0}}"#).unwrap_err();
        assert!(matches!(err, HeatmapError::ParseFailure(_)));
    }

    #[test]
    fn rejects_non_numeric_year() {
        let err = parse_dataset(r#"{"FY24": {"Jan": 1.0}}"#).unwrap_err();
        assert!(matches!(err, HeatmapError::ParseFailure(_)));
    }

    #[test]
    fn rejects_non_canonical_year_labels() {
        for label in [" 2008", "+2008", "02008", "2008 "] {
            let doc = format!(r#"{{"2008": {{"Oct": -26.41}}, "{}": {{"Oct": 1.0}}}}"#, label);
            let err = parse_dataset(&doc).unwrap_err();
            assert!(matches!(err, HeatmapError::ParseFailure(_)), "{:?}", label);
        }
    }

    #[test]
    fn rejects_string_values() {
        let err = parse_dataset(r#"{"2024": {"Jan": "1.0"}}"#).unwrap_err();
        assert!(matches!(err, HeatmapError::ParseFailure(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = parse_dataset("{\"2024\": ").unwrap_err();
        assert!(matches!(err, HeatmapError::ParseFailure(_)));
    }

    #[test]
    fn empty_document_is_an_empty_dataset() {
        let dataset = parse_dataset("{}").unwrap();
        assert!(dataset.is_empty());
    }
}
