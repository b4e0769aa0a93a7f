// src/error.rs
use std::fmt;

/// Terminal failure of a heatmap session.
#[derive(Debug, Clone, PartialEq)]
pub enum HeatmapError {
    /// The returns document could not be fetched or read.
    ResourceUnavailable(String),
    /// The document could not be decoded, or it holds no observations.
    ParseFailure(String),
}

impl HeatmapError {
    pub fn empty_dataset() -> Self {
        HeatmapError::ParseFailure("dataset contains no monthly observations".to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HeatmapError::ResourceUnavailable(_) => "resource_unavailable",
            HeatmapError::ParseFailure(_) => "parse_failure",
        }
    }
}

impl fmt::Display for HeatmapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HeatmapError::ResourceUnavailable(msg) => write!(f, "resource unavailable: {}", msg),
            HeatmapError::ParseFailure(msg) => write!(f, "parse failure: {}", msg),
        }
    }
}

impl std::error::Error for HeatmapError {}

impl From<std::io::Error> for HeatmapError {
    fn from(err: std::io::Error) -> Self {
        HeatmapError::ResourceUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for HeatmapError {
    fn from(err: reqwest::Error) -> Self {
        HeatmapError::ResourceUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for HeatmapError {
    fn from(err: serde_json::Error) -> Self {
        HeatmapError::ParseFailure(err.to_string())
    }
}

impl From<csv::Error> for HeatmapError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            return HeatmapError::ResourceUnavailable(err.to_string());
        }
        HeatmapError::ParseFailure(err.to_string())
    }
}
