// src/lib.rs

pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use error::HeatmapError;
pub use models::{EventMarker, Month, Observation, ReturnDataset, Statistics, YearRecord, MONTHS};
pub use services::aggregator::{
    classify_return, compute_statistics, compute_yearly_return, compute_yearly_returns,
    is_significant_event, ColorBucket, SignificanceRules,
};
