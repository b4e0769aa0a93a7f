// src/services/session.rs
use log::{error, info};
use std::collections::BTreeMap;

use crate::error::HeatmapError;
use crate::models::{ReturnDataset, Statistics};
use crate::services::aggregator::{compute_statistics, compute_yearly_returns};
use crate::services::config::HeatmapConfig;
use crate::services::loader::{load_dataset, DataSource};

/// A loaded dataset together with everything derived from it.
#[derive(Debug, Clone)]
pub struct Session {
    pub dataset: ReturnDataset,
    pub yearly_returns: BTreeMap<i32, Option<f64>>,
    pub statistics: Statistics,
}

impl Session {
    pub fn derive(dataset: ReturnDataset) -> Result<Self, HeatmapError> {
        let yearly_returns = compute_yearly_returns(&dataset);
        let statistics = compute_statistics(&dataset)?;
        Ok(Session {
            dataset,
            yearly_returns,
            statistics,
        })
    }

    pub fn yearly_return(&self, year: i32) -> Option<f64> {
        self.yearly_returns.get(&year).copied().flatten()
    }
}

/// Either a usable session or the error that ended it. There is no partial state.
#[derive(Debug, Clone)]
pub enum SessionState {
    Ready(Session),
    Failed(HeatmapError),
}

impl SessionState {
    pub async fn open(source: &DataSource) -> Self {
        let result = match load_dataset(source).await {
            Ok(dataset) => Session::derive(dataset),
            Err(e) => Err(e),
        };
        SessionState::from(result)
    }

    pub fn session(&self) -> Result<&Session, &HeatmapError> {
        match self {
            SessionState::Ready(session) => Ok(session),
            SessionState::Failed(err) => Err(err),
        }
    }
}

/// Shared, read-only state behind the HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    pub session: SessionState,
    pub config: HeatmapConfig,
}

impl AppState {
    pub fn new(session: SessionState, config: HeatmapConfig) -> Self {
        AppState { session, config }
    }
}

impl From<Result<Session, HeatmapError>> for SessionState {
    fn from(result: Result<Session, HeatmapError>) -> Self {
        match result {
            Ok(session) => {
                info!(
                    "Session ready: {} years, average monthly return {:.2}%",
                    session.dataset.len(),
                    session.statistics.average
                );
                SessionState::Ready(session)
            }
            Err(e) => {
                error!("Session failed: {}", e);
                SessionState::Failed(e)
            }
        }
    }
}
