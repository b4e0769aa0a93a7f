// src/handlers/heatmap.rs
use log::{debug, error, info};
use serde::Deserialize;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::models::Month;
use crate::services::presenter::{cell_detail, legend, HeatmapView, YearFilter};
use crate::services::session::{AppState, Session};

#[derive(Debug, Deserialize)]
pub struct HeatmapQuery {
    pub filter: Option<String>,
}

fn ready_session(state: &AppState) -> Result<&Session, Rejection> {
    state.session.session().map_err(|e| {
        error!("Request against failed session: {}", e);
        warp::reject::custom(ApiError::session_failed(e))
    })
}

pub async fn get_heatmap(query: HeatmapQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request to get heatmap (filter={:?})", query.filter);

    let filter = match query.filter.as_deref() {
        Some(raw) => raw.parse::<YearFilter>().map_err(|e| {
            warp::reject::custom(ApiError::bad_request(e.to_string()))
        })?,
        None => YearFilter::All,
    };

    let session = ready_session(&state)?;
    let view = HeatmapView::build(session, filter, &state.config);
    debug!("Returning {} heatmap rows", view.rows.len());
    Ok(warp::reply::json(&view))
}

pub async fn get_statistics(state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request to get statistics");
    let session = ready_session(&state)?;
    Ok(warp::reply::json(&session.statistics))
}

pub async fn get_yearly_returns(state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request to get yearly returns");
    let session = ready_session(&state)?;
    Ok(warp::reply::json(&session.yearly_returns))
}

pub async fn get_legend() -> Result<Json, Rejection> {
    Ok(warp::reply::json(&legend()))
}

pub async fn get_cell(year: i32, month: String, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request to get cell {} {}", month, year);

    let month: Month = month
        .parse()
        .map_err(|e: crate::error::HeatmapError| {
            warp::reject::custom(ApiError::bad_request(e.to_string()))
        })?;

    let session = ready_session(&state)?;
    let rules = state.config.significance_rules();
    match cell_detail(session, &rules, year, month) {
        Some(detail) => Ok(warp::reply::json(&detail)),
        None => Err(warp::reject::custom(ApiError::not_found(format!(
            "No data for {} {}",
            month, year
        )))),
    }
}
