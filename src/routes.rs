// src/routes.rs
use log::info;
use std::convert::Infallible;
use std::sync::Arc;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::error::ApiError;
use crate::handlers::heatmap::{
    get_cell, get_heatmap, get_legend, get_statistics, get_yearly_returns, HeatmapQuery,
};
use crate::services::session::AppState;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = "Invalid query string".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let heatmap_route = warp::path!("api" / "v1" / "heatmap")
        .and(warp::get())
        .and(warp::query::<HeatmapQuery>())
        .and(state_filter.clone())
        .and_then(get_heatmap);

    let statistics_route = warp::path!("api" / "v1" / "statistics")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_statistics);

    let yearly_route = warp::path!("api" / "v1" / "yearly")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_yearly_returns);

    let legend_route = warp::path!("api" / "v1" / "legend")
        .and(warp::get())
        .and_then(get_legend);

    let cell_route = warp::path!("api" / "v1" / "cell" / i32 / String)
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_cell);

    info!("All routes configured successfully.");

    heatmap_route
        .or(statistics_route)
        .or(yearly_route)
        .or(legend_route)
        .or(cell_route)
        .recover(handle_rejection)
}
