use dotenv::dotenv;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use nifty_heatmap::routes;
use nifty_heatmap::services::config::{HeatmapConfig, Settings};
use nifty_heatmap::services::session::{AppState, SessionState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let settings = Settings::from_env()?;
    info!("Using PORT: {}", settings.port);

    let config = HeatmapConfig::load(&settings.config_path)?;

    // A failed load still starts the server; every data endpoint then reports the error.
    let session = SessionState::open(&settings.data_source).await;
    if let SessionState::Failed(e) = &session {
        error!("Serving in error state: {}", e);
    }
    let state = Arc::new(AppState::new(session, config));

    let addr: SocketAddr = ([0, 0, 0, 0], settings.port).into();
    info!("Will bind to: {}", addr);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET"]);

    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
