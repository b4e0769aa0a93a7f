// src/bin/render_heatmap.rs
use dotenv::dotenv;
use log::info;
use std::env;

use nifty_heatmap::services::config::{HeatmapConfig, Settings};
use nifty_heatmap::services::loader::DataSource;
use nifty_heatmap::services::presenter::{render_text, HeatmapView, YearFilter};
use nifty_heatmap::services::session::SessionState;

/// Usage: render_heatmap [all|recent|crisis] [data path or URL]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let filter: YearFilter = env::args()
        .nth(1)
        .map(|raw| raw.parse::<YearFilter>())
        .transpose()?
        .unwrap_or_default();

    let settings = Settings::from_env()?;
    let source = env::args()
        .nth(2)
        .map(|raw| DataSource::parse(&raw))
        .unwrap_or(settings.data_source);
    let config = HeatmapConfig::load(&settings.config_path)?;

    info!("Rendering {:?} heatmap from {}", filter, source);
    let session = match SessionState::open(&source).await {
        SessionState::Ready(session) => session,
        SessionState::Failed(e) => {
            eprintln!("Error loading data: {}", e);
            eprintln!("Please check:");
            eprintln!("  - The file exists at {}", source);
            eprintln!("  - The JSON content is valid");
            return Err(e.into());
        }
    };

    let view = HeatmapView::build(&session, filter, &config);
    let color = env::var_os("NO_COLOR").is_none();
    println!("NIFTY Monthly Returns Heatmap");
    println!("Monthly percentage returns of NIFTY index over time\n");
    print!("{}", render_text(&view, color));
    Ok(())
}
