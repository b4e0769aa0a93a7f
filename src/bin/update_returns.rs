// src/bin/update_returns.rs
use anyhow::Context;
use dotenv::dotenv;
use log::info;
use std::env;
use std::fs::File;

use nifty_heatmap::services::config::DEFAULT_DATA_PATH;
use nifty_heatmap::services::updater::{
    merge_returns, monthly_returns, read_closes, read_existing_dataset, write_dataset,
};

/// Usage: update_returns <closes.csv> [dataset.json]
fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let closes_path = env::args()
        .nth(1)
        .context("usage: update_returns <closes.csv> [dataset.json]")?;
    let dataset_path = env::args()
        .nth(2)
        .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());

    let mut dataset = read_existing_dataset(&dataset_path)
        .with_context(|| format!("reading {}", dataset_path))?;

    let file = File::open(&closes_path).with_context(|| format!("opening {}", closes_path))?;
    let closes = read_closes(file)?;
    let returns = monthly_returns(&closes);
    let merged = merge_returns(&mut dataset, &returns);
    info!("Merged {} monthly returns", merged);

    write_dataset(&dataset_path, &dataset)?;
    println!("Data updated successfully");
    Ok(())
}
