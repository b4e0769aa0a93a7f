// src/services/mod.rs
pub mod aggregator;
pub mod config;
pub mod loader;
pub mod presenter;
pub mod session;
pub mod updater;
