mod app;
mod config;
mod error;
mod processing;
mod utils;

use anyhow::{anyhow, Context};
use app::TileSplitter;
use config::Config;
use eframe::CreationContext;
use processing::Dispatcher;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tile_splitter=info")),
        )
        .init();

    let config = Config::load().context("failed to load configuration")?;
    let dispatcher = Dispatcher::new(&config);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([560.0, 780.0])
            .with_min_inner_size([400.0, 500.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Insta-friendly image splitter",
        options,
        Box::new(move |cc: &CreationContext| Box::new(TileSplitter::new(cc, dispatcher))),
    )
    .map_err(|e| anyhow!("failed to open window: {}", e))
}
