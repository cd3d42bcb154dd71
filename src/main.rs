mod app;
mod config;
mod coordinate;
mod error;
mod geolocation;
mod grid;
mod http;
mod jobs;
mod load;
mod map_view;
mod marker;
mod satellite;
mod session;
mod surface;
mod ui;

use app::MapPinsApp;
use config::AppConfig;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Map Pins"),
        ..Default::default()
    };

    tracing::info!("starting map pins");
    eframe::run_native(
        "Map Pins",
        native_options,
        Box::new(move |cc| Ok(Box::new(MapPinsApp::new(cc, config))))
    )
}
