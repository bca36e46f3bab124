use kindling::prelude::*;
use std::path::Path;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod catalog;
mod controllers;
mod repository;
mod services;

const CONFIG_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/kindling.json");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting demo server...");

    let config = if Path::new(CONFIG_FILE).exists() {
        AppConfig::from_file(CONFIG_FILE)?
    } else {
        AppConfig::default()
    };

    let health = Router::new().route("/health", axum::routing::get(|| async { "ok" }));

    let mut app = Application::builder()
        .config(config)
        .catalog(catalog::modules())
        .router(health)
        .build()?;

    let report = app.start()?;
    if !report.scan.failures.is_empty() {
        tracing::warn!("{} module(s) failed to load", report.scan.failures.len());
    }
    app.map_router(|router| router.layer(TraceLayer::new_for_http()))?;

    app.serve().await?;
    Ok(())
}
