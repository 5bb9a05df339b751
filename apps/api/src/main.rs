mod config;
mod cv;
mod errors;
mod render;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::render::fonts;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (all variables are optional with defaults)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV generator API v{}", env!("CARGO_PKG_VERSION"));

    // Load the renderer font family once; every render clones it.
    let fonts = fonts::load_font_family(&config.font_dir)
        .with_context(|| format!("loading fonts from {}", config.font_dir.display()))?;
    info!(
        "Font family '{}' loaded from {}",
        fonts::FONT_FAMILY_NAME,
        config.font_dir.display()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        fonts,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
