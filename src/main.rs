//! pitwall - a terminal menu client for F1 TV.
//!
//! Authenticates against the provider's account API, browses the content
//! catalog (live events, race weekends, archive, shows, documentaries) as
//! numbered menus, and hands resolved stream URLs to an external player.

mod api;
mod app;
mod auth;
mod config;
mod models;
mod nav;
mod player;
mod ui;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("pitwall starting");

    let mut app = App::new()?;
    app.run().await?;

    info!("pitwall shutting down");
    Ok(())
}
