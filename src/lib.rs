pub mod api;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

use tokio::signal;

pub use config::Config;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!(
        "Notedesk v{} starting ({} mode)...",
        env!("CARGO_PKG_VERSION"),
        config.general.environment
    );

    let port = config.server.port;
    let state = api::create_app_state_from_config(config).await?;
    let app = api::router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("API server running at http://0.0.0.0:{port}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {e}");
        }
    });

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {e}"),
    }

    server_handle.abort();
    info!("Server stopped");

    Ok(())
}
