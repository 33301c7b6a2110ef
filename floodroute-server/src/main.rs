mod api;
mod config;
mod error;
mod state;

use std::path::PathBuf;

use clap::Parser;
use floodroute_core::create_road_graph;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::AppState;

/// HTTP server for flood-aware routing
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "floodroute.toml")]
    config: PathBuf,

    /// Address to listen on, overrides `bind` from the config file
    #[arg(long)]
    bind: Option<String>,

    /// Initial rainfall intensity in mm/hr, overrides `model.rain_mm`
    #[arg(long)]
    rain_mm: Option<f64>,
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let mut config = ServerConfig::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(rain_mm) = args.rain_mm {
        config.model.rain_mm = rain_mm;
    }
    config.validate()?;

    let fleet = config.fleet()?;
    info!(
        "Vehicle types: {}",
        fleet.names().collect::<Vec<_>>().join(", ")
    );

    let model = config.model.clone();
    let graph = tokio::task::spawn_blocking(move || create_road_graph(&model)).await??;

    let bind = config.bind.clone();
    let app = api::router(AppState::new(graph, fleet, config));

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Listening on http://{bind}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
