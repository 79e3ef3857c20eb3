//! Brain Disease Classifier web front-end
//!
//! Serves the Home, Classify and About pages. Models are loaded once at
//! start-up; a model that fails to load is reported on /health and on the
//! classify page instead of stopping the server.

mod routes;
mod state;
mod views;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use brain_classifier::backend::{backend_name, default_device, DefaultBackend};
use brain_classifier::utils::logging::{init_logging, LogConfig};
use brain_classifier::{AppConfig, ModelRegistry};

use crate::state::{AppState, SharedState};

/// Brain Disease Classifier server
#[derive(Parser, Debug)]
#[command(name = "brain-classifier-server")]
#[command(version)]
#[command(about = "Web front-end for the brain disease classifier")]
struct Cli {
    /// Port to listen on (overrides server.port)
    #[arg(short, long, env = "BRAIN_PORT")]
    port: Option<u16>,

    /// Host to bind to (overrides server.host)
    #[arg(long, env = "BRAIN_HOST")]
    host: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "BRAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum upload size in bytes (overrides server.max_upload_bytes)
    #[arg(long, env = "BRAIN_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

/// Build the router for the given state
fn app(state: SharedState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))

        // Pages
        .route("/", get(routes::pages::index))
        .route(
            "/classify",
            get(routes::classify::classify_page).post(routes::classify::submit),
        )
        .route("/report", post(routes::report::download_report))

        // Add state
        .with_state(state)

        // Add middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::production()
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{}", e);
    }

    // CLI flags and env vars override the file
    let mut config = AppConfig::load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(limit) = cli.max_upload_bytes {
        config.server.max_upload_bytes = limit;
    }

    info!("Brain Disease Classifier server v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {}", backend_name());
    config.warn_on_size_mismatch();

    let device = default_device();
    let registry = ModelRegistry::load::<DefaultBackend>(&config.models, &device);
    if registry.loaded_count() == 0 {
        warn!("No model loaded; every classification will fail until models are provided");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid host or port")?;

    let state = Arc::new(AppState::new(config, registry));
    let router = app(state);

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
