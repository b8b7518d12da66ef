//! Citytemp HTTP Server
//!
//! Serves annual average temperatures per city from the in-memory
//! cache, while a background watcher keeps the cache in sync with the
//! source file.
//!
//! # Endpoints
//!
//! - `GET /city/temperature/annual/average?city=<name>` - Yearly averages for one city
//! - `GET /cities` - Currently cached city identifiers
//! - `GET /health` - Health check
//!
//! # CLI Commands
//!
//! - `start` - Start the HTTP server (default if no command specified)
//! - `check-config` - Validate configuration file
//!
//! # Configuration
//!
//! The server reads configuration from:
//! 1. `CITYTEMP_CONFIG` environment variable (path to TOML file)
//! 2. `./citytemp.toml` in current directory
//! 3. Default configuration
//!
//! Environment overrides (`CITYTEMP_*`, `RUST_LOG`) apply on top.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tokio::signal;
use tracing::{info, warn};

use citytemp::config::Config;
use citytemp::parser::RecordParser;
use citytemp::services::{FileWatcherConfig, FileWatcherService, ServiceManager};
use citytemp::{CsvLoader, LookupError, TemperatureService, TemperatureStore};

// =============================================================================
// CLI Definition
// =============================================================================

/// Citytemp - city temperature aggregation cache server
#[derive(Parser)]
#[command(name = "citytemp-server")]
#[command(version)]
#[command(about = "Serves per-city annual average temperatures from a watched source file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (overrides CITYTEMP_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Override listen address (e.g., 0.0.0.0:8080)
    #[arg(short, long, global = true)]
    listen: Option<String>,

    /// Override source file path
    #[arg(short, long, global = true)]
    source: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Start,

    /// Validate configuration file without starting the server
    CheckConfig,
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Load configuration from file or environment.
///
/// Priority: CITYTEMP_CONFIG env var, then ./citytemp.toml, then defaults;
/// environment overrides apply in every case.
fn load_config() -> Config {
    if let Ok(path) = std::env::var("CITYTEMP_CONFIG") {
        match Config::from_file_with_env(&path) {
            Ok(config) => return config,
            Err(e) => {
                eprintln!("Failed to load config from {}: {}", path, e);
                std::process::exit(1);
            },
        }
    }

    if std::path::Path::new("citytemp.toml").exists() {
        match Config::from_file_with_env("citytemp.toml") {
            Ok(config) => return config,
            Err(e) => {
                eprintln!("Failed to load citytemp.toml: {}", e);
                std::process::exit(1);
            },
        }
    }

    Config::from_env()
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(listen) = &cli.listen {
        match listen.parse::<SocketAddr>() {
            Ok(addr) => {
                config.server.host = addr.ip().to_string();
                config.server.port = addr.port();
            },
            Err(e) => {
                eprintln!("Invalid listen address {}: {}", listen, e);
                std::process::exit(1);
            },
        }
    }
    if let Some(source) = &cli.source {
        config.source.path = source.clone();
    }
}

// =============================================================================
// HTTP Types and Handlers
// =============================================================================

/// Shared application state
struct AppState {
    service: TemperatureService,
    manager: Arc<ServiceManager>,
}

/// Query parameters of the lookup endpoint
#[derive(Debug, Deserialize)]
struct CityParams {
    city: String,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Error body returned for failed lookups
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn lookup_error_response(err: LookupError) -> Response {
    let status = match err {
        LookupError::InvalidCity => StatusCode::BAD_REQUEST,
        LookupError::CityNotFound(_) => StatusCode::NOT_FOUND,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// Yearly averages for one city
async fn annual_average(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CityParams>,
) -> Response {
    match state.service.annual_averages(&params.city) {
        Ok(result) => Json(result).into_response(),
        Err(err) => lookup_error_response(err),
    }
}

/// Currently cached city identifiers
async fn cached_cities(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let mut cities = state.service.cached_cities();
    cities.sort();
    Json(cities)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Response {
    let healthy = state.manager.is_healthy();
    let body = Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
    });
    if healthy {
        body.into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/cities", get(cached_cities))
        .route("/city/temperature/annual/average", get(annual_average))
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {},
            Err(e) => {
                warn!(
                    error = %e,
                    "Ctrl+C handler installation failed - graceful shutdown unavailable"
                );
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                warn!(
                    error = %e,
                    "SIGTERM handler installation failed - SIGTERM shutdown unavailable"
                );
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

// =============================================================================
// CLI Command Handlers
// =============================================================================

/// Validate configuration and print a summary
fn cmd_check_config(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(config_path) = &cli.config {
        std::env::set_var("CITYTEMP_CONFIG", config_path);
    }

    let mut config = load_config();
    apply_cli_overrides(&mut config, cli);
    config.validate()?;

    println!("Configuration is valid!");
    println!();
    println!("Server Settings:");
    println!("  Listen address: {}:{}", config.server.host, config.server.port);
    println!();
    println!("Source Settings:");
    println!("  Path: {:?}", config.source.path);
    println!("  Delimiter: {:?}", config.source.delimiter);
    println!();
    println!("Watcher Settings:");
    println!("  Enabled: {}", config.watcher.enabled);
    println!("  Poll interval: {}s", config.watcher.poll_interval_secs);
    println!();
    println!("Monitoring:");
    println!("  Log level: {}", config.monitoring.log_level);

    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::CheckConfig) => return cmd_check_config(&cli),
        Some(Commands::Start) | None => {},
    }

    if let Some(config_path) = &cli.config {
        std::env::set_var("CITYTEMP_CONFIG", config_path);
    }

    let mut config = load_config();
    apply_cli_overrides(&mut config, &cli);
    config.validate()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.monitoring.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!("Starting Citytemp Server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        source = %config.source.path.display(),
        poll_interval_secs = config.watcher.poll_interval_secs,
        "Configuration loaded"
    );

    // Core pipeline: store, loader, lookup service.
    let store = Arc::new(TemperatureStore::new());
    let loader = Arc::new(CsvLoader::with_parser(
        store.clone(),
        config.source.path.clone(),
        RecordParser::with_delimiter(config.source.delimiter),
    ));
    let service = TemperatureService::new(store.clone());

    // Initial load before serving requests.
    loader.reload();
    info!(cities = store.len(), "Initial load complete");

    // Background watcher keeps the cache in sync with the source file.
    let manager = Arc::new(ServiceManager::with_defaults());
    if config.watcher.enabled {
        let watcher = FileWatcherService::new(
            FileWatcherConfig {
                poll_interval: config.watcher.poll_interval(),
                enabled: true,
            },
            loader.clone(),
        );
        manager.register(Arc::new(watcher))?;
        manager.start_all()?;
    } else {
        warn!("File watcher disabled; cache will not track source file changes");
    }

    let state = Arc::new(AppState {
        service,
        manager: manager.clone(),
    });
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    manager.shutdown().await;
    store.clear();
    info!("Server stopped");

    Ok(())
}
