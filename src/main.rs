//! Task Tracker API
//!
//! Serves the owner-scoped task endpoints and, optionally, the web front end.
//!
//! # Environment Variables
//!
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `8000`)
//! - `WORKER_THREADS`: Number of tokio worker threads (default: logical CPU count)
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required for any `postgres` mode)
//! - `STORAGE_TIMEOUT_MS`: Upper bound for a single storage call (default: `5000`)
//! - `SESSION_MODE`: `static` (default) | `postgres`
//! - `SESSION_TOKENS`: Static token table, `token=user_id[:name[:email]],...`
//! - `STATIC_DIR`: Directory served for paths not matched by the API
//! - `RUST_LOG`: Logging filter (e.g., `task_tracker_api=debug`)
//! - `LOG_FORMAT`: `json` for JSON log lines, anything else for plain text

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use task_tracker_api::api::{AppState, build_router};
use task_tracker_api::infrastructure::{InfrastructureConfig, InfrastructureFactory};

/// Default port, matching the front end's default API base URL.
const DEFAULT_PORT: u16 = 8000;

/// Reads `WORKER_THREADS`. Unset, empty, zero or malformed values fall back
/// to the runtime default.
fn worker_threads() -> Option<usize> {
    let value = env::var("WORKER_THREADS").ok()?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let threads = value.parse::<usize>().ok().filter(|threads| *threads > 0);
    if threads.is_none() {
        eprintln!("Warning: WORKER_THREADS='{value}' is not a positive number, using default");
    }
    threads
}

fn main() {
    dotenvy::dotenv().ok();

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = worker_threads() {
        builder.worker_threads(threads);
    }

    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Failed to create tokio runtime: {error}");
            std::process::exit(1);
        }
    };
    runtime.block_on(async_main());
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "task_tracker_api=debug,tower_http=debug".into());

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn async_main() {
    init_tracing();

    tracing::info!("Starting Task Tracker API");

    let config = match InfrastructureConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            std::process::exit(1);
        }
    };

    tracing::info!(
        storage_mode = ?config.storage_mode,
        session_mode = ?config.session_mode,
        storage_timeout_ms = config.storage_timeout.as_millis(),
        "Infrastructure configuration loaded"
    );

    let factory = InfrastructureFactory::new(config);
    let infrastructure = match factory.create().await {
        Ok(infrastructure) => {
            tracing::info!("Infrastructure initialized successfully");
            infrastructure
        }
        Err(error) => {
            tracing::error!("Failed to initialize infrastructure: {}", error);
            std::process::exit(1);
        }
    };

    let static_dir = env::var("STATIC_DIR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from);

    if let Some(directory) = &static_dir {
        tracing::info!(directory = %directory.display(), "Serving static front end");
    }

    let application = build_router(
        AppState::from_infrastructure(infrastructure),
        static_dir.as_deref(),
    );

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let address: SocketAddr = match format!("{host}:{port}").parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::error!(%error, "Invalid server address: {}:{}", host, port);
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "Failed to bind to address {}", address);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    if let Err(error) = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Completes on Ctrl+C, or on SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
