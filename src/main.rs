//! Medi-Link API - HTTP entry point.
//!
//! This binary resolves the runtime mode, starts the database connection
//! attempt and serves the request pipeline.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medilink_api::{
    config::{load_env_file, Config, RuntimeMode},
    create_router, run_single_invocation, serve_listener, spawn_connect, Mounts, RouterConfig,
    TcpStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing, so the file can supply PORT, APP_ENV and RUST_LOG
    let env_file = load_env_file();
    let config = Config::parse();

    init_logging(config.verbose);

    match env_file {
        Ok(Some(path)) => info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("{}", e),
    }

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let mode = config.runtime_mode();

    info!("Medi-Link API v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Environment: {}", config.environment());
    info!("  Runtime mode: {}", mode);
    info!("  CORS origin: {}", config.cors_origin);
    if config.database_url.is_none() {
        warn!("  Database: not configured (set DATABASE_URL)");
    }

    // Not awaited: the API comes up whether or not storage is reachable
    spawn_connect(Arc::new(TcpStore::new(config.database_url.clone())));

    let router = create_router(Mounts::default(), build_router_config(&config));

    match mode {
        RuntimeMode::Listener => {
            let addr = config.bind_address();
            let listener = match tokio::net::TcpListener::bind(&addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    error!("Failed to bind to {}: {}", addr, e);
                    return ExitCode::FAILURE;
                }
            };

            info!("Server started on http://{}", addr);

            if let Err(e) = serve_listener(listener, router).await {
                error!("Server error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        RuntimeMode::SingleInvocation => {
            if let Err(e) = run_single_invocation(router).await {
                error!("Serverless runtime error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "medilink_api=debug,tower_http=debug"
    } else {
        "medilink_api=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    RouterConfig::new(config.cors_origin.clone()).with_tracing(!config.no_tracing)
}
