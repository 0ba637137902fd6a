//! Configuration management for the Medi-Link API.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables (the names deployment platforms already set)
//! - A `.env` file in the working directory, loaded before parsing
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use medilink_api::config::{load_env_file, Config};
//!
//! load_env_file()?;
//! let config = Config::parse();
//! println!("Listening on {}", config.bind_address());
//! println!("Runtime mode: {}", config.runtime_mode());
//! ```
//!
//! # Environment Variables
//!
//! - `HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 9500)
//! - `APP_ENV` - Deployment environment; `production` selects single-invocation mode
//! - `NODE_ENV` - Read when `APP_ENV` is unset, for existing deployment settings
//! - `CORS_ORIGIN` - The one origin allowed to make credentialed cross-origin calls
//! - `DATABASE_URL` - Persistence endpoint contacted once at startup

use std::fmt;
use std::path::{Path, PathBuf};

use clap::Parser;
use http::HeaderValue;
use url::Url;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 9500;

/// Default deployment environment.
pub const DEFAULT_APP_ENV: &str = "development";

/// Environment name that selects single-invocation mode.
pub const PRODUCTION_ENV: &str = "production";

/// Default allowed CORS origin (the hosted web client).
pub const DEFAULT_CORS_ORIGIN: &str = "https://medilink-theta-two.vercel.app";

// =============================================================================
// Environment File
// =============================================================================

/// Load variables from a `.env` file in the working directory or a parent.
///
/// Variables already present in the process environment are not overridden.
/// Returns the loaded file, or `None` when there is no such file.
pub fn load_env_file() -> Result<Option<PathBuf>, String> {
    env_file_result(dotenvy::dotenv())
}

/// Load variables from a specific env file.
pub fn load_env_file_from(path: &Path) -> Result<Option<PathBuf>, String> {
    env_file_result(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn env_file_result(result: dotenvy::Result<PathBuf>) -> Result<Option<PathBuf>, String> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(format!("failed to load env file: {}", e)),
    }
}

// =============================================================================
// Runtime Mode
// =============================================================================

/// Transport the assembled pipeline is bound to.
///
/// Resolved once at startup and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    /// Open a listening socket and serve until shutdown.
    Listener,

    /// Hand the pipeline to an external per-request invoker; no socket is opened.
    SingleInvocation,
}

impl RuntimeMode {
    /// Resolve the mode from a deployment environment name.
    pub fn from_env_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case(PRODUCTION_ENV) {
            RuntimeMode::SingleInvocation
        } else {
            RuntimeMode::Listener
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeMode::Listener => write!(f, "listener"),
            RuntimeMode::SingleInvocation => write!(f, "single-invocation"),
        }
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Medi-Link API - HTTP entry point for the Medi-Link services.
///
/// Dispatches requests to the identity, album, image and dashboard routers.
/// Runs as a long-lived listener, or as a serverless handler when
/// `APP_ENV=production`.
#[derive(Parser, Debug, Clone)]
#[command(name = "medilink-api")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// Deployment environment name.
    ///
    /// `production` runs the single-invocation transport; anything else
    /// opens a listening socket.
    #[arg(long, env = "APP_ENV")]
    pub app_env: Option<String>,

    /// Deployment environment name used when `APP_ENV` is unset.
    #[arg(long, env = "NODE_ENV", hide = true)]
    pub node_env: Option<String>,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// The single origin allowed to make credentialed cross-origin requests.
    #[arg(long, default_value = DEFAULT_CORS_ORIGIN, env = "CORS_ORIGIN")]
    pub cors_origin: String,

    // =========================================================================
    // Persistence Configuration
    // =========================================================================
    /// Database URL contacted once at startup.
    ///
    /// The server starts even if the database is unreachable.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be greater than 0. Set --port or PORT".to_string());
        }

        if self.cors_origin.trim().is_empty() {
            return Err("CORS origin must not be empty. Set --cors-origin or CORS_ORIGIN".to_string());
        }
        if HeaderValue::from_str(&self.cors_origin).is_err() {
            return Err(format!(
                "CORS origin '{}' is not a valid header value",
                self.cors_origin
            ));
        }

        if let Some(ref url) = self.database_url {
            Url::parse(url).map_err(|e| format!("DATABASE_URL is not a valid URL: {}", e))?;
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The deployment environment name: `APP_ENV`, then `NODE_ENV`, then
    /// `development`.
    pub fn environment(&self) -> &str {
        self.app_env
            .as_deref()
            .or(self.node_env.as_deref())
            .unwrap_or(DEFAULT_APP_ENV)
    }

    /// Resolve the runtime mode from the deployment environment.
    pub fn runtime_mode(&self) -> RuntimeMode {
        RuntimeMode::from_env_name(self.environment())
    }
}

// =============================================================================
// Tests
// =============================================================================
