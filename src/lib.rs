//! # Medi-Link API
//!
//! HTTP entry point for the Medi-Link services.
//!
//! Every request passes through one fixed pipeline: credential extraction,
//! payload decoding, origin policy, then dispatch by path prefix to one of
//! four feature routers. Every request ends in a JSON response, including
//! unmatched routes (404) and handler failures (500).
//!
//! ## Features
//!
//! - **Fixed pipeline**: stage order is decided once in [`server::create_router`]
//! - **Mount table**: identity, album, image and dashboard routers by prefix
//! - **Total dispatch**: not-found fallback and a panic boundary around everything
//! - **Two transports**: a long-lived listener, or a serverless single-invocation
//!   handler, both serving the same router
//!
//! ## Architecture
//!
//! - [`server`] - Axum pipeline, handlers, extractors and transports
//! - [`store`] - Persistence connection seam, contacted once at startup
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use medilink_api::{create_router, serve_listener, Mounts, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let router = create_router(Mounts::default(), RouterConfig::default());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:9500").await?;
//!     serve_listener(listener, router).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::{Config, RuntimeMode};
pub use error::{ApiError, StoreError};
pub use server::{
    create_router, invoke, run_single_invocation, serve_listener, Credentials, ErrorResponse,
    HealthResponse, MatchedMount, Mounts, Payload, RequestContext, RouteTable, RouterConfig,
    ServiceInfoResponse, MAX_BODY_BYTES,
};
pub use store::{spawn_connect, Store, TcpStore};
