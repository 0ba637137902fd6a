//! Router configuration for the Medi-Link API.
//!
//! This module builds the request pipeline: the ordered middleware stages,
//! the literal routes, the mount table and the terminal handlers.
//!
//! # Route Structure
//!
//! ```text
//! /                        - Service identity (public)
//! /api/health              - Health check (public)
//! /api/v1/google/...       - identity mount
//! /api/v1/album/...        - album mount
//! /api/v1/image/...        - image mount
//! /api/v1/dashboard/...    - dashboard mount
//! anything else            - 404 {"message":"Route not found"}
//! ```
//!
//! # Stage Order
//!
//! Outermost first: request tracing, origin policy (CORS), panic boundary,
//! credential extraction, payload decoding, then routing. The origin policy
//! sits outside the panic boundary so permission headers decorate error
//! responses too; pre-flight requests are answered there directly.
//!
//! # Example
//!
//! ```ignore
//! use medilink_api::server::routes::{create_router, Mounts, RouterConfig};
//!
//! let mounts = Mounts::default().with_album(album::router());
//! let router = create_router(mounts, RouterConfig::new("https://app.example.com"));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:9500").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Extension, Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method, Request};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::{info_span, warn, Level};

use super::context::MatchedMount;
use super::credentials::credentials_middleware;
use super::handlers::{handle_panic, health_handler, not_found_handler, root_handler};
use super::payload::{payload_middleware, PayloadLimit, MAX_BODY_BYTES};
use crate::config::DEFAULT_CORS_ORIGIN;

/// Literal path of the service identity route.
pub const ROOT_PATH: &str = "/";

/// Literal path of the health check route.
pub const HEALTH_PATH: &str = "/api/health";

/// Mount prefix for identity/account operations.
pub const IDENTITY_PREFIX: &str = "/api/v1/google";

/// Mount prefix for album operations.
pub const ALBUM_PREFIX: &str = "/api/v1/album";

/// Mount prefix for image operations.
pub const IMAGE_PREFIX: &str = "/api/v1/image";

/// Mount prefix for dashboard/reporting operations.
pub const DASHBOARD_PREFIX: &str = "/api/v1/dashboard";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// The single origin allowed to make credentialed cross-origin calls
    pub cors_origin: String,

    /// Maximum size of a decoded JSON or form body, in bytes
    pub body_limit: usize,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration allowing the given origin.
    ///
    /// By default:
    /// - Bodies are limited to 50 MiB
    /// - Tracing is enabled
    pub fn new(cors_origin: impl Into<String>) -> Self {
        Self {
            cors_origin: cors_origin.into(),
            body_limit: MAX_BODY_BYTES,
            enable_tracing: true,
        }
    }

    /// Set the allowed CORS origin.
    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origin = origin.into();
        self
    }

    /// Set the maximum decoded body size.
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CORS_ORIGIN)
    }
}

// =============================================================================
// Route Table
// =============================================================================

/// A feature router bound to a path prefix.
pub struct Mount {
    /// Short name used in logs and [`MatchedMount`]
    pub name: &'static str,

    /// Path prefix, e.g. `/api/v1/album`
    pub prefix: String,

    /// Router receiving everything under the prefix
    pub router: Router,
}

/// Whether `path` falls under `prefix` on a segment boundary.
pub fn prefix_matches(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn first_match<'a, I>(entries: I, path: &str) -> Option<&'static str>
where
    I: IntoIterator<Item = (&'static str, &'a str)>,
{
    entries
        .into_iter()
        .find(|(_, prefix)| prefix_matches(prefix, path))
        .map(|(name, _)| name)
}

/// Ordered prefix-to-router table.
///
/// Lookup is first-match in registration order. Prefixes must not overlap at
/// segment granularity, so in practice at most one mount can match.
///
/// Requests are dispatched by axum's own `nest`, which [`create_router`]
/// sets up from this table. [`RouteTable::lookup`] and [`MountIndex`] do not
/// route anything; they only name the mount for the request span's `mount`
/// field.
#[derive(Default)]
pub struct RouteTable {
    mounts: Vec<Mount>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self { mounts: Vec::new() }
    }

    /// Register a router under `prefix`. Returns `self` for chaining.
    ///
    /// # Panics
    ///
    /// Panics if the prefix is malformed or overlaps an existing mount.
    pub fn mount(mut self, name: &'static str, prefix: &str, router: Router) -> Self {
        if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
            panic!("invalid mount prefix `{prefix}`: must start with `/` and not end with `/`");
        }
        for existing in &self.mounts {
            if prefix_matches(&existing.prefix, prefix) || prefix_matches(prefix, &existing.prefix)
            {
                panic!(
                    "mount `{name}` at `{prefix}` overlaps mount `{}` at `{}`",
                    existing.name, existing.prefix
                );
            }
        }

        self.mounts.push(Mount {
            name,
            prefix: prefix.to_string(),
            router,
        });
        self
    }

    /// Find the mount a path is delegated to.
    pub fn lookup(&self, path: &str) -> Option<&'static str> {
        first_match(
            self.mounts.iter().map(|m| (m.name, m.prefix.as_str())),
            path,
        )
    }

    /// Number of registered mounts.
    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    /// Whether no mounts are registered.
    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Cheap, cloneable view of the table's names and prefixes.
    pub fn index(&self) -> MountIndex {
        MountIndex(
            self.mounts
                .iter()
                .map(|m| (m.name, m.prefix.clone()))
                .collect(),
        )
    }

    /// Nest every mount into `router`, tagging its requests with [`MatchedMount`].
    fn nest_into(self, router: Router) -> Router {
        self.mounts.into_iter().fold(router, |router, mount| {
            let tagged = mount.router.layer(Extension(MatchedMount(mount.name)));
            router.nest(&mount.prefix, tagged)
        })
    }
}

/// Names and prefixes of a [`RouteTable`], shareable across requests.
#[derive(Debug, Clone)]
pub struct MountIndex(Arc<[(&'static str, String)]>);

impl MountIndex {
    /// Find the mount a path is delegated to.
    pub fn lookup(&self, path: &str) -> Option<&'static str> {
        first_match(self.0.iter().map(|(n, p)| (*n, p.as_str())), path)
    }
}

// =============================================================================
// Mounts
// =============================================================================

/// The four feature routers, supplied by their owning crates.
///
/// `Mounts::default()` mounts empty routers; every path under an empty
/// mount ends at the not-found handler.
#[derive(Default)]
pub struct Mounts {
    /// Identity/account operations
    pub identity: Router,

    /// Album operations
    pub album: Router,

    /// Image operations
    pub image: Router,

    /// Dashboard/reporting operations
    pub dashboard: Router,
}

impl Mounts {
    /// Set the identity router.
    pub fn with_identity(mut self, router: Router) -> Self {
        self.identity = router;
        self
    }

    /// Set the album router.
    pub fn with_album(mut self, router: Router) -> Self {
        self.album = router;
        self
    }

    /// Set the image router.
    pub fn with_image(mut self, router: Router) -> Self {
        self.image = router;
        self
    }

    /// Set the dashboard router.
    pub fn with_dashboard(mut self, router: Router) -> Self {
        self.dashboard = router;
        self
    }

    /// Build the route table in its fixed registration order.
    pub fn into_route_table(self) -> RouteTable {
        RouteTable::new()
            .mount("identity", IDENTITY_PREFIX, self.identity)
            .mount("album", ALBUM_PREFIX, self.album)
            .mount("image", IMAGE_PREFIX, self.image)
            .mount("dashboard", DASHBOARD_PREFIX, self.dashboard)
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete pipeline with:
/// - Literal routes (`/`, `/api/health`)
/// - The four feature mounts
/// - The not-found fallback
/// - Payload decoding and credential extraction
/// - The panic boundary
/// - CORS configuration
/// - Request tracing (optional)
///
/// The returned router is immutable and cheap to clone; both transports
/// serve it unchanged.
pub fn create_router(mounts: Mounts, config: RouterConfig) -> Router {
    let table = mounts.into_route_table();
    let index = table.index();

    let literal = Router::new()
        .route(ROOT_PATH, get(root_handler))
        .route(HEALTH_PATH, get(health_handler));

    let limit = PayloadLimit {
        max_bytes: config.body_limit,
    };

    // A path that exists without the request's method is unmatched too,
    // including paths inside the mounted routers
    let router = table
        .nest_into(literal)
        .method_not_allowed_fallback(not_found_handler)
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(middleware::from_fn_with_state(limit, payload_middleware))
        .layer(middleware::from_fn(credentials_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(build_cors_layer(&config));

    if config.enable_tracing {
        // Server errors are already logged at ERROR where they are rendered
        router.layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let path = request.uri().path();
                    info_span!(
                        "request",
                        method = %request.method(),
                        path = %path,
                        mount = index.lookup(path).unwrap_or("-"),
                    )
                })
                .on_failure(DefaultOnFailure::new().level(Level::DEBUG)),
        )
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
///
/// The configured origin is always the one advertised; a browser on any
/// other origin sees a mismatch and blocks the response itself. The server
/// never rejects a request for its origin.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true);

    match HeaderValue::from_str(&config.cors_origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!(origin = %config.cors_origin, "Invalid CORS origin; no origin will be allowed");
            cors
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
