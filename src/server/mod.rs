//! HTTP server layer for the Medi-Link API.
//!
//! This module provides the request pipeline and its two transports.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          HTTP Layer                              │
//! │   trace → cors → panic boundary → credentials → payload → route  │
//! │                                                                  │
//! │  ┌────────────┐ ┌────────────┐ ┌─────────────┐ ┌──────────────┐  │
//! │  │  handlers  │ │  context   │ │   routes    │ │   runtime    │  │
//! │  │ (terminal) │ │(extractors)│ │(mount table)│ │ (transports) │  │
//! │  └────────────┘ └────────────┘ └─────────────┘ └──────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod context;
pub mod credentials;
pub mod handlers;
pub mod payload;
pub mod routes;
pub mod runtime;

pub use context::{Credentials, MatchedMount, Payload, RequestContext};
pub use credentials::{credentials_middleware, parse_credentials};
pub use handlers::{
    handle_panic, health_handler, not_found_handler, root_handler, ErrorResponse, HealthResponse,
    ServiceInfoResponse,
};
pub use payload::{decode_body, payload_middleware, BodyKind, PayloadLimit, MAX_BODY_BYTES};
pub use routes::{create_router, Mount, MountIndex, Mounts, RouteTable, RouterConfig};
pub use runtime::{invoke, run_single_invocation, serve_listener};
