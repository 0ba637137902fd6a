//! Literal routes and terminal handlers.
//!
//! # Endpoints
//!
//! - `GET /` - Service identity
//! - `GET /api/health` - Liveness check
//! - anything unmatched - `404 {"message":"Route not found"}`
//!
//! Every failure that ends a request is rendered here as well, either from an
//! [`ApiError`] value or from a caught panic.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::ApiError;

/// Service name reported by the root endpoint.
pub const SERVICE_NAME: &str = "Medi-Link API Server";

/// Summary message for every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Summary message for every 404 response.
pub const NOT_FOUND_MESSAGE: &str = "Route not found";

// =============================================================================
// Response Types
// =============================================================================

/// JSON body returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable summary
    pub message: String,

    /// Description of the underlying failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    /// Create an error response with only a summary message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    /// Create an error response carrying the failure description.
    pub fn with_error(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: Some(error.into()),
        }
    }
}

/// Root endpoint response.
#[derive(Debug, Serialize)]
pub struct ServiceInfoResponse {
    /// Service name
    pub message: String,

    /// Service version
    pub version: String,

    /// Service status
    pub status: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Human-readable detail
    pub message: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ApiError to HTTP response.
///
/// 5xx errors are logged at ERROR level, client errors at WARN. This is the
/// only place an `ApiError` is logged.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::PayloadTooLarge { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                "Payload too large",
            ),
            ApiError::MalformedBody(_) => (
                StatusCode::BAD_REQUEST,
                "malformed_body",
                "Malformed request body",
            ),
            ApiError::UnsupportedBody(_) => (
                StatusCode::BAD_REQUEST,
                "unsupported_body",
                "Unreadable request body",
            ),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                INTERNAL_ERROR_MESSAGE,
            ),
        };

        let description = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                description
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                description
            );
        }

        (status, Json(ErrorResponse::with_error(message, description))).into_response()
    }
}

/// Render a panic caught anywhere in the pipeline as a 500 response.
///
/// Used as the `CatchPanicLayer` handler; the connection and process keep
/// serving afterwards.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let description = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown failure".to_string()
    };

    error!(
        error_type = "panic",
        status = StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        "Unhandled failure: {}",
        description
    );

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::with_error(INTERNAL_ERROR_MESSAGE, description)),
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle service identity requests.
///
/// # Endpoint
///
/// `GET /`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "message": "Medi-Link API Server",
///   "version": "1.0.0",
///   "status": "Running"
/// }
/// ```
pub async fn root_handler() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        message: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "Running".to_string(),
    })
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /api/health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "OK",
///   "message": "Server is running"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Terminal handler for every request no route matched.
pub async fn not_found_handler(uri: axum::http::Uri) -> (StatusCode, Json<ErrorResponse>) {
    debug!(path = %uri.path(), "Route not found");
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(NOT_FOUND_MESSAGE)),
    )
}

// =============================================================================
// Tests
// =============================================================================
