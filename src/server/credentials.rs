//! Credential extraction stage.
//!
//! Parses every `Cookie` header into a [`Credentials`] map and attaches it to
//! the request. A request without cookies gets an empty map, so later stages
//! and handlers never need a presence check.

use std::collections::HashMap;

use axum::{extract::Request, middleware::Next, response::Response};
use cookie::Cookie;
use http::header::COOKIE;
use http::HeaderMap;
use tracing::debug;

use super::context::Credentials;

/// Parse cookie headers into a name/value map.
///
/// Values are percent-decoded. Pairs that fail to parse are skipped, and the
/// first occurrence of a name wins.
pub fn parse_credentials(headers: &HeaderMap) -> Credentials {
    let mut values = HashMap::new();

    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else {
            debug!("Skipping non-ASCII cookie header");
            continue;
        };

        for cookie in Cookie::split_parse_encoded(raw).flatten() {
            values
                .entry(cookie.name().to_string())
                .or_insert_with(|| cookie.value().to_string());
        }
    }

    Credentials::new(values)
}

/// Middleware that attaches parsed [`Credentials`] to every request.
pub async fn credentials_middleware(mut request: Request, next: Next) -> Response {
    let credentials = parse_credentials(request.headers());
    request.extensions_mut().insert(credentials);
    next.run(request).await
}

// =============================================================================
// Tests
// =============================================================================
