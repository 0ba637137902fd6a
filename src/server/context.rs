//! Per-request context shared between pipeline stages and mounted handlers.
//!
//! Pipeline stages store their results as request extensions; the types here
//! are also axum extractors so mounted handlers can read them directly:
//!
//! ```ignore
//! async fn create_album(creds: Credentials, payload: Option<Payload>) -> Json<Value> {
//!     let session = creds.get("session");
//!     ...
//! }
//! ```

use std::collections::HashMap;
use std::convert::Infallible;
use std::ops::Deref;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use http::request::Parts;
use http::{Extensions, HeaderMap, Method};
use serde_json::{Map, Value};

// =============================================================================
// Credentials
// =============================================================================

/// Cookie-style credentials parsed from the request.
///
/// Always present once the credential stage has run; empty when the request
/// carried no cookies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials(HashMap<String, String>);

impl Credentials {
    /// Create credentials from a name/value map.
    pub fn new(values: HashMap<String, String>) -> Self {
        Self(values)
    }

    /// Look up a credential by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Consume the credentials, returning the underlying map.
    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

impl Deref for Credentials {
    type Target = HashMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Credentials
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Credentials>()
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// Payload
// =============================================================================

/// Request body decoded from JSON or URL-encoded form data.
///
/// Only present when the request declared a decodable content type and
/// carried a non-empty body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Create a payload from a JSON object.
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    /// Look up a field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Consume the payload, returning the underlying map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl Deref for Payload {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> OptionalFromRequestParts<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Payload>().cloned())
    }
}

// =============================================================================
// Matched Mount
// =============================================================================

/// Name of the mount the request was dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedMount(pub &'static str);

// =============================================================================
// Request Context
// =============================================================================

/// Everything the pipeline knows about a request, in one record.
///
/// `attachments` is the open-ended slot: the request's extensions as they
/// stood when the handler was called, including anything a feature router's
/// own layers inserted.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// HTTP method
    pub method: Method,

    /// Request path (as seen by the outer router, prefix included)
    pub path: String,

    /// Request headers
    pub headers: HeaderMap,

    /// Decoded body, if any
    pub body: Option<Payload>,

    /// Parsed credentials (empty if none)
    pub credentials: Credentials,

    /// Mount the request was dispatched to, if any
    pub mount: Option<&'static str>,

    /// Extensions attached by upstream layers
    pub attachments: Extensions,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped URI; the original keeps the prefix
        let path = parts
            .extensions
            .get::<axum::extract::OriginalUri>()
            .map(|uri| uri.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        Ok(Self {
            method: parts.method.clone(),
            path,
            headers: parts.headers.clone(),
            body: parts.extensions.get::<Payload>().cloned(),
            credentials: parts
                .extensions
                .get::<Credentials>()
                .cloned()
                .unwrap_or_default(),
            mount: parts.extensions.get::<MatchedMount>().map(|m| m.0),
            attachments: parts.extensions.clone(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
