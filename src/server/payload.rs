//! Payload decoding stage.
//!
//! Buffers JSON and URL-encoded form bodies (up to the configured limit),
//! decodes them into a [`Payload`] map and attaches it to the request. The
//! buffered bytes are put back as the request body, so handlers can still use
//! their own body extractors.
//!
//! # Failure Modes
//!
//! - Declared or actual size over the limit: [`ApiError::PayloadTooLarge`] (413)
//! - Unparsable JSON, or JSON that is not an object: [`ApiError::MalformedBody`] (400)
//! - Form body that is not UTF-8: [`ApiError::UnsupportedBody`] (400)
//!
//! A failing request never reaches routing.

use std::error::Error as StdError;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::HeaderMap;
use serde_json::{Map, Value};
use tracing::debug;

use super::context::Payload;
use crate::error::ApiError;

/// Maximum decoded body size: 50 MiB.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Largest form key index that still builds an array; `ids[21]` and above
/// stay object keys.
const MAX_FORM_ARRAY_INDEX: usize = 20;

/// Body encodings this stage knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// `application/json` or any `+json` media type
    Json,

    /// `application/x-www-form-urlencoded`
    Form,
}

impl BodyKind {
    /// Classify a request by its `Content-Type` header.
    ///
    /// Parameters such as `charset` are ignored; matching is case-insensitive.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if media_type == "application/json"
            || (media_type.starts_with("application/") && media_type.ends_with("+json"))
        {
            Some(BodyKind::Json)
        } else if media_type == "application/x-www-form-urlencoded" {
            Some(BodyKind::Form)
        } else {
            None
        }
    }
}

/// Decoder configuration.
#[derive(Debug, Clone, Copy)]
pub struct PayloadLimit {
    /// Maximum body size in bytes
    pub max_bytes: usize,
}

impl Default for PayloadLimit {
    fn default() -> Self {
        Self {
            max_bytes: MAX_BODY_BYTES,
        }
    }
}

/// Decode a buffered body of the given kind.
///
/// An empty body decodes to `None`.
pub fn decode_body(kind: BodyKind, bytes: &[u8]) -> Result<Option<Payload>, ApiError> {
    if bytes.is_empty() {
        return Ok(None);
    }

    let values = match kind {
        BodyKind::Json => decode_json(bytes)?,
        BodyKind::Form => decode_form(bytes)?,
    };

    Ok(Some(Payload::new(values)))
}

fn decode_json(bytes: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ApiError::MalformedBody(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(ApiError::MalformedBody(e.to_string())),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode a URL-encoded form body.
///
/// Plain keys map to strings; a repeated key collects its values into an
/// array. Bracketed keys nest: `user[name]=a` yields `{"user":{"name":"a"}}`,
/// and both `tags[]=x&tags[]=y` and `tags[0]=x&tags[1]=y` yield
/// `{"tags":["x","y"]}`.
fn decode_form(bytes: &[u8]) -> Result<Map<String, Value>, ApiError> {
    std::str::from_utf8(bytes)
        .map_err(|e| ApiError::UnsupportedBody(format!("form body is not UTF-8: {}", e)))?;

    let mut root = Map::new();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        let path = split_form_key(&key);
        insert_form_value(&mut root, &path, Value::String(value.into_owned()));
    }
    root.values_mut().for_each(indexed_objects_to_arrays);
    Ok(root)
}

/// Split `a[b][]` into `["a", "b", ""]`.
///
/// A key with unbalanced brackets is treated as a plain name.
fn split_form_key(key: &str) -> Vec<String> {
    let Some(open) = key.find('[') else {
        return vec![key.to_string()];
    };
    if open == 0 || !key.ends_with(']') {
        return vec![key.to_string()];
    }

    let mut segments = vec![key[..open].to_string()];
    for part in key[open + 1..key.len() - 1].split("][") {
        if part.contains('[') || part.contains(']') {
            return vec![key.to_string()];
        }
        segments.push(part.to_string());
    }
    segments
}

fn insert_form_value(map: &mut Map<String, Value>, path: &[String], value: Value) {
    let (head, rest) = match path.split_first() {
        Some(split) => split,
        None => return,
    };

    if rest.is_empty() {
        match map.get_mut(head) {
            None => {
                map.insert(head.clone(), value);
            }
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let previous = existing.take();
                *existing = Value::Array(vec![previous, value]);
            }
        }
        return;
    }

    // `key[]` appends to an array
    if rest.len() == 1 && rest[0].is_empty() {
        match map.get_mut(head) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let previous = existing.take();
                *existing = Value::Array(vec![previous, value]);
            }
            None => {
                map.insert(head.clone(), Value::Array(vec![value]));
            }
        }
        return;
    }

    let slot = map
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        // A plain value already owns this key; the nested one loses
        debug!(key = %head, "Dropping nested form field that collides with a plain field");
        return;
    }
    if let Value::Object(child) = slot {
        insert_form_value(child, rest, value);
    }
}

/// Rewrite nested objects keyed only by array indices as arrays.
///
/// Elements are ordered by index and gaps are closed up, so `a[3]=x&a[1]=y`
/// yields `["y","x"]`. An object with any other key stays an object.
fn indexed_objects_to_arrays(value: &mut Value) {
    match value {
        Value::Object(map) => map.values_mut().for_each(indexed_objects_to_arrays),
        Value::Array(items) => items.iter_mut().for_each(indexed_objects_to_arrays),
        _ => return,
    }

    let items = match value {
        Value::Object(map) => take_indexed(map),
        _ => None,
    };
    if let Some(items) = items {
        *value = Value::Array(items);
    }
}

fn take_indexed(map: &mut Map<String, Value>) -> Option<Vec<Value>> {
    if map.is_empty() || !map.keys().all(|k| array_index(k).is_some()) {
        return None;
    }

    let mut entries: Vec<(usize, Value)> = std::mem::take(map)
        .into_iter()
        .filter_map(|(k, v)| array_index(&k).map(|i| (i, v)))
        .collect();
    entries.sort_by_key(|(i, _)| *i);
    Some(entries.into_iter().map(|(_, v)| v).collect())
}

/// `"3"` is an index; `"03"`, `"-1"` and `"21"` are plain keys.
fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse::<usize>()
        .ok()
        .filter(|&i| i <= MAX_FORM_ARRAY_INDEX)
}

/// Read the request body, refusing anything over `limit` bytes.
async fn buffer_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, ApiError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(len) = declared {
        if len > limit as u64 {
            return Err(ApiError::PayloadTooLarge { limit });
        }
    }

    axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| classify_read_error(e, limit))
}

fn classify_read_error(err: axum::Error, limit: usize) -> ApiError {
    // to_bytes reports overflow as a LengthLimitError somewhere in the chain
    let mut source: Option<&(dyn StdError + 'static)> = Some(&err);
    while let Some(e) = source {
        if e.is::<http_body_util::LengthLimitError>() {
            return ApiError::PayloadTooLarge { limit };
        }
        source = e.source();
    }
    ApiError::UnsupportedBody(format!("failed to read request body: {}", err))
}

/// Middleware that decodes JSON and form bodies into a [`Payload`].
pub async fn payload_middleware(
    State(limit): State<PayloadLimit>,
    request: Request,
    next: Next,
) -> Response {
    let Some(kind) = BodyKind::from_headers(request.headers()) else {
        return next.run(request).await;
    };

    let (mut parts, body) = request.into_parts();

    let bytes = match buffer_body(&parts.headers, body, limit.max_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => return e.into_response(),
    };

    match decode_body(kind, &bytes) {
        Ok(Some(payload)) => {
            debug!(kind = ?kind, fields = payload.len(), "Decoded request body");
            parts.extensions.insert(payload);
        }
        Ok(None) => {}
        Err(e) => return e.into_response(),
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

// =============================================================================
// Tests
// =============================================================================
