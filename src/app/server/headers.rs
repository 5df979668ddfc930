//! Response header helpers
//!
//! Security headers, content types, validators (`ETag`, `Last-Modified`) and
//! conditional-request evaluation for static responses.

use std::path::Path;
use std::time::UNIX_EPOCH;

use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};

use crate::app::cache::FileStats;
use crate::constants::security;

/// Attach the security headers to every response
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static(security::CONTENT_TYPE_OPTIONS),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static(security::FRAME_OPTIONS),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static(security::STRICT_TRANSPORT_SECURITY),
    );

    response
}

/// Content type for a file, derived from its extension
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("wasm") => "application/wasm",
        Some("glb") => "model/gltf-binary",
        Some("gltf") => "model/gltf+json",
        _ => "application/octet-stream",
    }
}

/// Format a timestamp as an HTTP date
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Weak entity tag built from size and modification time
///
/// Computed from metadata alone so a 304 never needs the file body.
pub fn etag(stats: &FileStats) -> String {
    let mtime_ms = stats
        .modified
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|since| since.as_millis())
        .unwrap_or(0);

    format!("W/\"{:x}-{:x}\"", stats.size, mtime_ms)
}

/// Whether a conditional request can be answered with 304
///
/// `If-None-Match` takes precedence; `If-Modified-Since` is only consulted
/// when it is absent.
pub fn is_not_modified(
    request_headers: &HeaderMap,
    etag: &str,
    modified: Option<DateTime<Utc>>,
) -> bool {
    if let Some(if_none_match) = request_headers.get(header::IF_NONE_MATCH) {
        return if_none_match
            .to_str()
            .map(|value| etag_matches(value, etag))
            .unwrap_or(false);
    }

    let since = request_headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| DateTime::parse_from_rfc2822(value).ok());

    match (since, modified) {
        (Some(since), Some(modified)) => modified.timestamp() <= since.timestamp(),
        _ => false,
    }
}

/// Weak comparison of an `If-None-Match` list against one tag
fn etag_matches(header_value: &str, etag: &str) -> bool {
    let ours = strip_weak(etag);
    header_value
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || strip_weak(candidate) == ours)
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}
