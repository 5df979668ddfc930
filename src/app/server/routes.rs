//! Request handlers and request logging

use std::collections::BTreeMap;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::constants::{env, static_files};

use super::listing::{list_directory, FileListing};
use super::state::AppState;

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `error`
    pub status: &'static str,
    /// When the response was generated
    pub timestamp: DateTime<Utc>,
    /// Seconds since the server started
    pub uptime: u64,
    /// Process environment snapshot
    pub environment: EnvironmentInfo,
    /// Resolved paths
    pub paths: PathsInfo,
    /// Listings keyed by directory (`public` for the static root)
    pub files: BTreeMap<String, Vec<FileListing>>,
    /// Stats cache summary
    pub cache: CacheInfo,
    /// Most recent probe summary
    pub probe: ProbeInfo,
    /// Problems found while building this response
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Environment part of the health response
#[derive(Debug, Serialize)]
pub struct EnvironmentInfo {
    pub mode: String,
    pub port: u16,
    pub workspace_root: Option<String>,
    pub cwd: Option<String>,
    pub container: bool,
}

/// Path part of the health response
#[derive(Debug, Serialize)]
pub struct PathsInfo {
    pub static_root: String,
    pub entry_document: String,
}

/// Cache part of the health response
#[derive(Debug, Serialize)]
pub struct CacheInfo {
    pub size: usize,
    pub ttl_ms: u64,
}

/// Probe part of the health response
#[derive(Debug, Serialize)]
pub struct ProbeInfo {
    pub healthy: bool,
    pub interval_ms: u64,
    pub consecutive_failures: u32,
    pub last_run: Option<DateTime<Utc>>,
    pub errors: Vec<String>,
}

/// `GET /health`
///
/// Reports `ok` with 200 when every listing succeeds and the last probe
/// passed (or none has run yet); otherwise `error` with 503.
pub async fn health(State(state): State<AppState>) -> Response {
    let config = &state.config;
    let mut errors = Vec::new();
    let mut files = BTreeMap::new();

    let mut listed = vec![(
        static_files::ROOT_LISTING_KEY.to_string(),
        config.static_root.clone(),
    )];
    listed.extend(
        config
            .listed_subdirs
            .iter()
            .map(|name| (name.clone(), config.static_root.join(name))),
    );

    for (key, dir) in listed {
        match list_directory(&state.verifier, &dir).await {
            Ok(listing) => {
                files.insert(key, listing);
            }
            Err(e) => {
                errors.push(e.to_string());
                files.insert(key, Vec::new());
            }
        }
    }

    let last_report = state.prober.last_report().await;
    let probe_healthy = last_report.as_ref().map_or(true, |report| report.healthy);
    let healthy = errors.is_empty() && probe_healthy;

    let body = HealthResponse {
        status: if healthy { "ok" } else { "error" },
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs(),
        environment: EnvironmentInfo {
            mode: config.environment.to_string(),
            port: config.port,
            workspace_root: config
                .workspace_root
                .clone()
                .or_else(|| std::env::var(env::WORKSPACE_ROOT).ok()),
            cwd: std::env::current_dir()
                .ok()
                .map(|dir| dir.display().to_string()),
            container: last_report
                .as_ref()
                .and_then(|report| report.container.as_ref())
                .map_or(false, |signals| signals.in_container()),
        },
        paths: PathsInfo {
            static_root: config.static_root.display().to_string(),
            entry_document: config.entry_document_path().display().to_string(),
        },
        files,
        cache: CacheInfo {
            size: state.cache.len().await,
            ttl_ms: state.cache.ttl().as_millis() as u64,
        },
        probe: ProbeInfo {
            healthy: probe_healthy,
            interval_ms: state.prober.current_interval().await.as_millis() as u64,
            consecutive_failures: state.prober.consecutive_failures(),
            last_run: last_report.as_ref().map(|report| report.timestamp),
            errors: last_report.map(|report| report.errors).unwrap_or_default(),
        },
        errors,
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

/// `GET /favicon.ico`
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Catch-all: static file when accessible, entry document otherwise
pub async fn static_fallback(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let head = method == Method::HEAD;
    if method != Method::GET && !head {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
        )
            .into_response();
    }

    if let Some(response) = state.responder.try_serve(uri.path(), &headers, head).await {
        return response;
    }

    match state.responder.serve_entry_document(&headers, head).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// Log method, path, status and latency of every request
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    if status.is_server_error() {
        warn!("{} {} {} {:.1}ms", method, path, status.as_u16(), elapsed_ms);
    } else {
        info!("{} {} {} {:.1}ms", method, path, status.as_u16(), elapsed_ms);
    }

    response
}
