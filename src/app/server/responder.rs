//! Static file responder with single-page fallback
//!
//! A request path is resolved under the static root, checked with the
//! access verifier, and served with caching validators when it passes.
//! Anything that does not resolve to an accessible regular file falls
//! through to the entry document.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use percent_encoding::percent_decode_str;
use tracing::{debug, error, warn};

use crate::app::access::AccessVerifier;
use crate::app::cache::FileStats;
use crate::errors::ServerError;

use super::config::ServerConfig;
use super::headers::{content_type_for, etag, http_date, is_not_modified};

/// Serves files from the static root, gated by access verification
#[derive(Debug)]
pub struct StaticResponder {
    /// Directory files are served from
    static_root: PathBuf,
    /// Entry document file name, also used as the directory index
    entry_name: String,
    /// `max-age` for static assets
    max_age: Duration,
    /// Shared access verifier
    verifier: Arc<AccessVerifier>,
}

impl StaticResponder {
    /// Create a responder for the configured static root
    pub fn new(config: &ServerConfig, verifier: Arc<AccessVerifier>) -> Self {
        Self {
            static_root: config.static_root.clone(),
            entry_name: config.entry_document.clone(),
            max_age: config.effective_max_age(),
            verifier,
        }
    }

    /// Full path of the entry document
    pub fn entry_document(&self) -> PathBuf {
        self.static_root.join(&self.entry_name)
    }

    /// Static root this responder serves from
    pub fn static_root(&self) -> &Path {
        &self.static_root
    }

    /// Map a request path to a filesystem path under the static root
    ///
    /// Returns `None` for paths that are not valid percent-encoded UTF-8 or
    /// that try to leave the root. A trailing slash resolves to the
    /// directory's entry document.
    pub fn resolve(&self, uri_path: &str) -> Option<PathBuf> {
        let decoded = percent_decode_str(uri_path).decode_utf8().ok()?;
        if decoded.contains('\0') {
            return None;
        }

        let mut resolved = self.static_root.clone();
        for component in Path::new(decoded.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return None;
                }
            }
        }

        if decoded.is_empty() || decoded.ends_with('/') {
            resolved.push(&self.entry_name);
        }

        Some(resolved)
    }

    /// Serve the file a request path names, if it is accessible
    ///
    /// `None` means the request falls through to the entry document.
    pub async fn try_serve(
        &self,
        uri_path: &str,
        request_headers: &HeaderMap,
        head: bool,
    ) -> Option<Response> {
        let path = self.resolve(uri_path)?;
        let retries = self.verifier.config().max_retries;

        let mut stats = self.verifier.verify_request(&path, retries).await?;
        let mut path = path;

        if stats.is_directory {
            let index = path.join(&self.entry_name);
            stats = self.verifier.verify_request(&index, retries).await?;
            path = index;
        }

        if !stats.is_file() || !self.is_within_root(&path).await {
            return None;
        }

        match self
            .file_response(&path, &stats, request_headers, head, &self.cache_control(&path))
            .await
        {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("Falling through after read failure on {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Serve the entry document, or fail the request if it is inaccessible
    pub async fn serve_entry_document(
        &self,
        request_headers: &HeaderMap,
        head: bool,
    ) -> Result<Response, ServerError> {
        let path = self.entry_document();
        let retries = self.verifier.config().max_retries;

        let Some(stats) = self.verifier.verify_stats(&path, retries).await else {
            error!("Entry document {} is not accessible", path.display());
            return Err(ServerError::EntryDocumentUnavailable { path });
        };

        if stats.is_directory {
            error!("Entry document {} is a directory", path.display());
            return Err(ServerError::EntryDocumentUnavailable { path });
        }

        self.file_response(&path, &stats, request_headers, head, "no-cache")
            .await
            .map_err(|e| {
                error!("Failed to read entry document {}: {}", path.display(), e);
                ServerError::EntryDocumentUnavailable { path: path.clone() }
            })
    }

    /// Entry documents and directory indexes are revalidated on every load
    fn cache_control(&self, path: &Path) -> String {
        if path.file_name() == Some(OsStr::new(&self.entry_name)) {
            "no-cache".to_string()
        } else {
            format!("public, max-age={}", self.max_age.as_secs())
        }
    }

    /// Whether a path still lies under the static root once links are resolved
    async fn is_within_root(&self, path: &Path) -> bool {
        let (root, target) = match tokio::try_join!(
            tokio::fs::canonicalize(&self.static_root),
            tokio::fs::canonicalize(path)
        ) {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!("Cannot resolve {}: {}", path.display(), e);
                return false;
            }
        };

        if target.starts_with(&root) {
            true
        } else {
            warn!(
                "Refusing {}: resolves to {} outside the static root",
                path.display(),
                target.display()
            );
            false
        }
    }

    /// Build a 200 or 304 response for a verified file
    async fn file_response(
        &self,
        path: &Path,
        stats: &FileStats,
        request_headers: &HeaderMap,
        head: bool,
        cache_control: &str,
    ) -> Result<Response, ResponseError> {
        let tag = etag(stats);
        let modified = stats.modified_utc();

        let mut builder = Response::builder()
            .header(header::ETAG, tag.as_str())
            .header(header::CACHE_CONTROL, cache_control);
        if let Some(modified) = modified {
            builder = builder.header(header::LAST_MODIFIED, http_date(modified));
        }

        if is_not_modified(request_headers, &tag, modified) {
            debug!("Not modified: {}", path.display());
            return Ok(builder.status(StatusCode::NOT_MODIFIED).body(Body::empty())?);
        }

        builder = builder
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type_for(path));

        if head {
            return Ok(builder
                .header(header::CONTENT_LENGTH, HeaderValue::from(stats.size))
                .body(Body::empty())?);
        }

        let contents = tokio::fs::read(path).await?;
        Ok(builder
            .header(header::CONTENT_LENGTH, HeaderValue::from(contents.len() as u64))
            .body(Body::from(contents))?)
    }
}

/// Failures while building a file response
#[derive(Debug, thiserror::Error)]
enum ResponseError {
    #[error("read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid response: {0}")]
    Http(#[from] axum::http::Error),
}
