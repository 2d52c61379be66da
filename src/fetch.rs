//! Content transports.
//!
//! A [`ContentFetcher`] turns a content path (`public/output/x_en/index.md`)
//! into a status code and body. It makes exactly one attempt per call.
//! Interpreting the body is the caller's job (see [`crate::loader`]).
//!
//! | Fetcher | Source |
//! |---------|--------|
//! | [`HttpFetcher`] | `GET {base_url}/{path}` via reqwest |
//! | [`FsFetcher`] | `{root}/{path}` on the local filesystem |
//! | [`MemoryFetcher`] | an in-memory map, for tests and embedding |

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{Config, ContentSourceKind};
use crate::error::LoadError;

/// Raw result of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            reason: "OK".to_string(),
            body: body.into(),
        }
    }

    pub fn status(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single-attempt content transport.
///
/// Implementations return `Err` only for transport failures (no response at
/// all). Any response, including 4xx/5xx, is returned as `Ok`.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<FetchResponse, LoadError>;

    /// Where content comes from, for log lines and `docnav repos` output.
    fn describe(&self) -> String;
}

/// Builds the fetcher selected by `[content].source`.
pub fn create_fetcher(config: &Config) -> anyhow::Result<Arc<dyn ContentFetcher>> {
    match config.content.source {
        ContentSourceKind::Http => {
            let base = config
                .content
                .base_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("content.base_url required for http source"))?;
            Ok(Arc::new(HttpFetcher::new(
                base,
                Duration::from_secs(config.content.timeout_secs),
            )?))
        }
        ContentSourceKind::Filesystem => {
            let root = config
                .content
                .root
                .clone()
                .ok_or_else(|| anyhow::anyhow!("content.root required for filesystem source"))?;
            Ok(Arc::new(FsFetcher::new(root)))
        }
    }
}

// ============ HTTP ============

/// Fetches content over HTTP relative to a base URL.
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<FetchResponse, LoadError> {
        let url = self.url_for(path);
        let transport_error = |e: reqwest::Error| {
            let reason = if e.is_timeout() {
                format!("timed out after {}s", self.timeout.as_secs())
            } else {
                e.to_string()
            };
            LoadError::Fetch {
                path: path.to_string(),
                status: None,
                reason,
            }
        };

        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        Ok(FetchResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

// ============ Filesystem ============

/// Reads content from a directory on disk. Missing files answer 404 and
/// paths escaping the root answer 403, mirroring a static file server.
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Joins `path` under the root, refusing `..` and absolute components.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl ContentFetcher for FsFetcher {
    async fn fetch(&self, path: &str) -> Result<FetchResponse, LoadError> {
        let Some(full) = self.resolve(path) else {
            return Ok(FetchResponse::status(403, "Forbidden"));
        };

        match tokio::fs::read_to_string(&full).await {
            Ok(body) => Ok(FetchResponse::ok(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(FetchResponse::status(404, "Not Found"))
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Err(LoadError::Encoding {
                path: path.to_string(),
            }),
            Err(e) => Err(LoadError::Fetch {
                path: path.to_string(),
                status: None,
                reason: e.to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }
}

// ============ In-memory ============

/// In-memory fetcher keyed by exact path. Unknown paths answer 404.
///
/// Counts every call, so callers can assert that no request was issued.
#[derive(Default)]
pub struct MemoryFetcher {
    responses: Mutex<HashMap<String, FetchResponse>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` with status 200 at `path`.
    pub fn with_file(self, path: &str, body: &str) -> Self {
        self.insert(path, FetchResponse::ok(body));
        self
    }

    pub fn with_response(self, path: &str, response: FetchResponse) -> Self {
        self.insert(path, response);
        self
    }

    pub fn insert(&self, path: &str, response: FetchResponse) {
        if let Ok(mut map) = self.responses.lock() {
            map.insert(path.to_string(), response);
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Paths requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContentFetcher for MemoryFetcher {
    async fn fetch(&self, path: &str) -> Result<FetchResponse, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(path.to_string());
        }
        let response = self
            .responses
            .lock()
            .ok()
            .and_then(|map| map.get(path).cloned());
        Ok(response.unwrap_or_else(|| FetchResponse::status(404, "Not Found")))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
