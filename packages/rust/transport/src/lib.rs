//! Single-attempt document retrieval over interchangeable transports.
//!
//! A [`Transport`] fetches one document from a path relative to a serving
//! root, within a timeout budget, and parses it as JSON. There is no retry
//! here; that belongs to the loader in `toolbox-core`.
//!
//! Two transports exist:
//! - [`HttpTransport`] — the primary, backed by `reqwest`
//! - [`FileTransport`] — the fallback, reading from a local directory
//!
//! [`AnyTransport::connect`] picks one exactly once, at startup, by probing
//! the configured base (or honouring an explicit choice).

mod error;
mod file;
mod http;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use toolbox_shared::{Document, Result, ToolboxError, TransportChoice};
use tracing::debug;
use url::Url;

pub use error::FetchError;
pub use file::FileTransport;
pub use http::HttpTransport;

/// Outcome of a single fetch attempt.
pub type FetchResult = std::result::Result<Document, FetchError>;

/// One attempt to retrieve and parse a document.
pub trait Transport: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Fetch `path` (relative to the transport's base) and parse it.
    ///
    /// Must resolve within `timeout` plus scheduling slack; an expired
    /// budget yields [`FetchError::Timeout`].
    fn fetch_once(&self, path: &str, timeout: Duration)
    -> impl Future<Output = FetchResult> + Send;
}

// ---------------------------------------------------------------------------
// Capability probe
// ---------------------------------------------------------------------------

/// Where a configured base points, as decided by the probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    /// An `http://` or `https://` serving root.
    Http(Url),
    /// A local directory.
    File(PathBuf),
}

impl TransportKind {
    /// Classify a base string.
    ///
    /// HTTP(S) URLs get the primary transport. `file://` URLs and anything
    /// that is not a URL (relative or absolute paths, drive-letter paths)
    /// fall back to the filesystem.
    pub fn probe(base: &str) -> Result<Self> {
        match Url::parse(base) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Self::Http(url)),
                "file" => url.to_file_path().map(Self::File).map_err(|()| {
                    ToolboxError::validation(format!("not a local file URL: {base}"))
                }),
                // `C:\toolbox` parses as a URL with scheme `c`.
                scheme if scheme.len() == 1 => Ok(Self::File(PathBuf::from(base))),
                scheme => Err(ToolboxError::validation(format!(
                    "unsupported scheme `{scheme}` in base {base}"
                ))),
            },
            Err(_) => Ok(Self::File(PathBuf::from(base))),
        }
    }

    /// Apply an explicit choice on top of the probe.
    pub fn select(base: &str, choice: TransportChoice) -> Result<Self> {
        let probed = Self::probe(base)?;
        match (choice, probed) {
            (TransportChoice::Auto, kind) => Ok(kind),
            (TransportChoice::Http, kind @ Self::Http(_)) => Ok(kind),
            (TransportChoice::File, kind @ Self::File(_)) => Ok(kind),
            (TransportChoice::Http, Self::File(_)) => Err(ToolboxError::validation(format!(
                "http transport requested but base is not an http(s) URL: {base}"
            ))),
            (TransportChoice::File, Self::Http(_)) => Err(ToolboxError::validation(format!(
                "file transport requested but base is an http(s) URL: {base}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// AnyTransport
// ---------------------------------------------------------------------------

/// The transport chosen at startup.
#[derive(Debug, Clone)]
pub enum AnyTransport {
    Http(HttpTransport),
    File(FileTransport),
}

impl AnyTransport {
    /// Probe `base` once and build the matching transport.
    pub fn connect(base: &str, choice: TransportChoice) -> Result<Self> {
        let transport = match TransportKind::select(base, choice)? {
            TransportKind::Http(url) => Self::Http(HttpTransport::new(url)?),
            TransportKind::File(dir) => Self::File(FileTransport::new(dir)),
        };
        debug!(base, transport = transport.name(), "transport selected");
        Ok(transport)
    }
}

impl Transport for AnyTransport {
    fn name(&self) -> &'static str {
        match self {
            Self::Http(t) => t.name(),
            Self::File(t) => t.name(),
        }
    }

    async fn fetch_once(&self, path: &str, timeout: Duration) -> FetchResult {
        match self {
            Self::Http(t) => t.fetch_once(path, timeout).await,
            Self::File(t) => t.fetch_once(path, timeout).await,
        }
    }
}

/// Strip leading slashes so `path` always resolves under the base.
pub(crate) fn relative(path: &str) -> &str {
    path.trim_start_matches('/')
}
