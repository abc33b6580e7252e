//! Fallback transport: documents read from a local directory.
//!
//! Mirrors how a browser treats `file://` responses: there is no real
//! status line, so a readable, non-empty body counts as success and an
//! empty one is reported as status 0.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::{FetchError, FetchResult, Transport, relative};

/// Reads documents relative to a serving root on disk.
#[derive(Debug, Clone)]
pub struct FileTransport {
    base: PathBuf,
}

impl FileTransport {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl Transport for FileTransport {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn fetch_once(&self, path: &str, timeout: Duration) -> FetchResult {
        let full = self.base.join(relative(path));
        debug!(path = %full.display(), timeout_ms = timeout.as_millis() as u64, "file fetch");

        let body = match tokio::time::timeout(timeout, tokio::fs::read(&full)).await {
            Err(_elapsed) => return Err(FetchError::Timeout(timeout)),
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(FetchError::HttpStatus(404));
            }
            Ok(Err(e)) => return Err(FetchError::Network(format!("{}: {e}", full.display()))),
            Ok(Ok(body)) => body,
        };

        if body.is_empty() {
            return Err(FetchError::HttpStatus(0));
        }

        serde_json::from_slice(&body)
            .map_err(|e| FetchError::Parse(format!("{}: {e}", full.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let tools = dir.path().join("tools");
        std::fs::create_dir_all(&tools).unwrap();
        std::fs::write(tools.join("config.json"), r#"{"categories": []}"#).unwrap();
        std::fs::write(tools.join("empty.json"), "").unwrap();
        std::fs::write(tools.join("broken.json"), "{not json").unwrap();
        dir
    }

    #[tokio::test]
    async fn reads_and_parses() {
        let dir = site();
        let t = FileTransport::new(dir.path());
        let doc = t
            .fetch_once("/tools/config.json", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(doc["categories"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let dir = site();
        let t = FileTransport::new(dir.path());
        let err = t
            .fetch_once("tools/nope.json", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(404));
    }

    #[tokio::test]
    async fn empty_body_is_status_zero() {
        let dir = site();
        let t = FileTransport::new(dir.path());
        let err = t
            .fetch_once("tools/empty.json", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(0));
    }

    #[tokio::test]
    async fn garbage_is_parse_error() {
        let dir = site();
        let t = FileTransport::new(dir.path());
        let err = t
            .fetch_once("tools/broken.json", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(msg) if msg.contains("broken.json")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stalled_read_times_out() {
        let dir = site();
        let fifo = dir.path().join("tools/stalled.json");
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .expect("mkfifo");
        assert!(status.success());

        // Opening a FIFO for reading blocks until a writer shows up.
        let t = FileTransport::new(dir.path());
        let err = t
            .fetch_once("tools/stalled.json", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Timeout(Duration::from_millis(100)));

        // Release the abandoned blocking read so the runtime can shut down.
        tokio::task::spawn_blocking(move || {
            std::fs::OpenOptions::new().write(true).open(&fifo).map(drop)
        })
        .await
        .unwrap()
        .unwrap();
    }
}
