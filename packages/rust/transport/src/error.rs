//! Failure taxonomy for a single fetch attempt.

use std::time::Duration;

/// Why one attempt to fetch and parse a document failed.
///
/// Every variant is retryable as far as the loader is concerned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The attempt exceeded its budget and was cancelled.
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The transport answered with a non-success status.
    #[error("HTTP {0}")]
    HttpStatus(u16),

    /// Connection, DNS, or I/O failure before a status was available.
    #[error("network error: {0}")]
    Network(String),

    /// The body was not valid structured data.
    #[error("parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// Short machine-friendly label, used as a tracing field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::HttpStatus(_) => "http_status",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formatting() {
        assert_eq!(
            FetchError::Timeout(Duration::from_millis(1500)).to_string(),
            "request timed out after 1500ms"
        );
        assert_eq!(FetchError::HttpStatus(404).to_string(), "HTTP 404");
        assert_eq!(FetchError::Parse("eof".into()).kind(), "parse");
    }
}
