//! Error types for the toolbox loader.
//!
//! Library crates use [`ToolboxError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Transport failures have their own taxonomy (`FetchError` in
//! `toolbox-transport`) because they are converted into values at the
//! loader boundary and never travel as `ToolboxError`.

use std::path::PathBuf;

/// Top-level error type for configuration and document-shape failures.
#[derive(Debug, thiserror::Error)]
pub enum ToolboxError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Failure to construct a network client.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad base URL, invalid option, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The root manifest parsed but does not expose a `categories` sequence
    /// of well-formed unit descriptors.
    #[error("malformed root manifest: {message}")]
    MalformedRoot { message: String },

    /// A unit sub-document exposes a `tools` field that is not a sequence.
    #[error("malformed unit document: {message}")]
    MalformedUnit { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ToolboxError>;

impl ToolboxError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a malformed-root error.
    pub fn malformed_root(msg: impl Into<String>) -> Self {
        Self::MalformedRoot {
            message: msg.into(),
        }
    }

    /// Create a malformed-unit error.
    pub fn malformed_unit(msg: impl Into<String>) -> Self {
        Self::MalformedUnit {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
